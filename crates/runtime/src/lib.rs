//! The small NASM runtime every x86 back-end binary links against.
//!
//! The toolchain assembles a single flat binary with `nasm -f bin`, so
//! there is no linker step to pull in a separate object file — the
//! runtime text is prepended directly before the generated program text,
//! so `_start` lands at the first byte. This crate's only job is to own
//! that text and hand it to the x86 back-end, embedding it via
//! `include_str!` rather than shipping a prebuilt archive.

/// NASM source for `_start`, `imprima`, `leia` and `clone_literal`, plus the
/// `addarg`/`clargs`/`return` argument-marshalling macros the x86 generator
/// emits calls against. Prepended verbatim before the generated program text.
pub const RUNTIME_ASM: &str = include_str!("runtime.asm");

/// The label the generated program must define as its entry point; the
/// runtime's `_start` calls it and exits with its return value.
pub const PROGRAM_ENTRY_LABEL: &str = "main";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_defines_the_expected_globals() {
        assert!(RUNTIME_ASM.contains("global _start"));
        assert!(RUNTIME_ASM.contains("global imprima"));
        assert!(RUNTIME_ASM.contains("global leia"));
        assert!(RUNTIME_ASM.contains("global clone_literal"));
    }

    #[test]
    fn runtime_calls_the_program_entry_label() {
        assert!(RUNTIME_ASM.contains(&format!("call {PROGRAM_ENTRY_LABEL}")));
    }
}
