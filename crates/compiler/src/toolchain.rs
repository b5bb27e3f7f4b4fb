//! External tool invocation (§5, §6.4): the only non-pure-Rust step in the
//! whole pipeline is handing the x86 generator's NASM text to an external
//! `nasm` binary and producing a standalone flat binary. Grounded on the
//! teacher's `check_clang_version` `OnceLock`-cached availability check in
//! `lib.rs`, adapted to `nasm` and to the original `GPT.cpp`'s
//! `findNasm()` order (PATH first, then beside the current executable).

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

static NASM_PATH: OnceLock<Result<PathBuf, String>> = OnceLock::new();

/// Locates `nasm`, caching the result for the lifetime of the process (a
/// failed lookup is cached too, so a missing-tool error is only ever
/// formatted once's worth of `Command` spawns).
fn find_nasm() -> Result<PathBuf, String> {
    NASM_PATH
        .get_or_init(|| {
            if Command::new("nasm").arg("-v").output().is_ok() {
                return Ok(PathBuf::from("nasm"));
            }
            if let Ok(exe) = std::env::current_exe() {
                if let Some(dir) = exe.parent() {
                    let candidate = dir.join("nasm");
                    if candidate.is_file() {
                        return Ok(candidate);
                    }
                }
            }
            Err("nasm não encontrado no PATH nem ao lado do executável gptc".to_string())
        })
        .clone()
}

/// Assembles `asm_source` (the runtime text followed by the generated
/// program, per [`gpt_runtime::RUNTIME_ASM`]) into a standalone flat binary
/// at `output_path`. `nasm -f bin` is the whole toolchain here — the
/// runtime is prepended as text, not linked, so there is no separate
/// linker invocation (§6.4, and the header comment of `runtime.asm`).
///
/// Uses a uniquely-named temporary `.asm` intermediate, unlinked on
/// success; on failure the intermediate is kept and its path reported,
/// matching §5's "retained for debugging".
pub fn assemble_to_binary(asm_source: &str, output_path: &Path) -> Result<(), String> {
    use std::io::Write as _;

    let nasm = find_nasm()?;

    let mut tmp = tempfile::Builder::new()
        .prefix("gptc-")
        .suffix(".asm")
        .tempfile()
        .map_err(|e| format!("falha ao criar arquivo temporário: {e}"))?;
    tmp.write_all(asm_source.as_bytes())
        .map_err(|e| format!("falha ao escrever assembly temporário: {e}"))?;
    let tmp_path = tmp.path().to_path_buf();

    let status = Command::new(&nasm)
        .arg("-f")
        .arg("bin")
        .arg("-o")
        .arg(output_path)
        .arg(&tmp_path)
        .status();

    match status {
        Ok(status) if status.success() => {
            mark_executable(output_path);
            Ok(())
        }
        Ok(status) => {
            let kept = tmp.keep().map(|(_, p)| p).unwrap_or(tmp_path);
            Err(format!(
                "nasm terminou com código {:?}; intermediário preservado em {}",
                status.code(),
                kept.display()
            ))
        }
        Err(e) => {
            let kept = tmp.keep().map(|(_, p)| p).unwrap_or(tmp_path);
            Err(format!(
                "falha ao executar nasm: {e}; intermediário preservado em {}",
                kept.display()
            ))
        }
    }
}

#[cfg(unix)]
fn mark_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Ok(meta) = std::fs::metadata(path) {
        let mut perms = meta.permissions();
        perms.set_mode(perms.mode() | 0o111);
        let _ = std::fs::set_permissions(path, perms);
    }
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nasm_lookup_result_is_cached_across_calls() {
        let first = find_nasm();
        let second = find_nasm();
        assert_eq!(first, second);
    }
}
