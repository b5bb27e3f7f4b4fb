//! `gptc`: lexer, parser, semantic analyzer and three back-ends (tree-walking
//! interpreter, C translator, x86 assembly generator) for G-Portugol, plus
//! the glue that ties them into a single compilation pipeline for the CLI
//! in `main.rs`. One file per pipeline stage; this `lib.rs` re-exports the
//! pieces external callers need and owns the top-level `compile_file`/
//! `compile_source` entry points.

pub mod analyzer;
pub mod builtins;
pub mod codegen_c;
pub mod codegen_x86;
pub mod config;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod symtab;
pub mod toolchain;

pub use config::{Backend, CompilerConfig};
pub use gpt_core::diagnostics::{Diagnostics, Severity};
pub use interpreter::{Interpreter, RuntimeError};
pub use parser::{ParseError, Parser};
pub use symtab::SymbolTable;

use std::fs;
use std::path::Path;

/// Reads `input`, runs it through [`compile_source`] and reports the result
/// the same way the CLI wants it: diagnostics to stderr, an exit code, or a
/// toolchain-level error if reading the file itself failed.
pub fn compile_file(input: &Path, config: &CompilerConfig) -> Result<i32, String> {
    let source = fs::read_to_string(input)
        .map_err(|e| format!("não foi possível ler {}: {e}", input.display()))?;
    compile_source(&source, &input.display().to_string(), config)
}

/// Runs the full pipeline over `source` (parse, analyze, then dispatch to
/// the configured back-end) and returns the process exit code: `0` on
/// success, `1` if parsing or analysis produced an error diagnostic, or
/// whatever a top-level `retorne` coerces to when interpreting (§6.1).
///
/// Diagnostics are written to stderr as they become final, matching the
/// original tool's behavior of reporting everything it found rather than
/// stopping at the first error.
pub fn compile_source(source: &str, source_name: &str, config: &CompilerConfig) -> Result<i32, String> {
    let _span = tracing::debug_span!("compile", file = source_name).entered();

    let mut diagnostics = Diagnostics::new(source_name);
    diagnostics.set_show_tips(config.show_tips);

    let program = {
        let _span = tracing::debug_span!("parse").entered();
        match Parser::new(source).and_then(|mut p| p.parse()) {
            Ok(program) => program,
            Err(e) => {
                diagnostics.error(e.message, e.line);
                diagnostics.emit(std::io::stderr()).map_err(|e| e.to_string())?;
                return Ok(1);
            }
        }
    };

    let table = {
        let _span = tracing::debug_span!("analyze").entered();
        analyzer::analyze(&program, &mut diagnostics)
    };

    diagnostics
        .emit(std::io::stderr())
        .map_err(|e| e.to_string())?;
    if diagnostics.has_errors() {
        return Ok(1);
    }

    match &config.backend {
        Backend::Interpret => {
            let _span = tracing::debug_span!("interpret").entered();
            let stdin = std::io::stdin();
            let mut interp = Interpreter::new(&program, &table, stdin.lock(), std::io::stdout());
            interp.run().map_err(|e| e.to_string())
        }
        Backend::CSource { path } => {
            let _span = tracing::debug_span!("codegen_c").entered();
            let c = codegen_c::generate(&program, &table).map_err(|e| e.to_string())?;
            fs::write(path, c).map_err(|e| format!("não foi possível escrever {}: {e}", path.display()))?;
            Ok(0)
        }
        Backend::Assembly { path } => {
            let _span = tracing::debug_span!("codegen_x86").entered();
            let asm = full_assembly(&program, &table)?;
            fs::write(path, asm).map_err(|e| format!("não foi possível escrever {}: {e}", path.display()))?;
            Ok(0)
        }
        Backend::Binary { path } => {
            let _span = tracing::debug_span!("codegen_x86").entered();
            let asm = full_assembly(&program, &table)?;
            let _span = tracing::debug_span!("assemble").entered();
            toolchain::assemble_to_binary(&asm, path)?;
            Ok(0)
        }
    }
}

/// The generated program's assembly, prefixed with the runtime it calls
/// into (`imprima`, `leia`, `clone_literal`, `_start`) so a single `nasm -f
/// bin` invocation of the result yields a runnable flat binary.
fn full_assembly(program: &gpt_core::Program, table: &SymbolTable) -> Result<String, String> {
    let body = codegen_x86::generate(program, table).map_err(|e| e.to_string())?;
    Ok(format!("{}\n{}", gpt_runtime::RUNTIME_ASM, body))
}
