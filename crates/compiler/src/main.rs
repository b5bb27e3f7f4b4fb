//! `gptc`: command-line front end over the `gptc` library crate.
//!
//! Flag-based rather than subcommand-based (§6.1) — a G-Portugol source
//! file picks exactly one of four things to do with it, not a verb phrase
//! over a project tree, so there is no `Commands` enum here the way the
//! rest of the workspace's tooling uses one.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser as ClapParser;

use gptc::{Backend, CompilerConfig};

#[derive(ClapParser, Debug)]
#[command(
    name = "gptc",
    disable_version_flag = true,
    disable_help_flag = true,
    about = "Compilador e interpretador G-Portugol"
)]
struct Cli {
    /// Arquivo-fonte de entrada (apenas um é suportado).
    files: Vec<PathBuf>,

    /// Compila e monta um binário no caminho indicado (padrão: a.out).
    #[arg(short = 'o', value_name = "ARQUIVO", conflicts_with_all = ["asm_path", "c_path", "interpret"])]
    output: Option<PathBuf>,

    /// Emite apenas o assembly x86 gerado.
    #[arg(short = 's', value_name = "ARQUIVO", conflicts_with_all = ["output", "c_path", "interpret"])]
    asm_path: Option<PathBuf>,

    /// Emite apenas o código C traduzido.
    #[arg(short = 't', value_name = "ARQUIVO", conflicts_with_all = ["output", "asm_path", "interpret"])]
    c_path: Option<PathBuf>,

    /// Interpreta o programa diretamente, sem gerar artefato.
    #[arg(short = 'i', conflicts_with_all = ["output", "asm_path", "c_path"])]
    interpret: bool,

    /// Habilita dicas nos diagnósticos, além dos erros.
    #[arg(short = 'd')]
    show_tips: bool,

    /// Exibe a versão e termina.
    #[arg(short = 'v')]
    version: bool,

    /// Exibe esta ajuda e termina.
    #[arg(short = 'h')]
    help: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("gptc=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.version {
        println!("gptc {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }
    if cli.help {
        print_usage();
        return ExitCode::SUCCESS;
    }

    if cli.files.len() != 1 {
        eprintln!(
            "gptc: esperado exatamente um arquivo de entrada, encontrado {}",
            cli.files.len()
        );
        return ExitCode::FAILURE;
    }
    let input = &cli.files[0];

    let backend = if cli.interpret {
        Backend::Interpret
    } else if let Some(path) = cli.asm_path {
        Backend::Assembly { path }
    } else if let Some(path) = cli.c_path {
        Backend::CSource { path }
    } else {
        Backend::Binary {
            path: cli.output.unwrap_or_else(|| PathBuf::from("a.out")),
        }
    };

    let config = CompilerConfig::new(backend).with_show_tips(cli.show_tips);

    match gptc::compile_file(input, &config) {
        Ok(code) => match u8::try_from(code.rem_euclid(256)) {
            Ok(code) => ExitCode::from(code),
            Err(_) => ExitCode::FAILURE,
        },
        Err(e) => {
            eprintln!("gptc: {e}");
            ExitCode::FAILURE
        }
    }
}

fn print_usage() {
    println!(
        "uso: gptc [opções] <arquivo>\n\n\
         opções:\n\
         \x20\x20(nenhuma)      compila e monta um binário em a.out\n\
         \x20\x20-o ARQUIVO    compila e monta um binário no caminho indicado\n\
         \x20\x20-s ARQUIVO    emite apenas o assembly gerado\n\
         \x20\x20-t ARQUIVO    emite apenas o código C traduzido\n\
         \x20\x20-i            interpreta o programa diretamente\n\
         \x20\x20-d            habilita dicas nos diagnósticos\n\
         \x20\x20-v            exibe a versão\n\
         \x20\x20-h            exibe esta ajuda"
    );
}
