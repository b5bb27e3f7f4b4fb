//! Compilation configuration: back-end selection, diagnostics verbosity and
//! output path, with builder methods over a `Default`-derived struct.

use std::path::PathBuf;

/// Which back-end a run should exercise, chosen by the CLI's mutually
/// exclusive mode flags (§6.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// Compile to x86 assembly, assemble and link to a binary at `path`.
    Binary { path: PathBuf },
    /// Emit assembly source only, at `path`.
    Assembly { path: PathBuf },
    /// Emit translated C source, at `path`.
    CSource { path: PathBuf },
    /// Interpret directly; no artifact is produced.
    Interpret,
}

#[derive(Debug, Clone)]
pub struct CompilerConfig {
    pub backend: Backend,
    /// `-d`: enable tip display in diagnostics.
    pub show_tips: bool,
}

impl CompilerConfig {
    pub fn new(backend: Backend) -> Self {
        CompilerConfig {
            backend,
            show_tips: false,
        }
    }

    pub fn with_show_tips(mut self, show: bool) -> Self {
        self.show_tips = show;
        self
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig::new(Backend::Binary {
            path: PathBuf::from("a.out"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_compiles_to_binary() {
        let config = CompilerConfig::default();
        assert_eq!(
            config.backend,
            Backend::Binary {
                path: PathBuf::from("a.out")
            }
        );
        assert!(!config.show_tips);
    }

    #[test]
    fn with_show_tips_sets_the_flag() {
        let config = CompilerConfig::new(Backend::Interpret).with_show_tips(true);
        assert!(config.show_tips);
    }
}
