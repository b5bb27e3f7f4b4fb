//! Diagnostics sink (§4.1): the single collecting surface every pass writes
//! errors and tips to. The REDESIGN FLAG in the language spec calls for this
//! to be an explicit struct passed by `&mut` reference rather than a process
//! singleton (the historical C++ implementation used one) — every entry
//! point in this toolchain threads a `&mut Diagnostics` instead.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Tip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub line: u32,
    /// Tip code, e.g. a short mnemonic shown alongside `-d`. Unused for
    /// errors.
    pub code: Option<String>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Portuguese-prose form per §7: `<line>: <message>`.
        write!(f, "{}: {}", self.line, self.message)
    }
}

/// Collects errors and tips with their source line. Construct one per
/// compilation and thread it by `&mut` reference through the analyzer and
/// (if analysis succeeded) the chosen back-end.
#[derive(Debug, Default)]
pub struct Diagnostics {
    source_file: Option<String>,
    records: Vec<Diagnostic>,
    show_tips: bool,
}

impl Diagnostics {
    pub fn new(source_file: impl Into<String>) -> Self {
        Diagnostics {
            source_file: Some(source_file.into()),
            records: Vec::new(),
            show_tips: false,
        }
    }

    /// Enable tip display (`-d` flag, §6.1).
    pub fn set_show_tips(&mut self, show: bool) {
        self.show_tips = show;
    }

    pub fn source_file(&self) -> Option<&str> {
        self.source_file.as_deref()
    }

    pub fn error(&mut self, message: impl Into<String>, line: u32) {
        self.records.push(Diagnostic {
            severity: Severity::Error,
            message: message.into(),
            line,
            code: None,
        });
    }

    pub fn tip(&mut self, message: impl Into<String>, line: u32, code: impl Into<String>) {
        self.records.push(Diagnostic {
            severity: Severity::Tip,
            message: message.into(),
            line,
            code: Some(code.into()),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.records.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.records.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn tips(&self) -> impl Iterator<Item = &Diagnostic> {
        self.records.iter().filter(|d| d.severity == Severity::Tip)
    }

    pub fn records(&self) -> &[Diagnostic] {
        &self.records
    }

    /// Batch emission: prints every collected diagnostic to `out`, tips only
    /// when `-d` was requested.
    pub fn emit(&self, mut out: impl std::io::Write) -> std::io::Result<()> {
        for d in &self.records {
            match d.severity {
                Severity::Error => writeln!(out, "{d}")?,
                Severity::Tip if self.show_tips => {
                    let code = d.code.as_deref().unwrap_or("");
                    writeln!(out, "dica [{code}] {}: {}", d.line, d.message)?
                }
                Severity::Tip => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_errors_reflects_error_records_only() {
        let mut diag = Diagnostics::new("prog.pol");
        assert!(!diag.has_errors());
        diag.tip("considere usar uma variável", 3, "T001");
        assert!(!diag.has_errors());
        diag.error("variável x já declarada", 3);
        assert!(diag.has_errors());
    }

    #[test]
    fn emit_hides_tips_unless_requested() {
        let mut diag = Diagnostics::new("prog.pol");
        diag.error("variável x já declarada", 3);
        diag.tip("tente outro nome", 3, "T001");

        let mut buf = Vec::new();
        diag.emit(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("3: variável x já declarada"));
        assert!(!text.contains("dica"));

        diag.set_show_tips(true);
        let mut buf = Vec::new();
        diag.emit(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("dica"));
    }
}
