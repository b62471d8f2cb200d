//! Non-fatal compiler messages.
//!
//! Errors abort compilation through [`CompilationError`](crate::CompilationError);
//! everything that lets compilation continue, such as unused variables, is
//! collected here instead.

use std::fmt;

use crate::Span;

/// Severity of a non-fatal diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiagnosticKind {
    /// Informational; lower priority than a warning.
    Info,
    /// Code that compiles but is probably a mistake.
    Warning,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiagnosticKind::Info => "info",
            DiagnosticKind::Warning => "warning",
        })
    }
}

/// A single diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub span: Span,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.span, self.kind, self.message)
    }
}

/// Collection of diagnostics produced while compiling one or more methods.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    diagnostics: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: DiagnosticKind, message: impl Into<String>, span: Span) {
        self.diagnostics.push(Diagnostic {
            kind,
            message: message.into(),
            span,
        });
    }

    pub fn warn(&mut self, message: impl Into<String>, span: Span) {
        self.push(DiagnosticKind::Warning, message, span);
    }

    pub fn info(&mut self, message: impl Into<String>, span: Span) {
        self.push(DiagnosticKind::Info, message, span);
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.of_kind(DiagnosticKind::Warning)
    }

    pub fn infos(&self) -> impl Iterator<Item = &Diagnostic> {
        self.of_kind(DiagnosticKind::Info)
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn clear(&mut self) {
        self.diagnostics.clear();
    }

    fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for diagnostic in &self.diagnostics {
            writeln!(f, "{diagnostic}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_by_kind() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.warn("unused variable 'x'", Span::new(1, 1, 1));
        diagnostics.info("unused parameter 'y'", Span::new(2, 1, 1));

        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics.warning_count(), 1);
        assert_eq!(diagnostics.infos().count(), 1);
    }

    #[test]
    fn display_format() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.warn("unused variable 'x'", Span::new(3, 5, 1));
        assert_eq!(diagnostics.to_string(), "3:5: warning: unused variable 'x'\n");

        diagnostics.clear();
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn info_ranks_below_warning() {
        assert!(DiagnosticKind::Info < DiagnosticKind::Warning);
    }
}
