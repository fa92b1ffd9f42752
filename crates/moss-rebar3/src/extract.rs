//! Single-line extractors.
//!
//! Each line of output is tested on its own; no state is carried between
//! lines. Used for `rebar3 compile`, where warnings and errors are printed as
//! `file:line: message`.

use crate::patterns::{LinePattern, PATTERNS, output_lines};
use crate::{Diagnostic, DiagnosticSeverity};

/// One pattern plus the severity of what it finds.
#[derive(Debug, Clone)]
pub struct LineExtractor {
    pub pattern: LinePattern,
    pub severity: DiagnosticSeverity,
}

impl LineExtractor {
    pub fn new(pattern: LinePattern, severity: DiagnosticSeverity) -> Self {
        Self { pattern, severity }
    }

    /// `file:line: Warning: message` lines from erlc.
    pub fn compile_warning() -> Self {
        Self::new(
            PATTERNS.compile_warning.clone(),
            DiagnosticSeverity::Warning,
        )
    }

    /// `file:line: message` lines from erlc, excluding warnings.
    pub fn compile_error() -> Self {
        Self::new(PATTERNS.compile_error.clone(), DiagnosticSeverity::Error)
    }

    /// Extract at most one diagnostic from a single line.
    pub fn extract_line(&self, line: &str) -> Option<Diagnostic> {
        let m = self.pattern.captures(line)?;
        Some(Diagnostic::new(self.severity, m.file, m.line, m.message).with_column(m.column))
    }
}

/// Run every extractor over every line, in line order.
///
/// Extractors are tried in order and the first match wins, so a line is
/// reported at most once even when two patterns overlap.
pub fn extract_all(output: &str, extractors: &[LineExtractor]) -> Vec<Diagnostic> {
    output_lines(output)
        .filter_map(|line| extractors.iter().find_map(|e| e.extract_line(&line)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn compile_extractors() -> Vec<LineExtractor> {
        vec![LineExtractor::compile_error(), LineExtractor::compile_warning()]
    }

    #[test]
    fn test_compile_output() {
        let output = r#"===> Verifying dependencies...
===> Analyzing applications...
===> Compiling myapp
src/myapp_sup.erl:14: Warning: variable 'Args' is unused
src/myapp_server.erl:30: syntax error before: '->'
===> Compilation failed
"#;
        let diags = extract_all(output, &compile_extractors());
        assert_eq!(diags.len(), 2);

        assert_eq!(diags[0].file, Path::new("src/myapp_sup.erl"));
        assert_eq!(diags[0].line, 14);
        assert_eq!(diags[0].severity, DiagnosticSeverity::Warning);
        assert_eq!(diags[0].message, "variable 'Args' is unused");

        assert_eq!(diags[1].file, Path::new("src/myapp_server.erl"));
        assert_eq!(diags[1].line, 30);
        assert_eq!(diags[1].severity, DiagnosticSeverity::Error);
        assert_eq!(diags[1].message, "syntax error before: '->'");
    }

    #[test]
    fn test_warning_never_reported_as_error() {
        let output = "src/a.erl:1: Warning: w1\nsrc/b.erl:2:7: Warning: w2\n";
        let diags = extract_all(output, &compile_extractors());
        assert_eq!(diags.len(), 2);
        assert!(
            diags
                .iter()
                .all(|d| d.severity == DiagnosticSeverity::Warning)
        );
        assert_eq!(diags[1].column, Some(7));
    }

    #[test]
    fn test_error_extractor_alone_skips_warnings() {
        let diags = extract_all(
            "src/a.erl:1: Warning: w1\n",
            &[LineExtractor::compile_error()],
        );
        assert!(diags.is_empty());
    }

    #[test]
    fn test_warning_text_inside_error_message() {
        let output = "src/a.erl:5: record r undefined (see include/r.hrl:3: Warning: deprecated)\n";
        let diags = extract_all(output, &compile_extractors());
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].file, Path::new("src/a.erl"));
        assert_eq!(diags[0].line, 5);
        assert_eq!(diags[0].severity, DiagnosticSeverity::Error);
    }

    #[test]
    fn test_coloured_output() {
        let output = "\x1b[0;33msrc/a.erl:4: Warning: function f/0 is unused\x1b[0m\n";
        let diags = extract_all(output, &compile_extractors());
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "function f/0 is unused");
    }

    #[test]
    fn test_no_matches() {
        let diags = extract_all("===> Compiling myapp\n", &compile_extractors());
        assert!(diags.is_empty());
        assert!(extract_all("", &compile_extractors()).is_empty());
    }
}
