//! Scanner for `rebar3 dialyzer` warnings.
//!
//! Dialyzer groups warnings under a file header:
//!
//! ```text
//! _build/default/lib/myapp/src/foo.erl
//!   12: Function foo/1 has no local return
//! Line 30 Column 5: The pattern 'ok' can never match the type 'error'
//! ```

use super::{PathStrategy, Scanner};
use crate::Diagnostic;
use crate::patterns::{PATTERNS, parse_position};
use std::path::PathBuf;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum DialyzerState {
    /// No file header seen yet.
    #[default]
    NoFile,
    /// Warnings are attributed to this file.
    InFile(PathBuf),
}

pub struct DialyzerScanner {
    strategy: PathStrategy,
    build_dir: String,
}

impl DialyzerScanner {
    pub fn new(strategy: PathStrategy, build_dir: &str) -> Self {
        Self {
            strategy,
            build_dir: build_dir.to_string(),
        }
    }

    fn header_path(&self, header: &str) -> PathBuf {
        match self.strategy {
            PathStrategy::Raw => PathBuf::from(header),
            PathStrategy::Normalized => strip_build_prefix(header, &self.build_dir)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(header)),
        }
    }
}

impl Default for DialyzerScanner {
    fn default() -> Self {
        Self::new(PathStrategy::default(), "_build")
    }
}

impl Scanner for DialyzerScanner {
    type State = DialyzerState;

    fn name(&self) -> &'static str {
        "dialyzer"
    }

    fn step(&self, state: DialyzerState, line: &str) -> (DialyzerState, Option<Diagnostic>) {
        let header = line.trim_end();
        if PATTERNS.dialyzer_file.is_match(header) {
            return (DialyzerState::InFile(self.header_path(header)), None);
        }

        let DialyzerState::InFile(file) = &state else {
            return (state, None);
        };

        let caps = PATTERNS
            .dialyzer_warning
            .captures(line)
            .or_else(|| PATTERNS.dialyzer_line_column.captures(line));
        let diag = caps.and_then(|caps| {
            let line_no = parse_position(&caps["line"])?;
            let column = caps.name("column").and_then(|m| parse_position(m.as_str()));
            Some(
                Diagnostic::warning(file.clone(), line_no, caps["message"].trim_end())
                    .with_column(column),
            )
        });
        (state, diag)
    }

    // The current file is context, not a pending diagnostic.
    fn is_incomplete(_state: &DialyzerState) -> bool {
        false
    }
}

/// Recover the source-relative path from a path inside the build directory.
///
/// `_build/default/lib/myapp/src/foo.erl` becomes `src/foo.erl`. Any leading
/// directories before `<build_dir>` are dropped as well, so absolute paths
/// normalize the same way. Returns `None` when the path is not under
/// `<build_dir>/<profile>/lib/<app>/`.
pub fn strip_build_prefix(path: &str, build_dir: &str) -> Option<String> {
    let parts: Vec<&str> = path.split(['/', '\\']).collect();
    let start = (0..parts.len()).rev().find(|&i| {
        parts[i] == build_dir && parts.get(i + 2) == Some(&"lib") && parts.len() > i + 4
    })?;
    Some(parts[start + 4..].join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DiagnosticSeverity;
    use std::path::Path;

    #[test]
    fn test_normalized_path() {
        let output = "_build/default/lib/myapp/src/foo.erl\n  12: Function foo/1 has no local return\n";
        let diags = DialyzerScanner::default().scan(output);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].file, Path::new("src/foo.erl"));
        assert_eq!(diags[0].line, 12);
        assert_eq!(diags[0].severity, DiagnosticSeverity::Warning);
        assert_eq!(diags[0].message, "Function foo/1 has no local return");
        assert!(diags[0].trace.is_none());
    }

    #[test]
    fn test_raw_path() {
        let output = "_build/default/lib/myapp/src/foo.erl\n  12: Function foo/1 has no local return\n";
        let diags = DialyzerScanner::new(PathStrategy::Raw, "_build").scan(output);
        assert_eq!(
            diags[0].file,
            Path::new("_build/default/lib/myapp/src/foo.erl")
        );
    }

    #[test]
    fn test_header_switches_current_file() {
        let output = r#"===> Verifying dependencies...
===> Analyzing 2 files with _build/default/rebar3_26.0_plt...

_build/default/lib/myapp/src/a.erl
  3: Function a/0 has no local return
  9: The call b:c() will never return

src/b.erl
Line 14 Column 2: Guard test is_atom(X::integer()) can never succeed
===> Warnings occurred running dialyzer: 3
"#;
        let diags = DialyzerScanner::default().scan(output);
        assert_eq!(diags.len(), 3);
        assert_eq!(diags[0].file, Path::new("src/a.erl"));
        assert_eq!(diags[1].file, Path::new("src/a.erl"));
        assert_eq!(diags[1].line, 9);
        assert_eq!(diags[2].file, Path::new("src/b.erl"));
        assert_eq!(diags[2].line, 14);
        assert_eq!(diags[2].column, Some(2));
    }

    #[test]
    fn test_warning_before_any_header_is_ignored() {
        let diags = DialyzerScanner::default().scan("  12: orphan warning\n");
        assert!(diags.is_empty());
    }

    #[test]
    fn test_strip_build_prefix() {
        assert_eq!(
            strip_build_prefix("_build/default/lib/myapp/src/foo.erl", "_build").as_deref(),
            Some("src/foo.erl")
        );
        assert_eq!(
            strip_build_prefix("/home/me/proj/_build/test/lib/app/test/x_SUITE.erl", "_build")
                .as_deref(),
            Some("test/x_SUITE.erl")
        );
        assert_eq!(
            strip_build_prefix(r"C:\proj\out\prod\lib\app\src\y.erl", "out").as_deref(),
            Some("src/y.erl")
        );
        assert_eq!(strip_build_prefix("src/foo.erl", "_build"), None);
        assert_eq!(strip_build_prefix("_build/default/lib/myapp", "_build"), None);
    }
}
