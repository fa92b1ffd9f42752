//! Stateful scanners for multi-line rebar3 output.
//!
//! Each scanner is a state enum plus a transition function
//! `(state, line) -> (state, Option<Diagnostic>)`. A scan folds that function
//! over the lines of one captured output, starting from the default (idle)
//! state. Lines that do not advance the machine are ignored. Whatever is still
//! half-built when the input ends is dropped.

mod dialyzer;
mod eunit;

pub use common_test::{CommonTestScanner, CommonTestState};
pub use dialyzer::{DialyzerScanner, DialyzerState, strip_build_prefix};
pub use eunit::{EunitScanner, EunitState};

use crate::Diagnostic;
use crate::patterns::output_lines;
use serde::{Deserialize, Serialize};

/// A line-driven state machine that produces diagnostics.
pub trait Scanner {
    type State: Default + std::fmt::Debug;

    /// Scanner name used in logs and listings.
    fn name(&self) -> &'static str;

    /// Advance the machine by one line.
    fn step(&self, state: Self::State, line: &str) -> (Self::State, Option<Diagnostic>);

    /// Whether `state` holds a partially assembled diagnostic.
    fn is_incomplete(state: &Self::State) -> bool;

    /// Run the machine over a complete captured output.
    fn scan(&self, output: &str) -> Vec<Diagnostic> {
        let (state, diagnostics) = output_lines(output).fold(
            (Self::State::default(), Vec::new()),
            |(state, mut diagnostics), line| {
                let before = std::mem::discriminant(&state);
                let (next, emitted) = self.step(state, &line);
                if std::mem::discriminant(&next) != before {
                    tracing::trace!(scanner = self.name(), state = ?next, %line, "transition");
                }
                if let Some(diag) = emitted {
                    tracing::trace!(scanner = self.name(), file = %diag.file.display(), line = diag.line, "emitted diagnostic");
                    diagnostics.push(diag);
                }
                (next, diagnostics)
            },
        );
        if Self::is_incomplete(&state) {
            tracing::debug!(scanner = self.name(), ?state, "output ended mid-incident, dropping it");
        }
        diagnostics
    }
}

/// How the dialyzer scanner reports file paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathStrategy {
    /// Use the path exactly as the tool printed it.
    Raw,
    /// Strip `<build_dir>/<profile>/lib/<app>/` to get the source-relative path.
    #[default]
    Normalized,
}

/// Knobs shared by the scanners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    pub paths: PathStrategy,
    /// Build output directory name (`_build`).
    pub build_dir: String,
    /// Separator used to join multi-line traces.
    pub line_separator: String,
    /// Directory common test suites live in.
    pub test_dir: String,
    /// Suffix appended to a suite module to get its file name.
    pub source_suffix: String,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            paths: PathStrategy::default(),
            build_dir: "_build".to_string(),
            line_separator: "\n".to_string(),
            test_dir: "test".to_string(),
            source_suffix: ".erl".to_string(),
        }
    }
}

/// The built-in state machines an action can be wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScannerKind {
    Eunit,
    Dialyzer,
    CommonTest,
}

impl ScannerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eunit => "eunit",
            Self::Dialyzer => "dialyzer",
            Self::CommonTest => "common-test",
        }
    }

    /// Build a fresh machine from `options` and run it over `output`.
    pub fn scan(&self, output: &str, options: &ScanOptions) -> Vec<Diagnostic> {
        match self {
            Self::Eunit => EunitScanner::new(&options.line_separator).scan(output),
            Self::Dialyzer => {
                DialyzerScanner::new(options.paths, &options.build_dir).scan(output)
            }
            Self::CommonTest => {
                CommonTestScanner::new(&options.test_dir, &options.source_suffix).scan(output)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_options_from_partial_toml() {
        let options: ScanOptions = toml::from_str("paths = \"raw\"").unwrap();
        assert_eq!(options.paths, PathStrategy::Raw);
        assert_eq!(options.build_dir, "_build");
        assert_eq!(options.line_separator, "\n");
    }

    #[test]
    fn test_scanner_kind_names() {
        let kind: ScannerKind = serde_json::from_str("\"common-test\"").unwrap();
        assert_eq!(kind, ScannerKind::CommonTest);
        assert_eq!(kind.as_str(), "common-test");
    }

    #[derive(Clone, Default)]
    struct Capture(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_transitions_are_traced() {
        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let output = "noise\nfoo_test...*failed*\n";
        let diags = tracing::subscriber::with_default(subscriber, || {
            ScannerKind::Eunit.scan(output, &ScanOptions::default())
        });
        assert!(diags.is_empty());

        let logs = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        assert_eq!(logs.matches("transition").count(), 1);
        assert!(logs.contains("FindLocation"));
        assert!(logs.contains("dropping it"));
    }

    #[test]
    fn test_every_scanner_ignores_unrelated_output() {
        let output = "===> Verifying dependencies...\nall good\n\n";
        for kind in [
            ScannerKind::Eunit,
            ScannerKind::Dialyzer,
            ScannerKind::CommonTest,
        ] {
            assert!(kind.scan(output, &ScanOptions::default()).is_empty());
        }
    }
}
