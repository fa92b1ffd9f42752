//! Diagnostic types produced by every extractor and scanner.
//!
//! Field names are part of the wire contract with the host (editor, CI
//! renderer), so they serialize exactly as `file`, `line`, `column`,
//! `severity`, `message` and `trace`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Severity levels for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DiagnosticSeverity {
    /// The build step failed because of this issue.
    Error,
    /// Potential problem, should be fixed.
    Warning,
}

impl DiagnosticSeverity {
    /// Tag used in rendered output ("Error" / "Warning").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Warning => "Warning",
        }
    }

    /// Convert to SARIF level string.
    pub fn to_sarif_level(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

impl std::fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One supplementary block of detail attached to a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Severity-style tag, e.g. "Trace".
    #[serde(rename = "type")]
    pub tag: String,
    pub message: String,
}

impl TraceEntry {
    pub fn trace(message: impl Into<String>) -> Self {
        Self {
            tag: "Trace".to_string(),
            message: message.into(),
        }
    }
}

/// A single issue extracted from rebar3 output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// File path as reported by the tool (relative or absolute), or normalized.
    pub file: PathBuf,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column, when the tool reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    pub severity: DiagnosticSeverity,
    /// Human-readable message.
    pub message: String,
    /// Supplementary detail, in the order it appeared in the output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Vec<TraceEntry>>,
}

impl Diagnostic {
    pub fn error(file: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Error, file, line, message)
    }

    pub fn warning(file: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Warning, file, line, message)
    }

    pub fn new(
        severity: DiagnosticSeverity,
        file: impl Into<PathBuf>,
        line: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            line,
            column: None,
            severity,
            message: message.into(),
            trace: None,
        }
    }

    pub fn with_column(mut self, column: Option<usize>) -> Self {
        self.column = column;
        self
    }

    pub fn with_trace(mut self, trace: Vec<TraceEntry>) -> Self {
        self.trace = Some(trace);
        self
    }
}
