//! Build tool trait and common types.

use crate::{ActionDescriptor, Diagnostic, DiagnosticSeverity};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Information about a build tool.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    /// Tool name (e.g., "rebar3").
    pub name: &'static str,
    /// Name shown to users (e.g., "Rebar3").
    pub nice_name: &'static str,
    /// Files whose presence in the project root means the tool applies.
    pub marker_files: &'static [&'static str],
    /// URL to tool website.
    pub website: &'static str,
}

/// Diagnostics parsed from one action's output.
#[derive(Debug, Clone)]
pub struct ActionResult {
    /// Action that produced the output.
    pub action: String,
    /// Diagnostics in output order.
    pub diagnostics: Vec<Diagnostic>,
}

impl ActionResult {
    pub fn new(action: &str, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            action: action.to_string(),
            diagnostics,
        }
    }

    pub fn error_count(&self) -> usize {
        self.count(DiagnosticSeverity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(DiagnosticSeverity::Warning)
    }

    fn count(&self, severity: DiagnosticSeverity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

/// Error type for tool operations.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown action: {0}")]
    UnknownAction(String),
    #[error("invalid pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("invalid config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A build tool whose actions produce parseable output.
pub trait BuildTool: Send + Sync {
    /// Get tool information.
    fn info(&self) -> &ToolInfo;

    /// Whether the tool applies to the project at `root`.
    ///
    /// I/O failures other than a missing marker file are returned to the
    /// caller, which decides whether to treat the tool as inapplicable.
    fn is_eligible(&self, root: &Path) -> Result<bool, ToolError> {
        has_marker_file(root, self.info().marker_files)
    }

    /// The fixed set of actions the tool offers.
    fn actions(&self) -> Vec<ActionDescriptor>;
}

/// Check whether any of `names` exists as a file directly inside `root`.
pub fn has_marker_file(root: &Path, names: &[&str]) -> Result<bool, ToolError> {
    for name in names {
        match std::fs::metadata(root.join(name)) {
            Ok(meta) if meta.is_file() => return Ok(true),
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(false)
}
