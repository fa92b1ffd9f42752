//! Rebar3 build integration.
//!
//! Detects whether rebar3 applies to a project, describes the actions it
//! offers (compile, eunit, ct, clean, dialyzer) and turns the captured text
//! output of those actions into [`Diagnostic`]s. Running rebar3 is left to the
//! caller; this crate only reads what it printed.
//!
//! # Output handling
//!
//! - **Extractors**: stateless per-line patterns (`rebar3 compile`).
//! - **Scanners**: state machines over the whole output (`rebar3 eunit`,
//!   `rebar3 dialyzer`, `rebar3 ct`).
//!
//! # Custom Actions
//!
//! Actions and scanner options can be configured in `.moss/rebar3.toml`:
//!
//! ```toml
//! [scan]
//! paths = "raw"
//!
//! [actions.xref]
//! args = ["xref"]
//! [[actions.xref.patterns]]
//! regex = '(?<file>[^:\s]+):(?<line>\d+): (?<message>.+)'
//! severity = "warning"
//! ```
//!
//! # Example
//!
//! ```
//! use moss_rebar3::{DiagnosticSeverity, parse};
//!
//! let output = "src/foo.erl:12: Warning: variable 'X' is unused\n";
//! let diagnostics = parse("compile", output).unwrap();
//! assert_eq!(diagnostics[0].line, 12);
//! assert_eq!(diagnostics[0].severity, DiagnosticSeverity::Warning);
//! ```

mod actions;
mod config;
mod diagnostic;
pub mod extract;
pub mod patterns;
mod rebar3;
mod registry;
mod sarif;
pub mod scan;
mod tools;

pub use actions::{ActionDescriptor, OutputStrategy};
pub use config::{ActionConfig, CONFIG_PATH, PatternConfig, Rebar3Config, SeverityConfig};
pub use diagnostic::{Diagnostic, DiagnosticSeverity, TraceEntry};
pub use rebar3::Rebar3;
pub use registry::ActionRegistry;
pub use sarif::SarifReport;
pub use scan::{PathStrategy, ScanOptions, ScannerKind};
pub use tools::{ActionResult, BuildTool, ToolError, ToolInfo, has_marker_file};

use std::path::Path;

/// Create a registry with the built-in rebar3 actions.
pub fn default_registry() -> ActionRegistry {
    ActionRegistry::for_tool(&Rebar3::new())
}

/// Create a registry with built-in actions plus those in `.moss/rebar3.toml`
/// under `root`, using the scanner options from the same file.
pub fn registry_for_project(root: &Path) -> Result<ActionRegistry, ToolError> {
    let config = Rebar3Config::load(root)?;
    let mut registry = default_registry().with_options(config.scan.clone());
    for action in config.action_descriptors()? {
        registry.register(action);
    }
    Ok(registry)
}

/// Whether rebar3 applies to the project at `root` (`rebar.config` exists there).
pub fn is_eligible(root: &Path) -> Result<bool, ToolError> {
    Rebar3::new().is_eligible(root)
}

/// Parse the captured output of a built-in action with default options.
pub fn parse(action: &str, output: &str) -> Result<Vec<Diagnostic>, ToolError> {
    default_registry().parse(action, output)
}
