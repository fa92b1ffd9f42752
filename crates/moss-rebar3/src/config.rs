//! Per-project configuration from `.moss/rebar3.toml`.
//!
//! ```toml
//! [scan]
//! paths = "raw"            # or "normalized" (default)
//! build_dir = "_build"
//! line_separator = "\n"
//! test_dir = "test"
//! source_suffix = ".erl"
//!
//! [actions.xref]
//! args = ["xref"]
//! display_name = "Rebar3: xref"
//! env = { REBAR_COLOR = "none" }
//!
//! [[actions.xref.patterns]]
//! regex = '(?<file>[^:\s]+):(?<line>\d+): (?<message>.+)'
//! severity = "warning"
//!
//! [actions.integration]
//! args = ["as", "integration", "ct"]
//! scanner = "common-test"
//! ```
//!
//! A configured action with the same name as a built-in replaces it.

use crate::extract::LineExtractor;
use crate::patterns::LinePattern;
use crate::scan::{ScanOptions, ScannerKind};
use crate::{ActionDescriptor, DiagnosticSeverity, OutputStrategy, ToolError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Location of the config file, relative to the project root.
pub const CONFIG_PATH: &str = ".moss/rebar3.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Rebar3Config {
    pub scan: ScanOptions,
    pub actions: BTreeMap<String, ActionConfig>,
}

/// Configuration for a single action.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ActionConfig {
    /// Program to run (defaults to `rebar3`).
    pub executable: Option<String>,
    /// Arguments (defaults to the action name).
    pub args: Vec<String>,
    pub display_name: Option<String>,
    pub env: BTreeMap<String, String>,
    /// Single-line patterns. Mutually exclusive with `scanner`.
    pub patterns: Vec<PatternConfig>,
    /// Built-in state machine to use. Mutually exclusive with `patterns`.
    pub scanner: Option<ScannerKind>,
}

/// A user-supplied single-line pattern.
#[derive(Debug, Clone, Deserialize)]
pub struct PatternConfig {
    /// Regex with `file` and `line` groups, optionally `column` and `message`.
    pub regex: String,
    #[serde(default)]
    pub severity: SeverityConfig,
    /// Lines matching this regex are skipped.
    #[serde(default)]
    pub exclude: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SeverityConfig {
    #[default]
    Error,
    Warning,
}

impl From<SeverityConfig> for DiagnosticSeverity {
    fn from(s: SeverityConfig) -> Self {
        match s {
            SeverityConfig::Error => DiagnosticSeverity::Error,
            SeverityConfig::Warning => DiagnosticSeverity::Warning,
        }
    }
}

impl Rebar3Config {
    /// Load `.moss/rebar3.toml` under `root`. A missing file yields defaults.
    pub fn load(root: &Path) -> Result<Self, ToolError> {
        let path = root.join(CONFIG_PATH);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        let config = Self::parse(&content, &path)?;
        tracing::debug!(path = %path.display(), actions = config.actions.len(), "loaded rebar3 config");
        Ok(config)
    }

    /// Parse config text; `path` is only used in error messages.
    pub fn parse(content: &str, path: &Path) -> Result<Self, ToolError> {
        toml::from_str(content).map_err(|e| ToolError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Build descriptors for every configured action.
    pub fn action_descriptors(&self) -> Result<Vec<ActionDescriptor>, ToolError> {
        self.actions
            .iter()
            .map(|(name, config)| config.to_descriptor(name))
            .collect()
    }
}

impl ActionConfig {
    pub fn to_descriptor(&self, name: &str) -> Result<ActionDescriptor, ToolError> {
        let strategy = match (&self.scanner, self.patterns.is_empty()) {
            (Some(_), false) => {
                return Err(ToolError::Config {
                    path: PathBuf::from(CONFIG_PATH),
                    message: format!("action `{name}` sets both `scanner` and `patterns`"),
                });
            }
            (Some(kind), true) => OutputStrategy::Scan(*kind),
            (None, true) => OutputStrategy::None,
            (None, false) => OutputStrategy::Extract(
                self.patterns
                    .iter()
                    .map(PatternConfig::to_extractor)
                    .collect::<Result<_, _>>()?,
            ),
        };

        let mut descriptor = ActionDescriptor::new(
            name,
            self.executable.as_deref().unwrap_or("rebar3"),
            strategy,
        );
        if !self.args.is_empty() {
            descriptor = descriptor.with_args(self.args.iter().cloned());
        }
        if let Some(display_name) = &self.display_name {
            descriptor = descriptor.with_display_name(display_name.clone());
        }
        for (key, value) in &self.env {
            descriptor = descriptor.with_env(key, value);
        }
        Ok(descriptor)
    }
}

impl PatternConfig {
    fn to_extractor(&self) -> Result<LineExtractor, ToolError> {
        let mut pattern = LinePattern::new(&self.regex)?;
        if let Some(exclude) = &self.exclude {
            pattern = pattern.excluding(exclude)?;
        }
        Ok(LineExtractor::new(pattern, self.severity.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PathStrategy;
    use tempfile::TempDir;

    const EXAMPLE: &str = r#"
[scan]
paths = "raw"
line_separator = "\r\n"

[actions.xref]
args = ["xref"]
display_name = "Rebar3: xref"

[[actions.xref.patterns]]
regex = '(?<file>[^:\s]+):(?<line>\d+): (?<message>.+)'
severity = "warning"
exclude = 'Warning:'

[actions.integration]
args = ["as", "integration", "ct"]
scanner = "common-test"
env = { REBAR_COLOR = "none" }
"#;

    #[test]
    fn test_parse_example() {
        let config = Rebar3Config::parse(EXAMPLE, Path::new(CONFIG_PATH)).unwrap();
        assert_eq!(config.scan.paths, PathStrategy::Raw);
        assert_eq!(config.scan.line_separator, "\r\n");
        assert_eq!(config.scan.build_dir, "_build");

        let actions = config.action_descriptors().unwrap();
        assert_eq!(actions.len(), 2);

        let integration = &actions[0];
        assert_eq!(integration.name, "integration");
        assert_eq!(integration.command_line(), "rebar3 as integration ct");
        assert_eq!(integration.strategy.describe(), "scan: common-test");

        let xref = &actions[1];
        assert_eq!(xref.display_name, "Rebar3: xref");
        let diags = xref.parse(
            "src/a.erl:3: call to undefined function b:c/0\nsrc/a.erl:4: Warning: x\n",
            &config.scan,
        );
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, DiagnosticSeverity::Warning);
        assert_eq!(diags[0].message, "call to undefined function b:c/0");
    }

    #[test]
    fn test_scanner_and_patterns_conflict() {
        let config = Rebar3Config::parse(
            r#"
[actions.bad]
scanner = "eunit"
[[actions.bad.patterns]]
regex = '(?<file>\S+):(?<line>\d+)'
"#,
            Path::new(CONFIG_PATH),
        )
        .unwrap();
        assert!(matches!(
            config.action_descriptors(),
            Err(ToolError::Config { .. })
        ));
    }

    #[test]
    fn test_invalid_pattern() {
        let config = Rebar3Config::parse(
            "[[actions.bad.patterns]]\nregex = '(?<file>\\S+)'\n",
            Path::new(CONFIG_PATH),
        )
        .unwrap();
        assert!(matches!(
            config.action_descriptors(),
            Err(ToolError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            Rebar3Config::parse("[scan\n", Path::new(CONFIG_PATH)),
            Err(ToolError::Config { .. })
        ));
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Rebar3Config::load(dir.path()).unwrap();
        assert!(config.actions.is_empty());
        assert_eq!(config.scan, ScanOptions::default());
    }

    #[test]
    fn test_load_from_disk() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join(".moss")).unwrap();
        std::fs::write(dir.path().join(CONFIG_PATH), EXAMPLE).unwrap();
        let config = Rebar3Config::load(dir.path()).unwrap();
        assert_eq!(config.actions.len(), 2);
    }
}
