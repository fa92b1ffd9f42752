//! Action descriptors: what to invoke and how to read its output.

use crate::extract::{LineExtractor, extract_all};
use crate::scan::{ScanOptions, ScannerKind};
use crate::Diagnostic;
use std::collections::BTreeMap;

/// How an action's captured output turns into diagnostics.
#[derive(Debug, Clone)]
pub enum OutputStrategy {
    /// The output carries no diagnostics (e.g. `clean`).
    None,
    /// Stateless per-line patterns, tried in order.
    Extract(Vec<LineExtractor>),
    /// A multi-line state machine.
    Scan(ScannerKind),
}

impl OutputStrategy {
    pub fn parse(&self, output: &str, options: &ScanOptions) -> Vec<Diagnostic> {
        match self {
            Self::None => Vec::new(),
            Self::Extract(extractors) => extract_all(output, extractors),
            Self::Scan(kind) => kind.scan(output, options),
        }
    }

    /// Short description for listings ("extract (2 patterns)", "scan: eunit").
    pub fn describe(&self) -> String {
        match self {
            Self::None => "none".to_string(),
            Self::Extract(extractors) => format!("extract ({} patterns)", extractors.len()),
            Self::Scan(kind) => format!("scan: {}", kind.as_str()),
        }
    }
}

/// One invocable build action.
#[derive(Debug, Clone)]
pub struct ActionDescriptor {
    /// Lookup name (e.g., "compile").
    pub name: String,
    /// Name shown to users (e.g., "Rebar3: compile").
    pub display_name: String,
    /// Other names the action answers to.
    pub aliases: Vec<String>,
    /// Program to run.
    pub executable: String,
    /// Arguments passed to `executable`.
    pub args: Vec<String>,
    /// Environment overrides for the invocation.
    pub env: BTreeMap<String, String>,
    pub strategy: OutputStrategy,
}

impl ActionDescriptor {
    pub fn new(name: &str, executable: &str, strategy: OutputStrategy) -> Self {
        Self {
            name: name.to_string(),
            display_name: name.to_string(),
            aliases: Vec::new(),
            executable: executable.to_string(),
            args: vec![name.to_string()],
            env: BTreeMap::new(),
            strategy,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }

    /// Parse the captured output of one invocation of this action.
    pub fn parse(&self, output: &str, options: &ScanOptions) -> Vec<Diagnostic> {
        self.strategy.parse(output, options)
    }

    /// Full command line, for display.
    pub fn command_line(&self) -> String {
        std::iter::once(self.executable.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
