//! Rebar3 - the Erlang build tool.
//!
//! https://rebar3.org/

use crate::extract::LineExtractor;
use crate::scan::ScannerKind;
use crate::{ActionDescriptor, BuildTool, OutputStrategy, ToolInfo};

const EXECUTABLE: &str = "rebar3";

/// Rebar3 build tool adapter.
pub struct Rebar3 {
    info: ToolInfo,
}

impl Rebar3 {
    pub fn new() -> Self {
        Self {
            info: ToolInfo {
                name: "rebar3",
                nice_name: "Rebar3",
                marker_files: &["rebar.config"],
                website: "https://rebar3.org/",
            },
        }
    }

    fn action(&self, name: &str, strategy: OutputStrategy) -> ActionDescriptor {
        ActionDescriptor::new(name, EXECUTABLE, strategy)
            .with_display_name(format!("{}: {name}", self.info.nice_name))
            // Keep the output free of colour codes.
            .with_env("REBAR_COLOR", "none")
    }
}

impl Default for Rebar3 {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildTool for Rebar3 {
    fn info(&self) -> &ToolInfo {
        &self.info
    }

    fn actions(&self) -> Vec<ActionDescriptor> {
        vec![
            self.action(
                "compile",
                OutputStrategy::Extract(vec![
                    LineExtractor::compile_error(),
                    LineExtractor::compile_warning(),
                ]),
            ),
            self.action("eunit", OutputStrategy::Scan(ScannerKind::Eunit))
                .with_alias("test"),
            self.action("ct", OutputStrategy::Scan(ScannerKind::CommonTest)),
            self.action("clean", OutputStrategy::None),
            self.action("dialyzer", OutputStrategy::Scan(ScannerKind::Dialyzer)),
        ]
    }
}
