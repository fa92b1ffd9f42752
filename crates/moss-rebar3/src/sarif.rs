//! SARIF 2.1.0 output format.
//!
//! SARIF (Static Analysis Results Interchange Format) is a standard format
//! for static analysis tool output. Supported by GitHub, VS Code, and many CI systems.

use crate::{Diagnostic, ToolInfo};
use serde::Serialize;

/// SARIF 2.1.0 report.
#[derive(Debug, Serialize)]
pub struct SarifReport {
    #[serde(rename = "$schema")]
    pub schema: &'static str,
    pub version: &'static str,
    pub runs: Vec<SarifRun>,
}

#[derive(Debug, Serialize)]
pub struct SarifRun {
    pub tool: SarifTool,
    pub results: Vec<SarifResult>,
}

#[derive(Debug, Serialize)]
pub struct SarifTool {
    pub driver: SarifDriver,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifDriver {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub information_uri: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SarifMessage {
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifResult {
    pub rule_id: String,
    pub level: String,
    pub message: SarifMessage,
    pub locations: Vec<SarifLocation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub code_flows: Vec<SarifCodeFlow>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifLocation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physical_location: Option<SarifPhysicalLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<SarifMessage>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifPhysicalLocation {
    pub artifact_location: SarifArtifactLocation,
    pub region: SarifRegion,
}

#[derive(Debug, Serialize)]
pub struct SarifArtifactLocation {
    pub uri: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifRegion {
    pub start_line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_column: Option<usize>,
}

/// Trace entries are carried as a single thread flow of message-only locations.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifCodeFlow {
    pub thread_flows: Vec<SarifThreadFlow>,
}

#[derive(Debug, Serialize)]
pub struct SarifThreadFlow {
    pub locations: Vec<SarifThreadFlowLocation>,
}

#[derive(Debug, Serialize)]
pub struct SarifThreadFlowLocation {
    pub location: SarifLocation,
}

impl SarifReport {
    /// Create a SARIF report from the diagnostics of one action of `tool`.
    pub fn from_diagnostics(tool: &ToolInfo, action: &str, diagnostics: &[Diagnostic]) -> Self {
        let results = diagnostics
            .iter()
            .map(|d| SarifResult {
                rule_id: format!("{}/{action}", tool.name),
                level: d.severity.to_sarif_level().to_string(),
                message: SarifMessage {
                    text: d.message.clone(),
                },
                locations: vec![SarifLocation {
                    physical_location: Some(SarifPhysicalLocation {
                        artifact_location: SarifArtifactLocation {
                            uri: d.file.display().to_string().replace('\\', "/"),
                        },
                        region: SarifRegion {
                            start_line: d.line,
                            start_column: d.column,
                        },
                    }),
                    message: None,
                }],
                code_flows: trace_flows(d),
            })
            .collect();

        SarifReport {
            schema: "https://json.schemastore.org/sarif-2.1.0.json",
            version: "2.1.0",
            runs: vec![SarifRun {
                tool: SarifTool {
                    driver: SarifDriver {
                        name: tool.name.to_string(),
                        information_uri: Some(tool.website.to_string()),
                    },
                },
                results,
            }],
        }
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

fn trace_flows(diagnostic: &Diagnostic) -> Vec<SarifCodeFlow> {
    let Some(trace) = diagnostic.trace.as_ref().filter(|t| !t.is_empty()) else {
        return Vec::new();
    };
    let locations = trace
        .iter()
        .map(|entry| SarifThreadFlowLocation {
            location: SarifLocation {
                physical_location: None,
                message: Some(SarifMessage {
                    text: entry.message.clone(),
                }),
            },
        })
        .collect();
    vec![SarifCodeFlow {
        thread_flows: vec![SarifThreadFlow { locations }],
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BuildTool, Rebar3, TraceEntry};

    #[test]
    fn test_report_shape() {
        let diags = vec![
            Diagnostic::warning("src/foo.erl", 12, "no local return").with_column(Some(3)),
            Diagnostic::error("foo_tests.erl", 42, "foo_test failed")
                .with_trace(vec![TraceEntry::trace("assertion failed")]),
        ];
        let report = SarifReport::from_diagnostics(Rebar3::new().info(), "eunit", &diags);
        let json: serde_json::Value = serde_json::from_str(&report.to_json()).unwrap();

        assert_eq!(json["version"], "2.1.0");
        let driver = &json["runs"][0]["tool"]["driver"];
        assert_eq!(driver["name"], "rebar3");
        assert_eq!(driver["informationUri"], "https://rebar3.org/");
        let results = &json["runs"][0]["results"];
        assert_eq!(results[0]["ruleId"], "rebar3/eunit");
        assert_eq!(results[0]["level"], "warning");
        let region = &results[0]["locations"][0]["physicalLocation"]["region"];
        assert_eq!(region["startLine"], 12);
        assert_eq!(region["startColumn"], 3);
        assert!(results[0].get("codeFlows").is_none());

        assert_eq!(results[1]["level"], "error");
        assert_eq!(
            results[1]["codeFlows"][0]["threadFlows"][0]["locations"][0]["location"]["message"]
                ["text"],
            "assertion failed"
        );
    }
}
