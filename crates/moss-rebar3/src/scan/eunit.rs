//! Scanner for `rebar3 eunit` failures.
//!
//! A failure in eunit output looks like:
//!
//! ```text
//! foo_tests: bar_test...*failed*
//! in function foo_tests:'-bar_test/0-fun-0-'/0 (_build/test/lib/myapp/test/foo_tests.erl, line 42)
//! **error:{assertEqual,[{module,foo_tests},
//!                       {expected,1},
//!                       {value,2}]}
//!   output:<<"">>
//! ```

use super::Scanner;
use crate::patterns::{PATTERNS, parse_position};
use crate::{Diagnostic, TraceEntry};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum EunitState {
    #[default]
    Idle,
    /// Saw `...*failed*`, waiting for the `(file, line N)` location.
    FindLocation { message: String },
    /// Waiting for the `**error:` marker.
    FindMessageStart {
        message: String,
        file: String,
        line: usize,
    },
    /// Collecting trace lines until `output:`.
    FindMessageEnd {
        message: String,
        file: String,
        line: usize,
        trace: Vec<String>,
    },
}

pub struct EunitScanner {
    line_separator: String,
}

impl EunitScanner {
    pub fn new(line_separator: &str) -> Self {
        Self {
            line_separator: line_separator.to_string(),
        }
    }
}

impl Default for EunitScanner {
    fn default() -> Self {
        Self::new("\n")
    }
}

impl Scanner for EunitScanner {
    type State = EunitState;

    fn name(&self) -> &'static str {
        "eunit"
    }

    fn step(&self, state: EunitState, line: &str) -> (EunitState, Option<Diagnostic>) {
        match state {
            EunitState::Idle => match PATTERNS.eunit_failed.captures(line) {
                Some(caps) => (
                    EunitState::FindLocation {
                        message: format!("{} failed", &caps["name"]),
                    },
                    None,
                ),
                None => (EunitState::Idle, None),
            },
            EunitState::FindLocation { message } => {
                let location = PATTERNS.eunit_location.captures(line).and_then(|caps| {
                    let file = base_name(&caps["path"]).to_string();
                    let line = parse_position(&caps["line"])?;
                    Some((file, line))
                });
                match location {
                    Some((file, line)) if !file.is_empty() => (
                        EunitState::FindMessageStart {
                            message,
                            file,
                            line,
                        },
                        None,
                    ),
                    _ => (EunitState::FindLocation { message }, None),
                }
            }
            EunitState::FindMessageStart {
                message,
                file,
                line: line_no,
            } => match PATTERNS.eunit_error_start.captures(line) {
                Some(caps) => (
                    EunitState::FindMessageEnd {
                        message,
                        file,
                        line: line_no,
                        trace: vec![caps["rest"].to_string()],
                    },
                    None,
                ),
                None => (
                    EunitState::FindMessageStart {
                        message,
                        file,
                        line: line_no,
                    },
                    None,
                ),
            },
            EunitState::FindMessageEnd {
                message,
                file,
                line: line_no,
                mut trace,
            } => {
                if PATTERNS.eunit_output_end.is_match(line) {
                    let diag = Diagnostic::error(file, line_no, message)
                        .with_trace(vec![TraceEntry::trace(trace.join(&self.line_separator))]);
                    (EunitState::Idle, Some(diag))
                } else {
                    trace.push(line.to_string());
                    (
                        EunitState::FindMessageEnd {
                            message,
                            file,
                            line: line_no,
                            trace,
                        },
                        None,
                    )
                }
            }
        }
    }

    fn is_incomplete(state: &EunitState) -> bool {
        !matches!(state, EunitState::Idle)
    }
}

/// Last component of a `/` or `\` separated path.
fn base_name(path: &str) -> &str {
    path.trim().rsplit(['/', '\\']).next().unwrap_or_default()
}
