//! Line matchers shared by the extractors and scanners.
//!
//! Built-in patterns are compiled once into [`PATTERNS`]. User patterns from
//! `.moss/rebar3.toml` go through [`LinePattern::new`], which checks that the
//! named groups an extractor needs are present.

use crate::ToolError;
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Characters rebar3 uses in a file path (optionally behind a drive letter).
const PATH_CHARS: &str = r"(?:[A-Z]:)?[/0-9a-zA-Z\\._-]+";

/// Compiled built-in patterns.
pub struct Patterns {
    /// ANSI SGR/CSI escape sequences.
    pub ansi: Regex,
    pub compile_warning: LinePattern,
    pub compile_error: LinePattern,
    /// `foo_test...*failed*`, optionally behind `module:[line:] ` and
    /// followed by a ` (description)`.
    pub eunit_failed: Regex,
    /// `in function foo:bar/0 (_build/test/lib/app/test/foo_tests.erl, line 42)`
    pub eunit_location: Regex,
    /// `**error:...`, `**exit:...`, `**throw:...`
    pub eunit_error_start: Regex,
    /// `output:<<"...">>`
    pub eunit_output_end: Regex,
    /// A line made only of path characters.
    pub dialyzer_file: Regex,
    /// `  12: Function foo/1 has no local return`
    pub dialyzer_warning: Regex,
    /// `Line 12 Column 5: Function foo/1 has no local return`
    pub dialyzer_line_column: Regex,
    /// `- - - - - - - -`
    pub ct_separator: Regex,
    /// `mymod:mycase failed on line 7`
    pub ct_location: Regex,
    /// `Reason: timeout`
    pub ct_reason: Regex,
}

impl Patterns {
    fn new() -> Self {
        Self {
            ansi: static_regex(r"\x1b\[[0-9;?]*[A-Za-z]"),
            compile_warning: LinePattern::from_regex(static_regex(&format!(
                r"(?<file>{PATH_CHARS}):(?<line>\d+):(?:(?<column>\d+):)? Warning: (?<message>.+)"
            ))),
            compile_error: LinePattern::from_regex(static_regex(&format!(
                r"(?<file>{PATH_CHARS}):(?<line>\d+):(?:(?<column>\d+):)?\s+(?<message>.+)"
            )))
            .with_exclude(static_regex(r"^: Warning:")),
            eunit_failed: static_regex(
                r"^\s*(?:\w+:(?:\d+:)?\s+)?(?<name>[\w'/-]+)(?:\s+\(.*\))?\.\.\.\*failed\*",
            ),
            eunit_location: static_regex(r"\((?<path>[^,()]+), line (?<line>\d+)\)"),
            eunit_error_start: static_regex(r"^\s*\*\*(?:error|exit|throw):(?<rest>.*)$"),
            eunit_output_end: static_regex(r"^\s*output:"),
            dialyzer_file: static_regex(r"^[/0-9a-zA-Z\\._-]+$"),
            dialyzer_warning: static_regex(r"^\s+(?<line>\d+):\s*(?<message>.+)$"),
            dialyzer_line_column: static_regex(
                r"^\s*Line (?<line>\d+)(?: Column (?<column>\d+))?:\s*(?<message>.+)$",
            ),
            ct_separator: static_regex(r"^\s*(?:-+\s+)+-+\s*$"),
            ct_location: static_regex(
                r"^\s*(?<module>\w+):(?<case>\w+) failed on line (?<line>\d+)",
            ),
            ct_reason: static_regex(r"^\s*Reason:\s*(?<reason>.+?)\s*$"),
        }
    }
}

fn static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static regex must compile")
}

/// Process-wide pattern table, compiled on first use.
pub static PATTERNS: LazyLock<Patterns> = LazyLock::new(Patterns::new);

/// Remove terminal colour codes from a line of rebar3 output.
pub fn strip_ansi(line: &str) -> std::borrow::Cow<'_, str> {
    PATTERNS.ansi.replace_all(line, "")
}

/// Split captured output into lines (`\n` or `\r\n`) with colour codes removed.
pub fn output_lines(output: &str) -> impl Iterator<Item = std::borrow::Cow<'_, str>> {
    output.lines().map(strip_ansi)
}

/// Parse a captured decimal line/column number. Zero is not a valid position.
pub fn parse_position(text: &str) -> Option<usize> {
    text.parse::<usize>().ok().filter(|n| *n > 0)
}

/// A named-capture line pattern with an optional exclusion.
///
/// The pattern must define `file` and `line` groups and may define `column`
/// and `message`. `exclude` is tested against the text that follows the
/// matched location (after `column`, or `line` when there is no column); a
/// hit rejects the line. This is how the error pattern skips lines the
/// warning pattern owns without tripping over `Warning:` inside a message.
#[derive(Debug, Clone)]
pub struct LinePattern {
    regex: Regex,
    exclude: Option<Regex>,
}

/// Fields captured from one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMatch<'a> {
    pub file: &'a str,
    pub line: usize,
    pub column: Option<usize>,
    pub message: &'a str,
}

impl LinePattern {
    /// Compile a user-supplied pattern.
    pub fn new(pattern: &str) -> Result<Self, ToolError> {
        let regex = Regex::new(pattern).map_err(|e| ToolError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        for group in ["file", "line"] {
            if !regex.capture_names().flatten().any(|name| name == group) {
                return Err(ToolError::InvalidPattern {
                    pattern: pattern.to_string(),
                    reason: format!("missing named group `{group}`"),
                });
            }
        }
        Ok(Self::from_regex(regex))
    }

    /// Attach a user-supplied exclusion pattern.
    pub fn excluding(self, exclude: &str) -> Result<Self, ToolError> {
        let regex = Regex::new(exclude).map_err(|e| ToolError::InvalidPattern {
            pattern: exclude.to_string(),
            reason: e.to_string(),
        })?;
        Ok(self.with_exclude(regex))
    }

    fn from_regex(regex: Regex) -> Self {
        Self {
            regex,
            exclude: None,
        }
    }

    fn with_exclude(mut self, exclude: Regex) -> Self {
        self.exclude = Some(exclude);
        self
    }

    /// Match one line. Lines whose captured line number is not a positive
    /// decimal are treated as non-matching.
    pub fn captures<'a>(&self, line: &'a str) -> Option<LineMatch<'a>> {
        let caps = self.regex.captures(line)?;
        let file = caps.name("file")?.as_str();
        if file.is_empty() {
            return None;
        }
        let line_group = caps.name("line")?;
        let line_no = parse_position(line_group.as_str())?;
        let column_group = caps.name("column");
        let column = column_group.and_then(|m| parse_position(m.as_str()));
        let location_end = column_group.unwrap_or(line_group).end();
        if self
            .exclude
            .as_ref()
            .is_some_and(|re| re.is_match(&line[location_end..]))
        {
            return None;
        }
        let message = message_or_line(&caps, line);
        Some(LineMatch {
            file,
            line: line_no,
            column,
            message,
        })
    }
}

/// The `message` group, or the whole trimmed line when the pattern has none.
fn message_or_line<'a>(caps: &Captures<'a>, line: &'a str) -> &'a str {
    caps.name("message")
        .map(|m| m.as_str().trim_end())
        .unwrap_or_else(|| line.trim())
}
