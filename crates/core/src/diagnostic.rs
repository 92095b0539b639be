//! Normalized findings
//!
//! One `Diagnostic` is one finding extracted from tool output. Absence
//! of a location is represented as `None`, never a sentinel value.
//! Parsing is deliberately tolerant: a line that does not match the
//! `path:line:col: severity: message` shape is never an error.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::LazyLock;

/// Severity of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational finding (wire word `note`)
    Info,
    /// Should be looked at, does not fail a blocking task
    Warning,
    /// Fails the task when the task is blocking
    Error,
}

impl Severity {
    /// Severity name for reporting
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }

    fn from_wire(word: &str) -> Option<Self> {
        match word {
            "error" => Some(Severity::Error),
            "warning" => Some(Severity::Warning),
            "note" => Some(Severity::Info),
            _ => None,
        }
    }
}

/// One normalized finding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// File the finding refers to, when known
    pub file: Option<PathBuf>,
    /// 1-based line, when known
    pub line: Option<u32>,
    /// 1-based column, when known
    pub col: Option<u32>,
    /// Human-readable message
    pub message: String,
    /// Severity of the finding
    pub severity: Severity,
    /// Tool rule identifier, when the tool reports one
    pub rule: Option<String>,
    /// Whether the producing task could fix this finding
    pub fixable: bool,
}

/// Location pattern: `<path>:<line>:<col>: <severity>: <message>`
static LOCATION_LINE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^(?P<path>[^\s:][^:]*):(?P<line>\d+):(?P<col>\d+):\s*(?P<sev>error|warning|note):\s*(?P<msg>.+)$")
        .expect("location pattern is valid")
});

/// Trailing rule id in a message: `... [rule-id]`
static TRAILING_RULE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^(?P<msg>.*\S)\s+\[(?P<rule>[A-Za-z0-9_.:-]+)\]$")
        .expect("rule pattern is valid")
});

impl Diagnostic {
    /// Create a message-only diagnostic with no location
    #[must_use]
    pub fn message_only(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            file: None,
            line: None,
            col: None,
            message: message.into(),
            severity,
            rule: None,
            fixable: false,
        }
    }

    /// Create an error diagnostic anchored to a file location
    #[must_use]
    pub fn error_at(
        file: impl Into<PathBuf>,
        line: u32,
        col: u32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            file: Some(file.into()),
            line: Some(line),
            col: Some(col),
            message: message.into(),
            severity: Severity::Error,
            rule: None,
            fixable: false,
        }
    }

    /// Mark the finding as fixable by its producing task
    #[must_use]
    pub fn fixable(mut self) -> Self {
        self.fixable = true;
        self
    }

    /// Parse one output line in the `path:line:col: severity: message`
    /// shape
    ///
    /// Returns `None` when the line does not match; callers decide
    /// whether to drop the line or keep it as a message-only
    /// diagnostic. A trailing `[rule-id]` is split off into `rule`.
    #[must_use]
    pub fn parse_line(line: &str) -> Option<Self> {
        let caps = LOCATION_LINE.captures(line.trim_end())?;

        // line/col are \d+ so the only parse failure is overflow
        let line_no: u32 = caps["line"].parse().ok()?;
        let col_no: u32 = caps["col"].parse().ok()?;
        let severity = Severity::from_wire(&caps["sev"])?;

        let raw_msg = caps["msg"].trim();
        let (message, rule) = match TRAILING_RULE.captures(raw_msg) {
            Some(rc) => (rc["msg"].to_string(), Some(rc["rule"].to_string())),
            None => (raw_msg.to_string(), None),
        };

        Some(Self {
            file: Some(PathBuf::from(&caps["path"])),
            line: Some(line_no),
            col: Some(col_no),
            message,
            severity,
            rule,
            fixable: false,
        })
    }

    /// Render the location prefix for reporting (`path:line:col`),
    /// empty when the finding has no location
    #[must_use]
    pub fn location(&self) -> String {
        match (&self.file, self.line, self.col) {
            (Some(file), Some(line), Some(col)) => {
                format!("{}:{line}:{col}", file.display())
            }
            (Some(file), Some(line), None) => format!("{}:{line}", file.display()),
            (Some(file), None, _) => file.display().to_string(),
            _ => String::new(),
        }
    }
}

/// What to do with output lines that do not match the location shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmatchedLines {
    /// Ignore non-matching lines
    #[default]
    Drop,
    /// Surface non-matching lines verbatim as message-only findings
    Keep,
}

/// Extract diagnostics from raw tool output
///
/// Every line is matched against the location shape; non-matching,
/// non-empty lines are handled per `unmatched`. Extraction never
/// fails, whatever the tool printed.
#[must_use]
pub fn extract_diagnostics(output: &str, unmatched: UnmatchedLines) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for line in output.lines() {
        if let Some(diag) = Diagnostic::parse_line(line) {
            diagnostics.push(diag);
        } else if unmatched == UnmatchedLines::Keep && !line.trim().is_empty() {
            diagnostics.push(Diagnostic::message_only(line.trim(), Severity::Info));
        }
    }
    diagnostics
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let location = self.location();
        if location.is_empty() {
            write!(f, "{}: {}", self.severity.name(), self.message)
        } else {
            write!(f, "{location}: {}: {}", self.severity.name(), self.message)
        }
    }
}
