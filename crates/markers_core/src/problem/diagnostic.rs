//! Diagnostic payload.
//!
//! Field names and severity codes follow the language server protocol wire
//! shape so producers can forward diagnostics without remapping.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Zero-based line/character position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// Half-open text range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// Severity, serialized as the protocol's numeric code (1 = error .. 4 = hint).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum DiagnosticSeverity {
    Error = 1,
    Warning = 2,
    Information = 3,
    Hint = 4,
}

/// Numeric severity code outside `1..=4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidSeverity(pub u8);

impl Display for InvalidSeverity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid diagnostic severity `{}`; expected 1..=4", self.0)
    }
}

impl Error for InvalidSeverity {}

impl From<DiagnosticSeverity> for u8 {
    fn from(severity: DiagnosticSeverity) -> Self {
        severity as u8
    }
}

impl TryFrom<u8> for DiagnosticSeverity {
    type Error = InvalidSeverity;

    fn try_from(code: u8) -> Result<Self, InvalidSeverity> {
        match code {
            1 => Ok(Self::Error),
            2 => Ok(Self::Warning),
            3 => Ok(Self::Information),
            4 => Ok(Self::Hint),
            other => Err(InvalidSeverity(other)),
        }
    }
}

/// One diagnostic reported for a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub range: Range,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<DiagnosticSeverity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Producer label, e.g. `typescript`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(range: Range, message: impl Into<String>) -> Self {
        Self {
            range,
            severity: None,
            code: None,
            source: None,
            message: message.into(),
        }
    }

    pub fn with_severity(mut self, severity: DiagnosticSeverity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Caption shown for the leaf node of this diagnostic.
    pub fn label(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::{Diagnostic, DiagnosticSeverity, InvalidSeverity, Position, Range};

    #[test]
    fn builder_sets_optional_fields() {
        let diagnostic = Diagnostic::new(
            Range::new(Position::new(1, 2), Position::new(1, 8)),
            "cannot find name `foo`",
        )
        .with_severity(DiagnosticSeverity::Error)
        .with_code("2304")
        .with_source("typescript");

        assert_eq!(diagnostic.severity, Some(DiagnosticSeverity::Error));
        assert_eq!(diagnostic.code.as_deref(), Some("2304"));
        assert_eq!(diagnostic.source.as_deref(), Some("typescript"));
        assert_eq!(diagnostic.label(), "cannot find name `foo`");
    }

    #[test]
    fn severity_uses_numeric_codes_on_the_wire() {
        let diagnostic = Diagnostic::new(
            Range::new(Position::new(0, 0), Position::new(0, 1)),
            "unused",
        )
        .with_severity(DiagnosticSeverity::Warning);
        let value = serde_json::to_value(&diagnostic).expect("diagnostic should serialize");
        assert_eq!(value["severity"], 2);

        let parsed: DiagnosticSeverity = serde_json::from_str("4").expect("hint code");
        assert_eq!(parsed, DiagnosticSeverity::Hint);
        assert!(serde_json::from_str::<DiagnosticSeverity>("5").is_err());
        assert_eq!(DiagnosticSeverity::try_from(0), Err(InvalidSeverity(0)));
    }

    #[test]
    fn severity_orders_most_severe_first() {
        assert!(DiagnosticSeverity::Error < DiagnosticSeverity::Warning);
        assert!(DiagnosticSeverity::Information < DiagnosticSeverity::Hint);
    }
}
