// src/diagnostics.rs - Non-fatal findings reported alongside an estimate
use serde::Serialize;
use std::fmt;

/// Something the estimator noticed but did not let stop the parse.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// `G20` was requested. Timing continues in millimeters.
    InchUnitsUnsupported,
    /// A recognized letter whose number did not parse. The token was dropped.
    MalformedToken { letter: char, text: String },
    /// An R-format arc whose radius cannot span its chord. The move was skipped.
    DegenerateArc { radius: f64, chord: f64 },
    /// A move whose target or length overflowed. The move was skipped.
    NonFiniteTarget,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::InchUnitsUnsupported => {
                write!(f, "unit conversion not supported, assuming millimeters")
            }
            DiagnosticKind::MalformedToken { letter, text } => {
                write!(f, "malformed number '{}' for {}, token ignored", text, letter)
            }
            DiagnosticKind::DegenerateArc { radius, chord } => write!(
                f,
                "arc radius {} is too small for chord {:.4}, move skipped",
                radius, chord
            ),
            DiagnosticKind::NonFiniteTarget => {
                write!(f, "target position out of range, move skipped")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// 1-based input line.
    pub line: usize,
    #[serde(flatten)]
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(line: usize, kind: DiagnosticKind) -> Self {
        Self { line, kind }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let diag = Diagnostic::new(3, DiagnosticKind::InchUnitsUnsupported);
        assert_eq!(diag.to_string(), "line 3: unit conversion not supported, assuming millimeters");
    }

    #[test]
    fn test_serializes_flat_with_kind_tag() {
        let diag = Diagnostic::new(7, DiagnosticKind::MalformedToken { letter: 'X', text: "1.2.3".to_string() });
        let json = serde_json::to_value(&diag).unwrap();
        assert_eq!(json["line"], 7);
        assert_eq!(json["kind"], "malformed_token");
        assert_eq!(json["letter"], "X");
        assert_eq!(json["text"], "1.2.3");
    }

    #[test]
    fn test_unit_kinds_serialize_as_tag_only() {
        let json = serde_json::to_value(Diagnostic::new(2, DiagnosticKind::NonFiniteTarget)).unwrap();
        assert_eq!(json, serde_json::json!({ "line": 2, "kind": "non_finite_target" }));
    }
}
