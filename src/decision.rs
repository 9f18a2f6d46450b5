//! The structured human decision and its wire format.
//!
//! A decision always carries the identifier it was made for and the status
//! the operator saw at decision time. The optional per-line items cover the
//! variant where each payload row is accepted or declined individually.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Row-level judgment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Approve,
    Reject,
}

/// Judgment for one payload line item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineOutcome {
    Accept,
    Decline,
}

/// One per-line-item judgment plus the original fields it was made against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineDecision {
    pub outcome: LineOutcome,

    /// Required when the line is declined.
    #[serde(default)]
    pub note: String,

    /// The payload cells the operator was shown for this line.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub original_fields: BTreeMap<String, String>,
}

/// The decision delivered to the sink as a JSON body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub identifier: String,
    pub outcome: Outcome,

    /// Required non-empty when the outcome is Reject; ignored otherwise.
    #[serde(default)]
    pub reason: String,

    /// Status value observed when the precondition gate passed.
    pub observed_status: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub line_items: Vec<LineDecision>,
}

/// Check the decision's internal requirements before any delivery attempt.
/// Returns the user-facing message on failure.
pub fn validate(decision: &Decision) -> Result<(), String> {
    if decision.outcome == Outcome::Reject && decision.reason.trim().is_empty() {
        return Err("a rejection requires a non-empty reason".to_string());
    }
    for (index, line) in decision.line_items.iter().enumerate() {
        if line.outcome == LineOutcome::Decline && line.note.trim().is_empty() {
            return Err(format!(
                "declined line item {} requires a non-empty note",
                index + 1
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decision(outcome: Outcome, reason: &str) -> Decision {
        Decision {
            identifier: "AB-12".to_string(),
            outcome,
            reason: reason.to_string(),
            observed_status: "pending".to_string(),
            line_items: Vec::new(),
        }
    }

    #[test]
    fn test_reject_without_reason_fails_validation() {
        assert!(validate(&decision(Outcome::Reject, "  ")).is_err());
        assert!(validate(&decision(Outcome::Reject, "wrong amount")).is_ok());
    }

    #[test]
    fn test_approve_ignores_reason() {
        assert!(validate(&decision(Outcome::Approve, "")).is_ok());
    }

    #[test]
    fn test_declined_line_requires_note() {
        let mut d = decision(Outcome::Approve, "");
        d.line_items.push(LineDecision {
            outcome: LineOutcome::Decline,
            note: String::new(),
            original_fields: BTreeMap::new(),
        });
        assert!(validate(&d).is_err());
        d.line_items[0].note = "out of stock".to_string();
        assert!(validate(&d).is_ok());
    }

    #[test]
    fn test_wire_round_trip_preserves_core_fields() {
        let original = decision(Outcome::Reject, "duplicate request");
        let wire = serde_json::to_string(&original).unwrap();
        let parsed: Decision = serde_json::from_str(&wire).unwrap();
        assert_eq!(parsed.identifier, original.identifier);
        assert_eq!(parsed.outcome, original.outcome);
        assert_eq!(parsed.reason, original.reason);
    }

    #[test]
    fn test_outcome_serializes_lowercase() {
        let wire = serde_json::to_string(&decision(Outcome::Approve, "")).unwrap();
        assert!(wire.contains(r#""outcome":"approve""#));
        assert!(!wire.contains("line_items"));
    }
}
