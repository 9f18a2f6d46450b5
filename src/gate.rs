//! Status precondition gate.
//!
//! A row may only be processed while its status column carries the required
//! value. Anything else is a hard stop for the current run.
use crate::row::Row;

/// Outcome of the precondition check.
#[derive(Debug, PartialEq)]
pub enum GateCheck {
    Ok,
    FieldMissing,
    Mismatch { actual: String },
}

/// Compare the row's trimmed status value to the required value, exact and
/// case-sensitive.
pub fn check(row: &Row, status_field: &str, required_value: &str) -> GateCheck {
    let Some(value) = row.get(status_field) else {
        return GateCheck::FieldMissing;
    };
    let actual = value.as_text().trim().to_string();
    if actual == required_value {
        GateCheck::Ok
    } else {
        GateCheck::Mismatch { actual }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::FieldValue;

    fn row(status: &str) -> Row {
        Row::new(vec![(
            "status".to_string(),
            FieldValue::Str(status.to_string()),
        )])
    }

    #[test]
    fn test_gate_passes_on_exact_match() {
        assert_eq!(check(&row("pending"), "status", "pending"), GateCheck::Ok);
    }

    #[test]
    fn test_gate_trims_stored_value() {
        assert_eq!(check(&row(" pending "), "status", "pending"), GateCheck::Ok);
    }

    #[test]
    fn test_gate_is_case_sensitive() {
        assert_eq!(
            check(&row("Pending"), "status", "pending"),
            GateCheck::Mismatch {
                actual: "Pending".to_string()
            }
        );
    }

    #[test]
    fn test_gate_reports_missing_field() {
        assert_eq!(
            check(&row("pending"), "state", "pending"),
            GateCheck::FieldMissing
        );
    }
}
