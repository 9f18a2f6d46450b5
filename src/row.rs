//! Row and snapshot data types for the tabular source.
//!
//! A snapshot is immutable once produced; rows keep their fields in schema
//! order because downstream column detection is first-match-wins.
use serde::Serialize;
use std::fmt;

/// One cell value as sourced from the tabular collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl FieldValue {
    /// Infer a typed value from a raw cell the way spreadsheet exports do:
    /// empty cells are null, integers and floats become numbers, the literal
    /// booleans become booleans, everything else stays text.
    pub fn infer(raw: &str) -> FieldValue {
        if raw.is_empty() {
            return FieldValue::Null;
        }
        match raw {
            "true" | "TRUE" | "True" => return FieldValue::Bool(true),
            "false" | "FALSE" | "False" => return FieldValue::Bool(false),
            _ => {}
        }
        if let Ok(n) = raw.parse::<i64>() {
            return FieldValue::Int(n);
        }
        if let Ok(f) = raw.parse::<f64>() {
            return FieldValue::Float(f);
        }
        FieldValue::Str(raw.to_string())
    }

    /// The string form used for matching and display. Null renders empty.
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Int(n) => n.to_string(),
            FieldValue::Float(f) => f.to_string(),
            FieldValue::Str(s) => s.clone(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

/// One record from the tabular source. Fields stay in schema order; the row
/// has no intrinsic key and is only ever selected by content match.
#[derive(Debug, Clone, Serialize)]
pub struct Row {
    fields: Vec<(String, FieldValue)>,
}

impl Row {
    pub fn new(fields: Vec<(String, FieldValue)>) -> Row {
        Row { fields }
    }

    /// Field value by exact column name, if present.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Fields in schema order.
    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }
}

/// An immutable snapshot of the source: column order plus materialized rows.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_scalars() {
        assert_eq!(FieldValue::infer(""), FieldValue::Null);
        assert_eq!(FieldValue::infer("42"), FieldValue::Int(42));
        assert_eq!(FieldValue::infer("4.5"), FieldValue::Float(4.5));
        assert_eq!(FieldValue::infer("TRUE"), FieldValue::Bool(true));
        assert_eq!(
            FieldValue::infer("AB-12"),
            FieldValue::Str("AB-12".to_string())
        );
    }

    #[test]
    fn test_row_get_preserves_schema_order() {
        let row = Row::new(vec![
            ("b".to_string(), FieldValue::Int(1)),
            ("a".to_string(), FieldValue::Int(2)),
        ]);
        assert_eq!(row.get("a"), Some(&FieldValue::Int(2)));
        assert_eq!(row.get("missing"), None);
        let names: Vec<&str> = row.fields().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
