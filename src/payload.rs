//! Embedded payload extraction and flattening.
//!
//! One column of the matched row carries the request details as JSON text.
//! Detection scans the row's fields in schema order and takes the first value
//! that looks like JSON; downstream shape depends on this, so first-match
//! stays first-match. Flattening is total over decodable inputs: once the
//! text parses, some table always comes out.
use crate::row::Row;
use serde_json::Value;

/// Flattened payload ready for read-only rendering.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    fn empty() -> Table {
        Table {
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }
}

/// First field in schema order whose trimmed text looks like a JSON object or
/// array. Pure function of row content.
pub fn detect_column(row: &Row) -> Option<&str> {
    row.fields().iter().find_map(|(name, value)| {
        let text = value.as_text();
        let text = text.trim();
        let looks_like_json = (text.starts_with('{') && text.ends_with('}'))
            || (text.starts_with('[') && text.ends_with(']'));
        if looks_like_json {
            Some(name.as_str())
        } else {
            None
        }
    })
}

/// Decode the payload text and flatten it. Malformed JSON yields `None`;
/// a parse error never escapes this boundary.
pub fn parse(raw_text: &str) -> Option<Table> {
    let cleaned = strip_wrappers(raw_text);
    let value: Value = serde_json::from_str(cleaned).ok()?;
    Some(flatten(&value))
}

/// Strip a leading byte-order mark and a possible fenced-code-block wrapper
/// around the JSON text.
fn strip_wrappers(text: &str) -> &str {
    let text = text.trim_start_matches('\u{feff}').trim();

    if let Some(start) = text.find("```json") {
        let start = start + 7;
        if let Some(end) = text[start..].find("```") {
            return text[start..start + end].trim();
        }
    }

    if let Some(start) = text.find("```") {
        let start = start + 3;
        // Skip language identifier if present
        let start = text[start..]
            .find('\n')
            .map(|i| start + i + 1)
            .unwrap_or(start);
        if let Some(end) = text[start..].find("```") {
            return text[start..start + end].trim();
        }
    }

    text
}

fn flatten(value: &Value) -> Table {
    match value {
        Value::Array(items) => flatten_array(items),
        Value::Object(fields) => {
            // A single object flattens to one row, so pivot it into a
            // field/value table for readability.
            let rows = fields
                .iter()
                .map(|(key, val)| vec![key.clone(), render_cell(val)])
                .collect();
            Table {
                columns: vec!["field".to_string(), "value".to_string()],
                rows,
            }
        }
        scalar => Table {
            columns: vec!["value".to_string()],
            rows: vec![vec![render_cell(scalar)]],
        },
    }
}

fn flatten_array(items: &[Value]) -> Table {
    if items.is_empty() {
        return Table::empty();
    }

    if items.iter().all(Value::is_object) {
        // Union of keys across objects, in first-seen order; objects missing
        // a key get an empty cell.
        let mut columns: Vec<String> = Vec::new();
        for item in items {
            if let Value::Object(fields) = item {
                for key in fields.keys() {
                    if !columns.iter().any(|c| c == key) {
                        columns.push(key.clone());
                    }
                }
            }
        }
        let rows = items
            .iter()
            .map(|item| {
                columns
                    .iter()
                    .map(|column| {
                        item.get(column)
                            .map(render_cell)
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect();
        return Table { columns, rows };
    }

    // Any non-object element demotes the whole list to raw values.
    Table {
        columns: vec!["value".to_string()],
        rows: items.iter().map(|item| vec![render_cell(item)]).collect(),
    }
}

/// Cell text for one JSON value: strings bare, null empty, nested values as
/// compact JSON.
fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        nested => nested.to_string(),
    }
}
