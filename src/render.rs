//! Terminal rendering of lookup results.
//!
//! The table output is the read-only view the operator decides against; the
//! JSON form serves the external UI collaborator.
use crate::payload::Table;
use crate::pipeline::Lookup;
use anyhow::{Context, Result};

const CELL_MAX_CHARS: usize = 60;

/// Render the flattened payload as an aligned text table.
pub fn table_text(table: &Table) -> String {
    if table.columns.is_empty() && table.rows.is_empty() {
        return "(empty payload)\n".to_string();
    }

    let mut widths: Vec<usize> = table
        .columns
        .iter()
        .map(|column| column.chars().count())
        .collect();
    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(|cell| clip(cell)).collect())
        .collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let mut out = String::new();
    push_line(&mut out, &table.columns, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut out, &rule, &widths);
    for row in &rows {
        push_line(&mut out, row, &widths);
    }
    out
}

/// Human summary of a successful lookup: where the row was found, its
/// status, and the payload table.
pub fn lookup_text(lookup: &Lookup) -> String {
    let mut out = format!(
        "request {} (column {}, status {})\npayload from column '{}':\n\n",
        lookup.identifier,
        lookup.identifier_column,
        lookup.observed_status,
        lookup.payload_column,
    );
    out.push_str(&table_text(&lookup.table));
    out
}

/// Machine-readable form of the same lookup.
pub fn lookup_json(lookup: &Lookup) -> Result<String> {
    serde_json::to_string_pretty(lookup).context("serialize lookup")
}

fn clip(cell: &str) -> String {
    if cell.chars().count() <= CELL_MAX_CHARS {
        return cell.to_string();
    }
    let mut clipped: String = cell.chars().take(CELL_MAX_CHARS - 1).collect();
    clipped.push('…');
    clipped
}

fn push_line<S: AsRef<str>>(out: &mut String, cells: &[S], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let cell = cell.as_ref();
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_text_aligns_columns() {
        let table = Table {
            columns: vec!["item".to_string(), "qty".to_string()],
            rows: vec![
                vec!["widget".to_string(), "2".to_string()],
                vec!["x".to_string(), "10".to_string()],
            ],
        };
        let text = table_text(&table);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "item    qty");
        assert_eq!(lines[1], "------  ---");
        assert_eq!(lines[2], "widget  2");
        assert_eq!(lines[3], "x       10");
    }

    #[test]
    fn test_empty_table_renders_placeholder() {
        let table = Table {
            columns: Vec::new(),
            rows: Vec::new(),
        };
        assert_eq!(table_text(&table), "(empty payload)\n");
    }

    #[test]
    fn test_long_cells_are_clipped() {
        let table = Table {
            columns: vec!["value".to_string()],
            rows: vec![vec!["x".repeat(200)]],
        };
        let text = table_text(&table);
        assert!(text.lines().nth(2).unwrap().chars().count() <= CELL_MAX_CHARS);
    }
}
