//! Row lookup by identifier.
//!
//! The identifier column is the first candidate name present in the schema.
//! Matching is trim + case-fold on both sides; the source is assumed to hold
//! at most one logical match per identifier, and the locator does not enforce
//! uniqueness. On duplicates the first row in source order wins.
use crate::row::{Row, Snapshot};

/// Result of a row lookup.
#[derive(Debug)]
pub enum Located<'a> {
    Match {
        row: &'a Row,
        identifier_column: &'a str,
    },
    NotFound,
    NoIdentifierColumn,
}

/// Normalized form used on both the stored identifier and the search term.
/// Applying it to only one side would make lookups silently diverge.
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// First candidate column name present in the snapshot schema.
pub fn resolve_identifier_column<'a>(
    snapshot: &'a Snapshot,
    candidates: &[String],
) -> Option<&'a str> {
    candidates
        .iter()
        .find_map(|candidate| {
            snapshot
                .columns
                .iter()
                .find(|column| *column == candidate)
        })
        .map(String::as_str)
}

/// Scan all rows for the first whose normalized identifier equals the
/// normalized search term.
pub fn locate_row<'a>(
    snapshot: &'a Snapshot,
    candidates: &[String],
    search_term: &str,
) -> Located<'a> {
    let Some(identifier_column) = resolve_identifier_column(snapshot, candidates) else {
        return Located::NoIdentifierColumn;
    };

    let needle = normalize_key(search_term);
    for row in &snapshot.rows {
        let stored = row
            .get(identifier_column)
            .map(|value| normalize_key(&value.as_text()))
            .unwrap_or_default();
        if !stored.is_empty() && stored == needle {
            return Located::Match {
                row,
                identifier_column,
            };
        }
    }
    Located::NotFound
}
