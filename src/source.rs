//! Tabular source loading and snapshot caching.
//!
//! The source is the single point of truth and is mutated externally; this
//! module only reads it. Snapshots are immutable once produced and are
//! memoized for a TTL window so repeated lookups within the window do not
//! re-read the collaborator.
use crate::row::{FieldValue, Row, Snapshot};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Supplies rows of named fields. Implementations own no mutation capability.
pub trait TabularSource {
    /// A full fresh snapshot, or a distinct error when the source is
    /// unreachable. Never a silently partial result.
    fn load(&self) -> Result<Snapshot>;

    /// Stable identity of the underlying source, for logs and cache keying.
    fn identity(&self) -> String;
}

/// CSV-backed source: the first record is the header, each later record is
/// one row. Cell values are inferred into typed fields.
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> CsvSource {
        CsvSource { path: path.into() }
    }
}

impl TabularSource for CsvSource {
    fn load(&self) -> Result<Snapshot> {
        let mut reader = csv::Reader::from_path(&self.path)
            .with_context(|| format!("open source: {}", self.path.display()))?;
        let columns: Vec<String> = reader
            .headers()
            .with_context(|| format!("read source header: {}", self.path.display()))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record
                .with_context(|| format!("read source row: {}", self.path.display()))?;
            let fields = columns
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    let raw = record.get(i).unwrap_or("");
                    (name.clone(), FieldValue::infer(raw))
                })
                .collect();
            rows.push(Row::new(fields));
        }

        tracing::debug!(
            source = %self.identity(),
            columns = columns.len(),
            rows = rows.len(),
            "source snapshot loaded"
        );
        Ok(Snapshot { columns, rows })
    }

    fn identity(&self) -> String {
        self.path.display().to_string()
    }
}

struct CachedSnapshot {
    taken_at: Instant,
    snapshot: Arc<Snapshot>,
}

/// TTL memoization around a [`TabularSource`].
///
/// The mutex is held across the reload path, so concurrent callers arriving
/// past expiry serialize on one reload instead of each re-reading the source.
/// A valid cached snapshot is shared out as an `Arc` and never mutated.
pub struct CachedSource<S: TabularSource> {
    inner: S,
    ttl: Duration,
    state: Mutex<Option<CachedSnapshot>>,
}

impl<S: TabularSource> CachedSource<S> {
    pub fn new(inner: S, ttl: Duration) -> CachedSource<S> {
        CachedSource {
            inner,
            ttl,
            state: Mutex::new(None),
        }
    }

    pub fn identity(&self) -> String {
        self.inner.identity()
    }

    /// The cached snapshot if still within TTL, otherwise a fresh load.
    /// A failed reload leaves no cache entry behind; the next call retries.
    pub fn load(&self) -> Result<Arc<Snapshot>> {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(cached) = state.as_ref() {
            if cached.taken_at.elapsed() < self.ttl {
                tracing::debug!(source = %self.inner.identity(), "snapshot cache hit");
                return Ok(Arc::clone(&cached.snapshot));
            }
            tracing::debug!(source = %self.inner.identity(), "snapshot cache stale");
        }

        *state = None;
        let snapshot = Arc::new(self.inner.load()?);
        *state = Some(CachedSnapshot {
            taken_at: Instant::now(),
            snapshot: Arc::clone(&snapshot),
        });
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        loads: AtomicUsize,
    }

    impl TabularSource for CountingSource {
        fn load(&self) -> Result<Snapshot> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(Snapshot {
                columns: vec!["id".to_string()],
                rows: vec![Row::new(vec![(
                    "id".to_string(),
                    FieldValue::Str("r1".to_string()),
                )])],
            })
        }

        fn identity(&self) -> String {
            "counting".to_string()
        }
    }

    #[test]
    fn test_cached_source_memoizes_within_ttl() {
        let source = CachedSource::new(
            CountingSource {
                loads: AtomicUsize::new(0),
            },
            Duration::from_secs(3600),
        );
        let first = source.load().unwrap();
        let second = source.load().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.inner.loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cached_source_reloads_past_ttl() {
        let source = CachedSource::new(
            CountingSource {
                loads: AtomicUsize::new(0),
            },
            Duration::ZERO,
        );
        source.load().unwrap();
        source.load().unwrap();
        assert_eq!(source.inner.loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_csv_source_infers_cell_types() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "request_id,amount,approved,note").unwrap();
        writeln!(file, "AB-12,40,true,").unwrap();
        file.flush().unwrap();

        let snapshot = CsvSource::new(file.path()).load().unwrap();
        assert_eq!(snapshot.columns, vec!["request_id", "amount", "approved", "note"]);
        let row = &snapshot.rows[0];
        assert_eq!(row.get("request_id"), Some(&FieldValue::Str("AB-12".to_string())));
        assert_eq!(row.get("amount"), Some(&FieldValue::Int(40)));
        assert_eq!(row.get("approved"), Some(&FieldValue::Bool(true)));
        assert_eq!(row.get("note"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_csv_source_missing_file_is_an_error() {
        let result = CsvSource::new("/nonexistent/requests.csv").load();
        assert!(result.is_err());
    }
}
