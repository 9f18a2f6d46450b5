//! End-to-end orchestration of one lookup-and-decision run.
//!
//! Each run walks the same strictly linear sequence: load the snapshot,
//! resolve the identifier column, locate the row, pass the status gate,
//! resolve and parse the payload column, then optionally collect and submit
//! a decision. Every transition failure maps to one terminal [`RunError`]
//! and halts the run; a fresh run starts from the beginning.
use crate::config::PipelineConfig;
use crate::decision::{self, Decision, LineDecision, LineOutcome, Outcome};
use crate::gate::{self, GateCheck};
use crate::locate::{self, Located};
use crate::payload::{self, Table};
use crate::row::{Row, Snapshot};
use crate::source::{CachedSource, CsvSource, TabularSource};
use crate::submit::{self, DecisionSink, RetryPolicy, SubmitOutcome};
use std::collections::BTreeMap;
use std::fmt;

/// Terminal stop conditions for one run. None of these is fatal to the
/// process; each ends the current run with a user-visible message.
#[derive(Debug)]
pub enum RunError {
    SourceUnreachable(anyhow::Error),
    NoIdentifierColumn { candidates: Vec<String> },
    NotFound { term: String },
    StatusFieldMissing { field: String },
    StatusMismatch { required: String, actual: String },
    NoPayloadColumn,
    PayloadUnparseable { column: String },
    InvalidTarget { field: String, raw: String },
    SinkUnreachable { attempts: u32, last_error: String },
    ValidationFailed { message: String },
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::SourceUnreachable(err) => {
                write!(f, "source unreachable: {err:#}")
            }
            RunError::NoIdentifierColumn { candidates } => write!(
                f,
                "none of the identifier columns ({}) exist in the source",
                candidates.join(", ")
            ),
            RunError::NotFound { term } => {
                write!(f, "no row matches identifier '{term}'")
            }
            RunError::StatusFieldMissing { field } => {
                write!(f, "status column '{field}' does not exist in the source")
            }
            RunError::StatusMismatch { required, actual } => write!(
                f,
                "row is not ready for a decision: status is '{actual}', needs '{required}'"
            ),
            RunError::NoPayloadColumn => {
                write!(f, "no column in the matched row contains a JSON payload")
            }
            RunError::PayloadUnparseable { column } => {
                write!(f, "payload in column '{column}' is not valid JSON")
            }
            RunError::InvalidTarget { field, raw } => write!(
                f,
                "column '{field}' does not hold a usable submission URL ('{raw}')"
            ),
            RunError::SinkUnreachable {
                attempts,
                last_error,
            } => write!(
                f,
                "decision sink unreachable after {attempts} attempt(s): {last_error}"
            ),
            RunError::ValidationFailed { message } => {
                write!(f, "decision incomplete: {message}")
            }
        }
    }
}

/// Result of a successful lookup run, through payload parsing.
#[derive(Debug, serde::Serialize)]
pub struct Lookup {
    pub identifier: String,
    pub identifier_column: String,
    pub observed_status: String,
    pub payload_column: String,
    pub table: Table,
}

/// Operator input for one decision run, before it is packaged for the wire.
#[derive(Debug)]
pub struct DecisionInput {
    pub outcome: Outcome,
    pub reason: String,
    pub line_items: Vec<LineItemInput>,
}

/// One per-line judgment as supplied by the operator, positional against the
/// rendered payload rows.
#[derive(Debug, serde::Deserialize)]
pub struct LineItemInput {
    pub outcome: LineOutcome,
    #[serde(default)]
    pub note: String,
}

/// Report of a completed decision run.
#[derive(Debug)]
pub struct SubmitReport {
    pub identifier: String,
    pub attempts: u32,
}

struct Gated<'a> {
    row: &'a Row,
    identifier_column: &'a str,
    identifier: String,
    observed_status: String,
}

/// Composes source, locator, gate, extractor, and submitter for one
/// configuration.
pub struct Pipeline<S: TabularSource> {
    config: PipelineConfig,
    source: CachedSource<S>,
}

impl Pipeline<CsvSource> {
    pub fn from_config(config: PipelineConfig) -> Pipeline<CsvSource> {
        let source = CachedSource::new(
            CsvSource::new(config.source_path.clone()),
            config.cache_ttl(),
        );
        Pipeline { config, source }
    }
}

impl<S: TabularSource> Pipeline<S> {
    pub fn new(config: PipelineConfig, source: CachedSource<S>) -> Pipeline<S> {
        Pipeline { config, source }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run through payload parsing and return the rendered lookup.
    pub fn lookup(&self, term: &str) -> Result<Lookup, RunError> {
        let snapshot = self.load_snapshot()?;
        let gated = self.locate_gated(&snapshot, term)?;
        let (payload_column, table) = self.extract_payload(gated.row)?;
        Ok(Lookup {
            identifier: gated.identifier,
            identifier_column: gated.identifier_column.to_string(),
            observed_status: gated.observed_status,
            payload_column,
            table,
        })
    }

    /// Full run: locate, gate, extract, package the operator's decision,
    /// validate it, and deliver it to the row's submission target.
    pub fn decide(
        &self,
        term: &str,
        input: DecisionInput,
        sink: &mut dyn DecisionSink,
    ) -> Result<SubmitReport, RunError> {
        let snapshot = self.load_snapshot()?;
        let gated = self.locate_gated(&snapshot, term)?;
        let (_, table) = self.extract_payload(gated.row)?;

        let decision = build_decision(&gated, &table, input)?;
        if let Err(message) = decision::validate(&decision) {
            return Err(RunError::ValidationFailed { message });
        }

        let target_field = &self.config.target_field;
        let raw_target = gated
            .row
            .get(target_field)
            .map(|value| value.as_text())
            .unwrap_or_default();

        let policy = RetryPolicy {
            max_attempts: self.config.max_attempts,
            base_delay: self.config.base_delay(),
        };
        match submit::submit(sink, &raw_target, &decision, &policy) {
            SubmitOutcome::Delivered { attempts } => Ok(SubmitReport {
                identifier: decision.identifier,
                attempts,
            }),
            SubmitOutcome::InvalidTarget => Err(RunError::InvalidTarget {
                field: target_field.clone(),
                raw: raw_target,
            }),
            SubmitOutcome::Unreachable {
                attempts,
                last_error,
            } => Err(RunError::SinkUnreachable {
                attempts,
                last_error,
            }),
        }
    }

    fn load_snapshot(&self) -> Result<std::sync::Arc<Snapshot>, RunError> {
        self.source.load().map_err(RunError::SourceUnreachable)
    }

    fn locate_gated<'a>(
        &self,
        snapshot: &'a Snapshot,
        term: &str,
    ) -> Result<Gated<'a>, RunError> {
        let (row, identifier_column) =
            match locate::locate_row(snapshot, &self.config.identifier_fields, term) {
                Located::Match {
                    row,
                    identifier_column,
                } => (row, identifier_column),
                Located::NoIdentifierColumn => {
                    return Err(RunError::NoIdentifierColumn {
                        candidates: self.config.identifier_fields.clone(),
                    })
                }
                Located::NotFound => {
                    return Err(RunError::NotFound {
                        term: term.trim().to_string(),
                    })
                }
            };

        let observed_status =
            match gate::check(row, &self.config.status_field, &self.config.required_status) {
                GateCheck::Ok => self.config.required_status.clone(),
                GateCheck::FieldMissing => {
                    return Err(RunError::StatusFieldMissing {
                        field: self.config.status_field.clone(),
                    })
                }
                GateCheck::Mismatch { actual } => {
                    return Err(RunError::StatusMismatch {
                        required: self.config.required_status.clone(),
                        actual,
                    })
                }
            };

        let identifier = row
            .get(identifier_column)
            .map(|value| value.as_text().trim().to_string())
            .unwrap_or_default();

        tracing::debug!(
            identifier = %identifier,
            column = identifier_column,
            "row located and gate passed"
        );
        Ok(Gated {
            row,
            identifier_column,
            identifier,
            observed_status,
        })
    }

    fn extract_payload(&self, row: &Row) -> Result<(String, Table), RunError> {
        let column = match &self.config.payload_field {
            Some(field) if row.get(field).is_some() => field.as_str(),
            Some(_) => return Err(RunError::NoPayloadColumn),
            None => payload::detect_column(row).ok_or(RunError::NoPayloadColumn)?,
        };
        let raw = row
            .get(column)
            .map(|value| value.as_text())
            .unwrap_or_default();
        let table = payload::parse(&raw).ok_or_else(|| RunError::PayloadUnparseable {
            column: column.to_string(),
        })?;
        Ok((column.to_string(), table))
    }
}

/// Package the operator input as the wire decision, pairing each line item
/// with the payload row it was shown against.
fn build_decision(
    gated: &Gated<'_>,
    table: &Table,
    input: DecisionInput,
) -> Result<Decision, RunError> {
    let line_items = if input.line_items.is_empty() {
        Vec::new()
    } else {
        if input.line_items.len() != table.rows.len() {
            return Err(RunError::ValidationFailed {
                message: format!(
                    "{} line judgment(s) supplied for {} payload row(s)",
                    input.line_items.len(),
                    table.rows.len()
                ),
            });
        }
        input
            .line_items
            .into_iter()
            .zip(&table.rows)
            .map(|(item, cells)| {
                let original_fields: BTreeMap<String, String> = table
                    .columns
                    .iter()
                    .cloned()
                    .zip(cells.iter().cloned())
                    .collect();
                LineDecision {
                    outcome: item.outcome,
                    note: item.note,
                    original_fields,
                }
            })
            .collect()
    };

    Ok(Decision {
        identifier: gated.identifier.clone(),
        outcome: input.outcome,
        reason: input.reason,
        observed_status: gated.observed_status.clone(),
        line_items,
    })
}
