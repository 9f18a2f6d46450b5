//! Pipeline configuration.
//!
//! Everything the core needs from its environment lives in one JSON file:
//! which columns identify a row, which column gates processing, where the
//! decision goes, and the cache/retry knobs.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Configuration for one pipeline instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// CSV file supplying the tabular snapshot.
    pub source_path: String,

    /// Candidate identifier column names, in priority order. The first one
    /// present in the schema is used for lookups.
    #[serde(default = "default_identifier_fields")]
    pub identifier_fields: Vec<String>,

    /// Column holding the row's processing status.
    #[serde(default = "default_status_field")]
    pub status_field: String,

    /// Status value a row must carry before a decision may be collected.
    #[serde(default = "default_required_status")]
    pub required_status: String,

    /// Column holding the decision sink URL for the row.
    #[serde(default = "default_target_field")]
    pub target_field: String,

    /// Payload column override. When unset the first JSON-looking column in
    /// schema order is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_field: Option<String>,

    /// Seconds a loaded snapshot stays valid before it is reloaded.
    #[serde(default = "default_cache_ttl_seconds")]
    pub cache_ttl_seconds: u64,

    /// Delivery attempts before the sink is reported unreachable.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base retry delay in milliseconds; attempt N waits N times this.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Timeout for one submission request, in seconds.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

fn default_identifier_fields() -> Vec<String> {
    vec![
        "request_id".to_string(),
        "Request ID".to_string(),
        "id".to_string(),
    ]
}

fn default_status_field() -> String {
    "status".to_string()
}

fn default_required_status() -> String {
    "pending".to_string()
}

fn default_target_field() -> String {
    "callback_url".to_string()
}

fn default_cache_ttl_seconds() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_request_timeout_seconds() -> u64 {
    10
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<PipelineConfig> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config: {}", path.display()))?;
        let config: PipelineConfig = serde_json::from_str(&raw)
            .with_context(|| format!("parse config: {}", path.display()))?;
        Ok(config)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}
