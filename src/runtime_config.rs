// =============================================================================
// Runtime Configuration: hot-reloadable settings with atomic save
// =============================================================================
//
// Central configuration hub for the TickerScope backend.  Persistence uses
// an atomic tmp + rename pattern to prevent corruption on crash, and every
// field carries `#[serde(default)]` so that adding new fields never breaks
// loading an older config file.
//
// Indicator windows (SMA20 / SMA50 / RSI14) are deliberately absent: they
// are fixed by the product definition and live as constants in `analyzer`.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_provider_base_url() -> String {
    "https://query1.finance.yahoo.com".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff_secs() -> u64 {
    2
}

fn default_requests_per_minute() -> u32 {
    60
}

fn default_cache_capacity() -> usize {
    32
}

fn default_recent_limit() -> usize {
    50
}

fn default_lookback_days() -> i64 {
    365
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level runtime configuration for the TickerScope backend.
///
/// Every field has a serde default so that older JSON files missing new
/// fields will still deserialise correctly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    // --- Ingestion adapter ---------------------------------------------------

    /// Base URL of the daily-bar chart endpoint (no trailing slash).
    #[serde(default = "default_provider_base_url")]
    pub provider_base_url: String,

    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// How many times a failed fetch is retried before giving up.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Fixed delay between retries, in seconds.
    #[serde(default = "default_retry_backoff_secs")]
    pub retry_backoff_secs: u64,

    /// Upstream request budget per minute (see `RequestPacer`).
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,

    // --- Caching & history ---------------------------------------------------

    /// Maximum number of fetched series kept in the in-process cache.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Maximum number of entries in the recent-analyses ring.
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,

    // --- Request defaults ----------------------------------------------------

    /// Date range used when a request omits start/end: this many days back
    /// from today.
    #[serde(default = "default_lookback_days")]
    pub default_lookback_days: i64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            provider_base_url: default_provider_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
            retry_backoff_secs: default_retry_backoff_secs(),
            requests_per_minute: default_requests_per_minute(),
            cache_capacity: default_cache_capacity(),
            recent_limit: default_recent_limit(),
            default_lookback_days: default_lookback_days(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            provider = %config.provider_base_url,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }
}
