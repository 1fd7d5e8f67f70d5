// =============================================================================
// Central Application State: TickerScope backend
// =============================================================================
//
// One `Arc<AppState>` is shared by every request handler.  It owns the
// runtime configuration, the ingestion adapter, the series cache and the
// recent-analyses ring.  A monotonically increasing state version lets
// dashboard clients cheaply detect that something changed.
//
// All locks are `parking_lot` and are held only for short, synchronous
// critical sections; nothing holds a lock across an await point.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::RwLock;

use crate::analyzer::AnalysisSummary;
use crate::market_data::{DailyBarProvider, SeriesCache};
use crate::runtime_config::RuntimeConfig;

pub struct AppState {
    pub runtime_config: RwLock<RuntimeConfig>,
    pub provider: DailyBarProvider,
    pub series_cache: SeriesCache,
    pub recent_analyses: RwLock<VecDeque<AnalysisSummary>>,
    state_version: AtomicU64,
}

impl AppState {
    /// Build the full application state from a loaded configuration.  The
    /// provider and cache take their tuning from the config at startup.
    pub fn new(config: RuntimeConfig) -> Self {
        let provider = DailyBarProvider::new(
            config.provider_base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
            config.max_retries,
            Duration::from_secs(config.retry_backoff_secs),
            config.requests_per_minute,
        );
        let series_cache = SeriesCache::new(config.cache_capacity);

        Self {
            runtime_config: RwLock::new(config),
            provider,
            series_cache,
            recent_analyses: RwLock::new(VecDeque::new()),
            state_version: AtomicU64::new(0),
        }
    }

    /// Record a completed analysis in the recent ring, trimming the oldest
    /// entries past the configured limit, and bump the state version.
    pub fn push_summary(&self, summary: AnalysisSummary) {
        let limit = self.runtime_config.read().recent_limit;
        {
            let mut ring = self.recent_analyses.write();
            ring.push_back(summary);
            while ring.len() > limit {
                ring.pop_front();
            }
        }
        self.increment_version();
    }

    /// Recent analyses, oldest first.
    pub fn recent(&self) -> Vec<AnalysisSummary> {
        self.recent_analyses.read().iter().cloned().collect()
    }

    pub fn increment_version(&self) {
        self.state_version.fetch_add(1, Ordering::Relaxed);
    }

    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::Relaxed)
    }
}
