// =============================================================================
// Series Cache: ephemeral store of fetched price series
// =============================================================================
//
// Re-analyzing the same ticker and range is common while a user tweaks the
// dashboard, so fetched series are kept in a small in-process map keyed by
// (ticker, start, end).  Eviction is FIFO at a fixed capacity.  The cache
// lives and dies with the process; nothing is ever written to disk.

use std::collections::{HashMap, VecDeque};

use chrono::NaiveDate;
use parking_lot::RwLock;
use tracing::debug;

use crate::types::PriceSeries;

/// Composite key that identifies one fetched series.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct SeriesKey {
    pub ticker: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl std::fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}..{}", self.ticker, self.start, self.end)
    }
}

struct Inner {
    map: HashMap<SeriesKey, PriceSeries>,
    order: VecDeque<SeriesKey>,
}

/// Thread-safe FIFO-evicting cache of price series.
pub struct SeriesCache {
    inner: RwLock<Inner>,
    capacity: usize,
}

impl SeriesCache {
    /// Create a cache retaining at most `capacity` series.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Inner {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity,
        }
    }

    pub fn get(&self, key: &SeriesKey) -> Option<PriceSeries> {
        let inner = self.inner.read();
        let hit = inner.map.get(key).cloned();
        if hit.is_some() {
            debug!(key = %key, "series cache hit");
        }
        hit
    }

    /// Store a fetched series. Replacing an existing key keeps its original
    /// eviction slot; new keys evict the oldest entry once the cache is
    /// full.
    pub fn insert(&self, key: SeriesKey, series: PriceSeries) {
        if self.capacity == 0 {
            return;
        }

        let mut inner = self.inner.write();
        if inner.map.insert(key.clone(), series).is_none() {
            inner.order.push_back(key);
            while inner.order.len() > self.capacity {
                if let Some(oldest) = inner.order.pop_front() {
                    debug!(key = %oldest, "series cache evicting oldest entry");
                    inner.map.remove(&oldest);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
