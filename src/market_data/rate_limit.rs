// =============================================================================
// Request Pacer: caps upstream requests per minute
// =============================================================================
//
// The chart endpoint throttles aggressive clients, so the provider asks the
// pacer for permission before every attempt. The pacer keeps two atomic
// counters (current minute window, requests inside it) that any task may
// consult lock-free; when the window rolls over the count resets.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tracing::warn;

/// Fraction of the cap at which a warning is logged.
const WARN_RATIO: f64 = 0.8;

/// Lock-free per-minute request budget.
pub struct RequestPacer {
    /// Minute index (unix seconds / 60) the count belongs to.
    window: AtomicU64,
    /// Requests granted inside the current window.
    count: AtomicU32,
    /// Hard per-minute ceiling.
    cap: u32,
}

/// Immutable snapshot of the pacer state, suitable for a dashboard payload.
#[derive(Debug, Clone, Serialize)]
pub struct RequestPacerSnapshot {
    pub window_requests: u32,
    pub cap: u32,
}

impl RequestPacer {
    pub fn new(cap: u32) -> Self {
        Self {
            window: AtomicU64::new(0),
            count: AtomicU32::new(0),
            cap,
        }
    }

    /// Ask for permission to send one request now. Returns `false` when the
    /// current minute's budget is exhausted.
    pub fn try_acquire(&self) -> bool {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before UNIX epoch")
            .as_secs();
        self.acquire_at(now)
    }

    /// Clock-injected body of `try_acquire`, split out for testability.
    pub(crate) fn acquire_at(&self, now_secs: u64) -> bool {
        let window = now_secs / 60;
        let previous = self.window.swap(window, Ordering::AcqRel);
        if previous != window {
            self.count.store(0, Ordering::Release);
        }

        let used = self.count.fetch_add(1, Ordering::AcqRel);
        if used >= self.cap {
            warn!(cap = self.cap, "upstream request budget exhausted for this minute");
            return false;
        }

        let warn_at = (self.cap as f64 * WARN_RATIO) as u32;
        if used + 1 == warn_at {
            warn!(
                used = used + 1,
                cap = self.cap,
                "upstream request budget nearly exhausted"
            );
        }

        true
    }

    pub fn snapshot(&self) -> RequestPacerSnapshot {
        RequestPacerSnapshot {
            window_requests: self.count.load(Ordering::Acquire).min(self.cap),
            cap: self.cap,
        }
    }
}
