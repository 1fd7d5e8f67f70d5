pub mod cache;
pub mod provider;
pub mod rate_limit;

// Re-export the pieces the rest of the crate touches directly.
pub use cache::{SeriesCache, SeriesKey};
pub use provider::{DailyBarProvider, ProviderError};
