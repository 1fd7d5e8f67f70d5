// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators the analyzer
// derives from a price series.  Every function takes the full series and
// returns a date-aligned `IndicatorSeries` (one point per bar, `None` until
// the window fills), so callers never have to re-align output to input.

pub mod rsi;
pub mod sma;

pub use rsi::compute_rsi;
pub use sma::compute_sma;
