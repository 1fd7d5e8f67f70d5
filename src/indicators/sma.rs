// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
// The arithmetic mean of closing prices over a fixed trailing window.  The
// output series is date-aligned with the input: one point per bar, with
// `None` wherever fewer than `window` bars of history exist.  A short series
// is not an error for the SMA; it simply yields an all-undefined series.
//
// The window sum rolls forward (add incoming close, subtract outgoing) so
// the whole series is produced in a single linear pass.

use crate::errors::AnalysisError;
use crate::types::{IndicatorPoint, IndicatorSeries, PriceSeries};

/// Compute the SMA of the closing prices over `window` bars.
///
/// The value at index `i` is the mean of closes over `[i - window + 1, i]`
/// when `i >= window - 1`, and `None` before the window fills.  Undefined
/// points are never zero-filled or interpolated.
///
/// # Errors
/// - `InvalidPeriod` when `window == 0`.
/// - `InvalidSeries` when the series is empty, dates are not strictly
///   increasing, or a close is non-positive/non-finite.
pub fn compute_sma(series: &PriceSeries, window: usize) -> Result<IndicatorSeries, AnalysisError> {
    if window == 0 {
        return Err(AnalysisError::invalid_period("SMA", window));
    }
    series.validate()?;

    let divisor = window as f64;
    let mut sum = 0.0;
    let mut points = Vec::with_capacity(series.len());

    for (i, point) in series.points().iter().enumerate() {
        sum += point.close;
        if i >= window {
            sum -= series.points()[i - window].close;
        }

        let value = if i + 1 >= window {
            Some(sum / divisor)
        } else {
            None
        };

        points.push(IndicatorPoint {
            date: point.date,
            value,
        });
    }

    Ok(IndicatorSeries::new(format!("SMA{window}"), points))
}
