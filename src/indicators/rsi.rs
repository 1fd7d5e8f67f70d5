// =============================================================================
// Relative Strength Index (RSI) with Wilder's Smoothing
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether an asset is overbought or oversold.
//
// Step 1: Compute price changes (deltas) from consecutive closes.
// Step 2: Seed average gain / average loss with the simple mean of the first
//         `period` gains / losses; the first defined value lands at index
//         `period`.
// Step 3: Apply Wilder's exponential smoothing:
//           avg_gain = (prev_avg_gain * (period - 1) + current_gain) / period
//           avg_loss = (prev_avg_loss * (period - 1) + current_loss) / period
// Step 4: RS  = avg_gain / avg_loss
//         RSI = 100 - 100 / (1 + RS), clamped to 100 when avg_loss is zero.
//
// The output series is date-aligned with the input: indices before `period`
// carry `None`, and a series too short to seed the averages yields an
// all-undefined series rather than an error.

use crate::errors::AnalysisError;
use crate::types::{IndicatorPoint, IndicatorSeries, PriceSeries};

/// Compute the RSI of the closing prices over `period` bars.
///
/// # Errors
/// - `InvalidPeriod` when `period == 0`.
/// - `InvalidSeries` when the series is malformed (see
///   `PriceSeries::validate`).
/// - `InsufficientData` when fewer than 2 bars exist, since not a single
///   price change can be computed.
pub fn compute_rsi(series: &PriceSeries, period: usize) -> Result<IndicatorSeries, AnalysisError> {
    if period == 0 {
        return Err(AnalysisError::invalid_period("RSI", period));
    }
    series.validate()?;

    if series.len() < 2 {
        return Err(AnalysisError::insufficient(format!(
            "RSI needs at least 2 bars to compute a price change, got {}",
            series.len()
        )));
    }

    let closes = series.closes();
    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    let mut points: Vec<IndicatorPoint> = series
        .points()
        .iter()
        .map(|p| IndicatorPoint {
            date: p.date,
            value: None,
        })
        .collect();

    // Not enough deltas to seed the averages: every point stays undefined.
    if deltas.len() < period {
        return Ok(IndicatorSeries::new(format!("RSI{period}"), points));
    }

    // Seed with the simple mean of the first `period` gains / losses.
    let (sum_gain, sum_loss) = deltas[..period]
        .iter()
        .fold((0.0_f64, 0.0_f64), |(g, l), &d| {
            if d > 0.0 {
                (g + d, l)
            } else {
                (g, l + d.abs())
            }
        });

    let period_f = period as f64;
    let mut avg_gain = sum_gain / period_f;
    let mut avg_loss = sum_loss / period_f;

    points[period].value = Some(rsi_from_averages(avg_gain, avg_loss));

    // Wilder's smoothing for the remaining bars. Delta `i` feeds the point
    // at index `i + 1`.
    for (i, &delta) in deltas.iter().enumerate().skip(period) {
        let gain = if delta > 0.0 { delta } else { 0.0 };
        let loss = if delta < 0.0 { delta.abs() } else { 0.0 };

        avg_gain = (avg_gain * (period_f - 1.0) + gain) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + loss) / period_f;

        points[i + 1].value = Some(rsi_from_averages(avg_gain, avg_loss));
    }

    Ok(IndicatorSeries::new(format!("RSI{period}"), points))
}

/// Convert average gain / average loss into an RSI value in [0, 100].
///
/// When no losses were recorded the index pegs at 100, including the
/// flat-series case where no gains were recorded either.
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    }
}
