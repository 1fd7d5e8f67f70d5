// =============================================================================
// Insight Generation
// =============================================================================
//
// Turns the indicator series into a small set of qualitative observations
// about the latest bar:
//   - RSI14 > 70  => Overbought,  RSI14 < 30 => Oversold
//   - SMA20 crossing above SMA50 between the last two bars => BullishCrossover
//   - SMA20 crossing below SMA50 between the last two bars => BearishCrossover
//   - neither => a single Neutral observation
//
// At most one RSI insight and one crossover insight are emitted, RSI first;
// both are reported when both apply.  All required indicator values must be
// defined at the evaluation bar (and, for the crossover, at the bar before
// it): the generator fails rather than guessing from partial history.

use tracing::debug;

use crate::errors::AnalysisError;
use crate::types::{IndicatorSeries, Insight, InsightKind, PriceSeries, TrendAssessment};

/// RSI level above which the latest bar reads as overbought.
pub const RSI_OVERBOUGHT: f64 = 70.0;
/// RSI level below which the latest bar reads as oversold.
pub const RSI_OVERSOLD: f64 = 30.0;

/// Evaluate the insight rules at the most recent bar.
///
/// `sma20`, `sma50` and `rsi14` must each be date-aligned with `series`
/// (`Alignment` otherwise).  Fails with `InsufficientData` when any value
/// the rules read is still undefined, which in practice means the series
/// carries fewer than 51 bars.
pub fn generate_insights(
    series: &PriceSeries,
    sma20: &IndicatorSeries,
    sma50: &IndicatorSeries,
    rsi14: &IndicatorSeries,
) -> Result<Vec<Insight>, AnalysisError> {
    sma20.ensure_aligned(series)?;
    sma50.ensure_aligned(series)?;
    rsi14.ensure_aligned(series)?;

    let n = series.len();
    if n < 2 {
        return Err(AnalysisError::insufficient(
            "insight evaluation needs at least 2 bars",
        ));
    }

    let as_of = series.points()[n - 1].date;

    let rsi = required(rsi14, n - 1, "latest")?;
    let short_now = required(sma20, n - 1, "latest")?;
    let long_now = required(sma50, n - 1, "latest")?;
    let short_prev = required(sma20, n - 2, "previous")?;
    let long_prev = required(sma50, n - 2, "previous")?;

    let mut insights = Vec::with_capacity(2);

    // RSI threshold rule.
    if rsi > RSI_OVERBOUGHT {
        insights.push(Insight {
            kind: InsightKind::Overbought,
            as_of,
            detail: format!("RSI14 at {rsi:.1} indicates the stock may be overbought"),
        });
    } else if rsi < RSI_OVERSOLD {
        insights.push(Insight {
            kind: InsightKind::Oversold,
            as_of,
            detail: format!("RSI14 at {rsi:.1} indicates the stock may be oversold"),
        });
    }

    // Crossover rule: state change between the previous bar and this one.
    if short_prev <= long_prev && short_now > long_now {
        insights.push(Insight {
            kind: InsightKind::BullishCrossover,
            as_of,
            detail: format!(
                "SMA20 ({short_now:.2}) crossed above SMA50 ({long_now:.2})"
            ),
        });
    } else if short_prev >= long_prev && short_now < long_now {
        insights.push(Insight {
            kind: InsightKind::BearishCrossover,
            as_of,
            detail: format!(
                "SMA20 ({short_now:.2}) crossed below SMA50 ({long_now:.2})"
            ),
        });
    }

    if insights.is_empty() {
        insights.push(Insight {
            kind: InsightKind::Neutral,
            as_of,
            detail: format!(
                "RSI14 at {rsi:.1} is neutral and no moving-average crossover occurred"
            ),
        });
    }

    debug!(
        as_of = %as_of,
        rsi = rsi,
        sma20 = short_now,
        sma50 = long_now,
        count = insights.len(),
        "insights evaluated"
    );

    Ok(insights)
}

/// Classify the latest bar's position relative to the two moving averages,
/// the way the dashboard summarises trend:
///   close > SMA20 > SMA50 => Uptrend
///   close < SMA20 < SMA50 => Downtrend
///   anything else         => Mixed
pub fn assess_trend(
    series: &PriceSeries,
    sma20: &IndicatorSeries,
    sma50: &IndicatorSeries,
) -> Result<TrendAssessment, AnalysisError> {
    sma20.ensure_aligned(series)?;
    sma50.ensure_aligned(series)?;

    let n = series.len();
    if n == 0 {
        return Err(AnalysisError::insufficient(
            "trend assessment needs at least 1 bar",
        ));
    }

    let close = series.points()[n - 1].close;
    let short = required(sma20, n - 1, "latest")?;
    let long = required(sma50, n - 1, "latest")?;

    let trend = if close > short && short > long {
        TrendAssessment::Uptrend
    } else if close < short && short < long {
        TrendAssessment::Downtrend
    } else {
        TrendAssessment::Mixed
    };

    Ok(trend)
}

/// Read a defined value at `index` or fail with a message naming which bar
/// was still undefined.
fn required(
    indicator: &IndicatorSeries,
    index: usize,
    which: &str,
) -> Result<f64, AnalysisError> {
    indicator.value_at(index).ok_or_else(|| {
        AnalysisError::insufficient(format!(
            "{} is undefined at the {which} bar (insufficient history)",
            indicator.label
        ))
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IndicatorPoint, PricePoint};
    use chrono::{Duration, NaiveDate};

    fn series_from_closes(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                date: start + Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 0.0,
            })
            .collect();
        PriceSeries::new(points)
    }

    fn indicator(series: &PriceSeries, label: &str, values: &[Option<f64>]) -> IndicatorSeries {
        assert_eq!(values.len(), series.len());
        let points = series
            .points()
            .iter()
            .zip(values)
            .map(|(p, &value)| IndicatorPoint {
                date: p.date,
                value,
            })
            .collect();
        IndicatorSeries::new(label, points)
    }

    fn kinds(insights: &[Insight]) -> Vec<InsightKind> {
        insights.iter().map(|i| i.kind).collect()
    }

    // ---- RSI threshold rule ----------------------------------------------

    #[test]
    fn overbought_rsi_emits_single_overbought() {
        let series = series_from_closes(&[100.0, 101.0, 102.0]);
        let sma20 = indicator(&series, "SMA20", &[None, Some(10.0), Some(10.0)]);
        let sma50 = indicator(&series, "SMA50", &[None, Some(11.0), Some(11.0)]);
        let rsi14 = indicator(&series, "RSI14", &[None, Some(70.0), Some(82.4)]);

        let insights = generate_insights(&series, &sma20, &sma50, &rsi14).unwrap();
        assert_eq!(kinds(&insights), vec![InsightKind::Overbought]);
        assert_eq!(insights[0].as_of, series.last().unwrap().date);
        assert!(insights[0].detail.contains("82.4"));
    }

    #[test]
    fn oversold_rsi_emits_single_oversold() {
        let series = series_from_closes(&[100.0, 99.0, 98.0]);
        let sma20 = indicator(&series, "SMA20", &[None, Some(11.0), Some(11.0)]);
        let sma50 = indicator(&series, "SMA50", &[None, Some(10.0), Some(10.0)]);
        let rsi14 = indicator(&series, "RSI14", &[None, Some(35.0), Some(22.0)]);

        let insights = generate_insights(&series, &sma20, &sma50, &rsi14).unwrap();
        assert_eq!(kinds(&insights), vec![InsightKind::Oversold]);
    }

    #[test]
    fn rsi_exactly_at_threshold_is_not_flagged() {
        let series = series_from_closes(&[100.0, 101.0]);
        let sma20 = indicator(&series, "SMA20", &[Some(10.0), Some(10.0)]);
        let sma50 = indicator(&series, "SMA50", &[Some(11.0), Some(11.0)]);
        let rsi14 = indicator(&series, "RSI14", &[Some(50.0), Some(70.0)]);

        let insights = generate_insights(&series, &sma20, &sma50, &rsi14).unwrap();
        assert_eq!(kinds(&insights), vec![InsightKind::Neutral]);
    }

    // ---- Crossover rule --------------------------------------------------

    #[test]
    fn bullish_crossover_emitted_exactly_once() {
        // Below at N-1, above at N.
        let series = series_from_closes(&[100.0, 101.0, 102.0]);
        let sma20 = indicator(&series, "SMA20", &[None, Some(9.8), Some(11.2)]);
        let sma50 = indicator(&series, "SMA50", &[None, Some(10.0), Some(10.1)]);
        let rsi14 = indicator(&series, "RSI14", &[None, Some(55.0), Some(60.0)]);

        let insights = generate_insights(&series, &sma20, &sma50, &rsi14).unwrap();
        assert_eq!(kinds(&insights), vec![InsightKind::BullishCrossover]);
    }

    #[test]
    fn bearish_crossover_emitted_when_short_drops_below_long() {
        let series = series_from_closes(&[100.0, 99.0, 98.0]);
        let sma20 = indicator(&series, "SMA20", &[None, Some(10.2), Some(9.7)]);
        let sma50 = indicator(&series, "SMA50", &[None, Some(10.0), Some(9.9)]);
        let rsi14 = indicator(&series, "RSI14", &[None, Some(45.0), Some(40.0)]);

        let insights = generate_insights(&series, &sma20, &sma50, &rsi14).unwrap();
        assert_eq!(kinds(&insights), vec![InsightKind::BearishCrossover]);
    }

    #[test]
    fn touch_then_break_above_counts_as_crossover() {
        // Equal at N-1 ("was <= before"), strictly above at N.
        let series = series_from_closes(&[100.0, 100.5, 101.0]);
        let sma20 = indicator(&series, "SMA20", &[None, Some(10.0), Some(10.4)]);
        let sma50 = indicator(&series, "SMA50", &[None, Some(10.0), Some(10.1)]);
        let rsi14 = indicator(&series, "RSI14", &[None, Some(50.0), Some(52.0)]);

        let insights = generate_insights(&series, &sma20, &sma50, &rsi14).unwrap();
        assert_eq!(kinds(&insights), vec![InsightKind::BullishCrossover]);
    }

    #[test]
    fn staying_above_is_not_a_crossover() {
        let series = series_from_closes(&[100.0, 100.5, 101.0]);
        let sma20 = indicator(&series, "SMA20", &[None, Some(11.0), Some(11.5)]);
        let sma50 = indicator(&series, "SMA50", &[None, Some(10.0), Some(10.1)]);
        let rsi14 = indicator(&series, "RSI14", &[None, Some(50.0), Some(52.0)]);

        let insights = generate_insights(&series, &sma20, &sma50, &rsi14).unwrap();
        assert_eq!(kinds(&insights), vec![InsightKind::Neutral]);
    }

    // ---- Combination and fallback ----------------------------------------

    #[test]
    fn rsi_and_crossover_are_both_reported_rsi_first() {
        let series = series_from_closes(&[100.0, 102.0, 104.0]);
        let sma20 = indicator(&series, "SMA20", &[None, Some(9.9), Some(10.5)]);
        let sma50 = indicator(&series, "SMA50", &[None, Some(10.0), Some(10.2)]);
        let rsi14 = indicator(&series, "RSI14", &[None, Some(68.0), Some(74.0)]);

        let insights = generate_insights(&series, &sma20, &sma50, &rsi14).unwrap();
        assert_eq!(
            kinds(&insights),
            vec![InsightKind::Overbought, InsightKind::BullishCrossover]
        );
    }

    #[test]
    fn neutral_is_emitted_when_nothing_else_applies() {
        let series = series_from_closes(&[100.0, 100.1, 100.2]);
        let sma20 = indicator(&series, "SMA20", &[None, Some(10.0), Some(10.0)]);
        let sma50 = indicator(&series, "SMA50", &[None, Some(10.5), Some(10.5)]);
        let rsi14 = indicator(&series, "RSI14", &[None, Some(50.0), Some(51.0)]);

        let insights = generate_insights(&series, &sma20, &sma50, &rsi14).unwrap();
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].kind, InsightKind::Neutral);
    }

    // ---- Failure modes ---------------------------------------------------

    #[test]
    fn misaligned_series_is_rejected() {
        let series = series_from_closes(&[100.0, 101.0, 102.0]);
        let short_series = series_from_closes(&[100.0, 101.0]);
        let sma20 = indicator(&short_series, "SMA20", &[Some(10.0), Some(10.0)]);
        let sma50 = indicator(&series, "SMA50", &[None, Some(10.0), Some(10.0)]);
        let rsi14 = indicator(&series, "RSI14", &[None, Some(50.0), Some(50.0)]);

        assert!(matches!(
            generate_insights(&series, &sma20, &sma50, &rsi14),
            Err(AnalysisError::Alignment(_))
        ));
    }

    #[test]
    fn undefined_rsi_at_latest_bar_is_insufficient_data() {
        let series = series_from_closes(&[100.0, 101.0, 102.0]);
        let sma20 = indicator(&series, "SMA20", &[None, Some(10.0), Some(10.0)]);
        let sma50 = indicator(&series, "SMA50", &[None, Some(10.0), Some(10.0)]);
        let rsi14 = indicator(&series, "RSI14", &[None, None, None]);

        match generate_insights(&series, &sma20, &sma50, &rsi14) {
            Err(AnalysisError::InsufficientData(msg)) => {
                assert!(msg.contains("RSI14"), "unexpected message: {msg}");
            }
            other => panic!("expected InsufficientData, got {other:?}"),
        }
    }

    #[test]
    fn undefined_previous_sma_is_insufficient_data() {
        // SMA50 defined only at the last bar: the crossover state at the
        // previous bar cannot be determined.
        let series = series_from_closes(&[100.0, 101.0, 102.0]);
        let sma20 = indicator(&series, "SMA20", &[None, Some(10.0), Some(10.0)]);
        let sma50 = indicator(&series, "SMA50", &[None, None, Some(10.0)]);
        let rsi14 = indicator(&series, "RSI14", &[None, Some(50.0), Some(50.0)]);

        assert!(matches!(
            generate_insights(&series, &sma20, &sma50, &rsi14),
            Err(AnalysisError::InsufficientData(_))
        ));
    }

    #[test]
    fn single_bar_series_is_insufficient_data() {
        let series = series_from_closes(&[100.0]);
        let sma20 = indicator(&series, "SMA20", &[Some(10.0)]);
        let sma50 = indicator(&series, "SMA50", &[Some(10.0)]);
        let rsi14 = indicator(&series, "RSI14", &[Some(50.0)]);

        assert!(matches!(
            generate_insights(&series, &sma20, &sma50, &rsi14),
            Err(AnalysisError::InsufficientData(_))
        ));
    }

    // ---- Trend assessment ------------------------------------------------

    #[test]
    fn uptrend_when_close_above_both_averages() {
        let series = series_from_closes(&[100.0, 101.0, 112.0]);
        let sma20 = indicator(&series, "SMA20", &[None, Some(108.0), Some(110.0)]);
        let sma50 = indicator(&series, "SMA50", &[None, Some(104.0), Some(105.0)]);

        assert_eq!(
            assess_trend(&series, &sma20, &sma50).unwrap(),
            TrendAssessment::Uptrend
        );
    }

    #[test]
    fn downtrend_when_close_below_both_averages() {
        let series = series_from_closes(&[100.0, 99.0, 90.0]);
        let sma20 = indicator(&series, "SMA20", &[None, Some(96.0), Some(95.0)]);
        let sma50 = indicator(&series, "SMA50", &[None, Some(99.0), Some(98.0)]);

        assert_eq!(
            assess_trend(&series, &sma20, &sma50).unwrap(),
            TrendAssessment::Downtrend
        );
    }

    #[test]
    fn mixed_when_ordering_is_inconsistent() {
        // Close above SMA20 but SMA20 below SMA50.
        let series = series_from_closes(&[100.0, 101.0, 103.0]);
        let sma20 = indicator(&series, "SMA20", &[None, Some(101.0), Some(101.5)]);
        let sma50 = indicator(&series, "SMA50", &[None, Some(102.0), Some(102.0)]);

        assert_eq!(
            assess_trend(&series, &sma20, &sma50).unwrap(),
            TrendAssessment::Mixed
        );
    }

    #[test]
    fn trend_with_undefined_sma_is_insufficient_data() {
        let series = series_from_closes(&[100.0, 101.0]);
        let sma20 = indicator(&series, "SMA20", &[None, Some(100.0)]);
        let sma50 = indicator(&series, "SMA50", &[None, None]);

        assert!(matches!(
            assess_trend(&series, &sma20, &sma50),
            Err(AnalysisError::InsufficientData(_))
        ));
    }
}
