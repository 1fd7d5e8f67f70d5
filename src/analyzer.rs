// =============================================================================
// Analyzer: the single entry point of the computation core
// =============================================================================
//
// One analysis run is a synchronous batch pass:
//   1. Validate the price series (malformed input fails before any math)
//   2. Compute SMA20, SMA50, RSI14 (date-aligned with the input)
//   3. Generate insights at the latest bar
//   4. Assess the trend of the latest bar
//
// `analyze` is pure and idempotent: it takes the series as an explicit
// parameter and returns new values, holding no state between calls.  The
// presentation layer calls it once per user request and wraps the result in
// an `AnalysisReport` for serialization.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::errors::AnalysisError;
use crate::indicators::{compute_rsi, compute_sma};
use crate::insights::{assess_trend, generate_insights};
use crate::types::{IndicatorSeries, Insight, InsightKind, PriceSeries, TrendAssessment};

/// Short moving-average window, fixed by the product definition.
pub const SMA_SHORT_WINDOW: usize = 20;
/// Long moving-average window, fixed by the product definition.
pub const SMA_LONG_WINDOW: usize = 50;
/// RSI look-back period, fixed by the product definition.
pub const RSI_PERIOD: usize = 14;

/// Everything one analysis run derives from a price series.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub sma20: IndicatorSeries,
    pub sma50: IndicatorSeries,
    pub rsi14: IndicatorSeries,
    pub insights: Vec<Insight>,
    pub trend: TrendAssessment,
}

/// Run the full indicator/insight pipeline over `series`.
///
/// Requires at least `SMA_LONG_WINDOW + 1` bars so that the crossover state
/// at the latest bar is well-defined; shorter series fail with
/// `InsufficientData` from the insight step (the indicator series
/// themselves tolerate short input by carrying undefined points).
pub fn analyze(series: &PriceSeries) -> Result<Analysis, AnalysisError> {
    series.validate()?;

    let sma20 = compute_sma(series, SMA_SHORT_WINDOW)?;
    let sma50 = compute_sma(series, SMA_LONG_WINDOW)?;
    let rsi14 = compute_rsi(series, RSI_PERIOD)?;

    let insights = generate_insights(series, &sma20, &sma50, &rsi14)?;
    let trend = assess_trend(series, &sma20, &sma50)?;

    info!(
        bars = series.len(),
        insights = insights.len(),
        trend = %trend,
        "analysis complete"
    );

    Ok(Analysis {
        sma20,
        sma50,
        rsi14,
        insights,
        trend,
    })
}

// =============================================================================
// Analysis Report: the record handed to the presentation layer
// =============================================================================

/// Complete result of one user-initiated analysis request: the input series,
/// the derived indicator series, the insights and the trend, stamped with a
/// unique id and a generation timestamp.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// Unique identifier for this analysis run (UUID v4).
    pub id: String,

    /// Ticker the analysis pertains to.
    pub ticker: String,

    /// First bar date of the analyzed series.
    pub start: NaiveDate,

    /// Last bar date of the analyzed series.
    pub end: NaiveDate,

    /// Number of daily bars analyzed.
    pub bar_count: usize,

    /// The raw price series, echoed back for charting.
    pub prices: PriceSeries,

    pub sma20: IndicatorSeries,
    pub sma50: IndicatorSeries,
    pub rsi14: IndicatorSeries,

    /// Ordered observations: at most one RSI insight and one crossover
    /// insight (RSI first), or a single Neutral entry.
    pub insights: Vec<Insight>,

    pub trend: TrendAssessment,

    /// ISO 8601 timestamp of when this report was generated.
    pub generated_at: String,
}

impl AnalysisReport {
    /// Assemble a report from a completed analysis.  `series` must be the
    /// exact series the analysis was computed from.
    pub fn new(ticker: impl Into<String>, series: PriceSeries, analysis: Analysis) -> Self {
        let (start, end) = series
            .date_range()
            .expect("analyzed series is never empty");

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            ticker: ticker.into(),
            start,
            end,
            bar_count: series.len(),
            prices: series,
            sma20: analysis.sma20,
            sma50: analysis.sma50,
            rsi14: analysis.rsi14,
            insights: analysis.insights,
            trend: analysis.trend,
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Compact view of this report for the recent-analyses ring.
    pub fn summary(&self) -> AnalysisSummary {
        AnalysisSummary {
            id: self.id.clone(),
            ticker: self.ticker.clone(),
            as_of: self.end,
            insights: self.insights.iter().map(|i| i.kind).collect(),
            trend: self.trend,
            generated_at: self.generated_at.clone(),
        }
    }
}

/// One line of the recent-analyses ring kept in app state.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSummary {
    pub id: String,
    pub ticker: String,
    pub as_of: NaiveDate,
    pub insights: Vec<InsightKind>,
    pub trend: TrendAssessment,
    pub generated_at: String,
}
