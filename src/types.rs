// =============================================================================
// Shared types used across the TickerScope analysis engine
// =============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::AnalysisError;

// =============================================================================
// Price data
// =============================================================================

/// A single daily OHLCV bar for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

/// A chronologically ordered sequence of daily bars, owned read-only by the
/// core for the duration of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceSeries(Vec<PricePoint>);

impl PriceSeries {
    /// Wrap a vector of bars. No validation happens here; callers run
    /// `validate` (or go through `analyzer::analyze`, which does) before
    /// computing anything from the series.
    pub fn new(points: Vec<PricePoint>) -> Self {
        Self(points)
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.0.last()
    }

    /// Closing prices in series order.
    pub fn closes(&self) -> Vec<f64> {
        self.0.iter().map(|p| p.close).collect()
    }

    /// First and last bar dates, when the series is non-empty.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.0.first()?.date, self.0.last()?.date))
    }

    /// Check the structural invariants every consumer relies on:
    /// - non-empty
    /// - strictly increasing dates (which also guarantees uniqueness)
    /// - finite, positive closing prices
    ///
    /// Runs before any indicator is computed so a malformed series fails
    /// up front rather than mid-pipeline.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.0.is_empty() {
            return Err(AnalysisError::invalid_series("series is empty"));
        }

        for (i, point) in self.0.iter().enumerate() {
            if !point.close.is_finite() || point.close <= 0.0 {
                return Err(AnalysisError::invalid_series(format!(
                    "non-positive or non-finite close {} at index {} ({})",
                    point.close, i, point.date
                )));
            }

            if i > 0 && point.date <= self.0[i - 1].date {
                return Err(AnalysisError::invalid_series(format!(
                    "dates not strictly increasing at index {}: {} follows {}",
                    i,
                    point.date,
                    self.0[i - 1].date
                )));
            }
        }

        Ok(())
    }
}

// =============================================================================
// Indicator series
// =============================================================================

/// One indicator observation. `value` is `None` wherever fewer than
/// window-size bars of history precede the date; it serializes as JSON
/// `null` so chart consumers render a gap, never a zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

/// A named indicator series ("SMA20", "SMA50", "RSI14"), always the same
/// length and date alignment as the price series it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries {
    pub label: String,
    pub points: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn new(label: impl Into<String>, points: Vec<IndicatorPoint>) -> Self {
        Self {
            label: label.into(),
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Value at index `i`, flattened over "index out of range" and
    /// "not yet defined".
    pub fn value_at(&self, i: usize) -> Option<f64> {
        self.points.get(i).and_then(|p| p.value)
    }

    /// Most recent value, if defined.
    pub fn last_value(&self) -> Option<f64> {
        self.points.last().and_then(|p| p.value)
    }

    /// Verify the one-point-per-bar invariant against `series`: same
    /// length, same dates, same order.
    pub fn ensure_aligned(&self, series: &PriceSeries) -> Result<(), AnalysisError> {
        if self.points.len() != series.len() {
            return Err(AnalysisError::alignment(format!(
                "{} has {} points but the price series has {}",
                self.label,
                self.points.len(),
                series.len()
            )));
        }

        for (ip, pp) in self.points.iter().zip(series.points()) {
            if ip.date != pp.date {
                return Err(AnalysisError::alignment(format!(
                    "{} date {} does not match price date {}",
                    self.label, ip.date, pp.date
                )));
            }
        }

        Ok(())
    }
}

// =============================================================================
// Insights
// =============================================================================

/// Qualitative classification of the latest bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsightKind {
    Overbought,
    Oversold,
    BullishCrossover,
    BearishCrossover,
    Neutral,
}

impl std::fmt::Display for InsightKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overbought => write!(f, "Overbought"),
            Self::Oversold => write!(f, "Oversold"),
            Self::BullishCrossover => write!(f, "BullishCrossover"),
            Self::BearishCrossover => write!(f, "BearishCrossover"),
            Self::Neutral => write!(f, "Neutral"),
        }
    }
}

/// One observation emitted by the insight generator. Ephemeral: recomputed
/// on every analysis run, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub as_of: NaiveDate,
    /// Human-readable explanation for direct display.
    pub detail: String,
}

/// Position of the latest close relative to the two moving averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendAssessment {
    Uptrend,
    Downtrend,
    Mixed,
}

impl std::fmt::Display for TrendAssessment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uptrend => write!(f, "Uptrend"),
            Self::Downtrend => write!(f, "Downtrend"),
            Self::Mixed => write!(f, "Mixed"),
        }
    }
}
