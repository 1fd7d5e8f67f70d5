// =============================================================================
// Analysis Error Taxonomy
// =============================================================================
//
// Typed failures for the indicator/insight core. All variants are structural
// problems with the input, surfaced synchronously to the caller for direct
// display. Nothing here is retried and no variant is ever papered over with a
// default value: an undefined indicator point stays undefined.

use thiserror::Error;

/// Failure modes of the analysis core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// The series is too short for the requested computation or for insight
    /// evaluation at the latest bar.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// The price series is malformed: dates out of order, or a close that is
    /// non-positive or non-finite.
    #[error("invalid price series: {0}")]
    InvalidSeries(String),

    /// An indicator series does not line up with the price series it is
    /// supposed to describe (length or date mismatch).
    #[error("series alignment mismatch: {0}")]
    Alignment(String),

    /// A window/period of zero was requested.
    #[error("invalid period {period} for {indicator}")]
    InvalidPeriod {
        indicator: &'static str,
        period: usize,
    },
}

impl AnalysisError {
    /// Shorthand used by the indicator functions.
    pub fn invalid_period(indicator: &'static str, period: usize) -> Self {
        Self::InvalidPeriod { indicator, period }
    }

    pub fn insufficient(msg: impl Into<String>) -> Self {
        Self::InsufficientData(msg.into())
    }

    pub fn invalid_series(msg: impl Into<String>) -> Self {
        Self::InvalidSeries(msg.into())
    }

    pub fn alignment(msg: impl Into<String>) -> Self {
        Self::Alignment(msg.into())
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_are_stable() {
        let err = AnalysisError::invalid_period("SMA", 0);
        assert_eq!(err.to_string(), "invalid period 0 for SMA");

        let err = AnalysisError::insufficient("need at least 2 points");
        assert_eq!(err.to_string(), "insufficient data: need at least 2 points");
    }

    #[test]
    fn variants_compare_by_content() {
        assert_eq!(
            AnalysisError::invalid_period("RSI", 0),
            AnalysisError::InvalidPeriod {
                indicator: "RSI",
                period: 0
            }
        );
        assert_ne!(
            AnalysisError::insufficient("a"),
            AnalysisError::insufficient("b")
        );
    }
}
