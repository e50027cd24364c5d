//! Daily OHLCV bars and the date-ordered series built from them.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    pub fn is_finite(&self) -> bool {
        self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite()
    }
}

/// Bars for one ticker, strictly increasing by date with finite fields.
///
/// Only the normalizer builds non-empty series, so the invariant holds for
/// every value of this type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceSeries {
    ticker: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn empty(ticker: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            bars: Vec::new(),
        }
    }

    /// Caller guarantees `bars` is sorted, deduplicated and finite.
    pub(crate) fn from_sorted(ticker: &str, bars: Vec<PriceBar>) -> Self {
        debug_assert!(bars.windows(2).all(|w| w[0].date < w[1].date));
        Self {
            ticker: ticker.to_string(),
            bars,
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: f64) -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1_000.0,
        }
    }

    #[test]
    fn empty_series_keeps_ticker() {
        let series = PriceSeries::empty("AAPL");
        assert!(series.is_empty());
        assert_eq!(series.ticker(), "AAPL");
        assert!(series.last().is_none());
    }

    #[test]
    fn accessors_follow_bar_order() {
        let series = PriceSeries::from_sorted("MSFT", vec![bar(2, 10.0), bar(3, 11.0)]);
        assert_eq!(series.len(), 2);
        assert_eq!(series.closes(), vec![10.0, 11.0]);
        assert_eq!(series.first_date(), NaiveDate::from_ymd_opt(2024, 1, 2));
        assert_eq!(series.last().map(|b| b.close), Some(11.0));
    }

    #[test]
    fn finite_check_rejects_nan() {
        let mut b = bar(2, 10.0);
        assert!(b.is_finite());
        b.volume = f64::NAN;
        assert!(!b.is_finite());
    }
}
