//! Turns raw provider rows into a clean [`PriceSeries`].
//!
//! Rows with a missing or non-finite field are dropped, timestamps become UTC
//! calendar dates, and rows are ordered chronologically. Sources that report
//! exchange-local sessions shift timestamps by the exchange offset first, so
//! the UTC date is the local trading date. Weekends and holidays
//! are not filled in. When several rows fall on the same date (intraday
//! intervals) the latest one is kept.

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use tracing::debug;

use crate::domain::price_series::{PriceBar, PriceSeries};

/// One row as returned by a market data source.
///
/// `None` marks a field the provider left blank.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawQuote {
    pub timestamp: i64,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

impl RawQuote {
    pub fn from_date(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        let timestamp = date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or_default();
        Self {
            timestamp,
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
            volume: Some(volume),
        }
    }

    fn to_bar(&self) -> Option<PriceBar> {
        let date = DateTime::from_timestamp(self.timestamp, 0)?.date_naive();
        let bar = PriceBar {
            date,
            open: self.open?,
            high: self.high?,
            low: self.low?,
            close: self.close?,
            volume: self.volume?,
        };
        bar.is_finite().then_some(bar)
    }
}

/// Provider-style CSV row. Capitalised headers are what the provider exports;
/// the lowercase canonical names are accepted too.
#[derive(Debug, Clone, Deserialize)]
pub struct CsvQuoteRow {
    #[serde(rename = "Date", alias = "date")]
    pub date: String,
    #[serde(rename = "Open", alias = "open", default)]
    pub open: Option<f64>,
    #[serde(rename = "High", alias = "high", default)]
    pub high: Option<f64>,
    #[serde(rename = "Low", alias = "low", default)]
    pub low: Option<f64>,
    #[serde(rename = "Close", alias = "close", default)]
    pub close: Option<f64>,
    #[serde(rename = "Volume", alias = "volume", default)]
    pub volume: Option<f64>,
}

impl CsvQuoteRow {
    /// Accepts `YYYY-MM-DD` with an optional time suffix.
    pub fn parse_date(&self) -> Option<NaiveDate> {
        let head = self.date.trim().get(..10)?;
        NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
    }

    pub fn into_raw(self) -> Option<RawQuote> {
        let date = self.parse_date()?;
        let timestamp = date.and_hms_opt(0, 0, 0)?.and_utc().timestamp();
        Some(RawQuote {
            timestamp,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        })
    }
}

pub fn normalize(ticker: &str, raw: &[RawQuote]) -> PriceSeries {
    if raw.is_empty() {
        return PriceSeries::empty(ticker);
    }

    let mut indexed: Vec<(i64, PriceBar)> = raw
        .iter()
        .filter_map(|q| q.to_bar().map(|b| (q.timestamp, b)))
        .collect();

    let dropped = raw.len() - indexed.len();
    if dropped > 0 {
        debug!(ticker, dropped, "dropped incomplete rows");
    }

    indexed.sort_by_key(|(ts, _)| *ts);

    let mut bars: Vec<PriceBar> = Vec::with_capacity(indexed.len());
    for (_, bar) in indexed {
        match bars.last_mut() {
            Some(last) if last.date == bar.date => *last = bar,
            _ => bars.push(bar),
        }
    }

    PriceSeries::from_sorted(ticker, bars)
}
