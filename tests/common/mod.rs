#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use marketlens::domain::error::MarketDataError;
pub use marketlens::domain::normalizer::RawQuote;
use marketlens::domain::request::HistoryRequest;
use marketlens::ports::market_data_port::MarketDataPort;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct MockMarketData {
    pub data: HashMap<String, Vec<RawQuote>>,
    pub errors: HashMap<String, String>,
    pub calls: AtomicUsize,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_rows(mut self, ticker: &str, rows: Vec<RawQuote>) -> Self {
        self.data.insert(ticker.to_string(), rows);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataPort for MockMarketData {
    async fn fetch_history(
        &self,
        ticker: &str,
        _request: &HistoryRequest,
    ) -> Result<Vec<RawQuote>, MarketDataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = self.errors.get(ticker) {
            return Err(MarketDataError::Fetch {
                ticker: ticker.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(ticker).cloned().unwrap_or_default())
    }

    async fn latest_quote(&self, ticker: &str) -> Result<Option<RawQuote>, MarketDataError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(MarketDataError::Fetch {
                ticker: ticker.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(ticker).and_then(|rows| rows.last().cloned()))
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// One daily row per close, starting at `start`.
pub fn rows_from_closes(start: &str, closes: &[f64]) -> Vec<RawQuote> {
    let start = date(start);
    closes
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let d = start + Days::new(i as u64);
            RawQuote::from_date(d, *c, c * 1.01, c * 0.99, *c, 1_000_000.0)
        })
        .collect()
}

/// Closes that compound the given daily returns from `base`.
pub fn closes_from_returns(base: f64, returns: &[f64]) -> Vec<f64> {
    let mut closes = vec![base];
    for r in returns {
        let prev = closes[closes.len() - 1];
        closes.push(prev * (1.0 + r));
    }
    closes
}

/// Deterministic zig-zag walk with an upward drift.
pub fn trending_closes(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 100.0 + i as f64 * 0.3 + if i % 2 == 0 { 1.5 } else { -1.5 })
        .collect()
}
