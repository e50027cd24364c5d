//! Time-to-live cache in front of any [`MarketDataPort`].
//!
//! Entries are keyed by [`HistoryRequest::cache_key`]. An expired entry is
//! refetched and replaced; failed fetches are never cached. Latest quotes
//! always go to the inner source.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::debug;

use crate::domain::error::MarketDataError;
use crate::domain::normalizer::RawQuote;
use crate::domain::request::HistoryRequest;
use crate::ports::market_data_port::MarketDataPort;

pub struct CachedMarketData<P> {
    inner: P,
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, Vec<RawQuote>)>>,
}

impl<P: MarketDataPort> CachedMarketData<P> {
    /// A zero `ttl` disables caching.
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, key: &str) -> Option<Vec<RawQuote>> {
        let entries = self.entries.lock().ok()?;
        let (stored_at, rows) = entries.get(key)?;
        (stored_at.elapsed() < self.ttl).then(|| rows.clone())
    }

    fn store(&self, key: String, rows: Vec<RawQuote>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key, (Instant::now(), rows));
        }
    }
}

#[async_trait]
impl<P: MarketDataPort> MarketDataPort for CachedMarketData<P> {
    async fn fetch_history(
        &self,
        ticker: &str,
        request: &HistoryRequest,
    ) -> Result<Vec<RawQuote>, MarketDataError> {
        if self.ttl.is_zero() {
            return self.inner.fetch_history(ticker, request).await;
        }

        let key = request.cache_key(ticker);
        if let Some(rows) = self.lookup(&key) {
            debug!(key = %key, "cache hit");
            return Ok(rows);
        }

        debug!(key = %key, "cache miss");
        let rows = self.inner.fetch_history(ticker, request).await?;
        self.store(key, rows.clone());
        Ok(rows)
    }

    async fn latest_quote(&self, ticker: &str) -> Result<Option<RawQuote>, MarketDataError> {
        self.inner.latest_quote(ticker).await
    }
}
