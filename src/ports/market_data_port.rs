//! Market data source port.

use async_trait::async_trait;
use tracing::warn;

use crate::domain::error::MarketDataError;
use crate::domain::normalizer::{normalize, RawQuote};
use crate::domain::price_series::PriceSeries;
use crate::domain::request::HistoryRequest;

/// A remote historical-quote provider. Implementations may return empty rows
/// or errors at any time; callers treat both as "no data".
#[async_trait]
pub trait MarketDataPort: Send + Sync {
    async fn fetch_history(
        &self,
        ticker: &str,
        request: &HistoryRequest,
    ) -> Result<Vec<RawQuote>, MarketDataError>;

    /// Most recent intraday row for today, if the source has one.
    async fn latest_quote(&self, ticker: &str) -> Result<Option<RawQuote>, MarketDataError>;
}

/// Failure reason for a response without usable rows.
pub const NO_DATA: &str = "no data";

/// Fetch and normalize. The error is the provider's failure reason, or
/// `"no data"` when no usable rows came back.
pub async fn try_fetch_series(
    port: &dyn MarketDataPort,
    ticker: &str,
    request: &HistoryRequest,
) -> Result<PriceSeries, String> {
    let raw = port
        .fetch_history(ticker, request)
        .await
        .map_err(|e| e.to_string())?;
    let series = normalize(ticker, &raw);
    if series.is_empty() {
        return Err(NO_DATA.to_string());
    }
    Ok(series)
}

/// Fetch and normalize, absorbing provider failures into an empty series.
pub async fn fetch_series(
    port: &dyn MarketDataPort,
    ticker: &str,
    request: &HistoryRequest,
) -> PriceSeries {
    match try_fetch_series(port, ticker, request).await {
        Ok(series) => series,
        Err(reason) => {
            warn!(ticker, range = %request.range, reason = %reason, "history unavailable");
            PriceSeries::empty(ticker)
        }
    }
}

/// Latest quote as a one-row series; empty when unavailable.
pub async fn fetch_latest(port: &dyn MarketDataPort, ticker: &str) -> PriceSeries {
    match port.latest_quote(ticker).await {
        Ok(Some(raw)) => normalize(ticker, &[raw]),
        Ok(None) => {
            warn!(ticker, "no real-time data available");
            PriceSeries::empty(ticker)
        }
        Err(e) => {
            warn!(ticker, error = %e, "real-time fetch failed");
            PriceSeries::empty(ticker)
        }
    }
}
