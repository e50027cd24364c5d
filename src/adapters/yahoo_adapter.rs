//! Yahoo Finance market data through `yahoo_finance_api`.

use async_trait::async_trait;
use chrono::{Datelike, Days, NaiveDate};
use time::OffsetDateTime;
use tracing::debug;
use yahoo_finance_api as yahoo;

use crate::domain::error::MarketDataError;
use crate::domain::normalizer::RawQuote;
use crate::domain::request::{HistoryRange, HistoryRequest};
use crate::ports::market_data_port::MarketDataPort;

pub struct YahooMarketData {
    connector: yahoo::YahooConnector,
}

impl YahooMarketData {
    pub fn new() -> Result<Self, MarketDataError> {
        let connector = yahoo::YahooConnector::new()
            .map_err(|e| MarketDataError::Connection(e.to_string()))?;
        Ok(Self { connector })
    }
}

/// Bars carry UTC timestamps of the exchange's local session; shifting by the
/// exchange offset makes the normalizer's UTC date the local trading date.
fn local_timestamp(timestamp: i64, gmt_offset: i64) -> i64 {
    timestamp + gmt_offset
}

fn to_raw(quote: &yahoo::Quote, gmt_offset: i64) -> RawQuote {
    RawQuote {
        timestamp: local_timestamp(quote.timestamp as i64, gmt_offset),
        open: Some(quote.open),
        high: Some(quote.high),
        low: Some(quote.low),
        close: Some(quote.close),
        volume: Some(quote.volume as f64),
    }
}

fn to_offset_datetime(ticker: &str, date: NaiveDate) -> Result<OffsetDateTime, MarketDataError> {
    let bad_date = |reason: String| MarketDataError::Fetch {
        ticker: ticker.to_string(),
        reason: format!("invalid date {}: {}", date, reason),
    };
    let month = time::Month::try_from(date.month() as u8).map_err(|e| bad_date(e.to_string()))?;
    let day = time::Date::from_calendar_date(date.year(), month, date.day() as u8)
        .map_err(|e| bad_date(e.to_string()))?;
    Ok(day.midnight().assume_utc())
}

/// Exchange offset from UTC in seconds; 0 when the metadata is missing.
fn gmt_offset(response: &yahoo::YResponse) -> i64 {
    response
        .metadata()
        .map(|meta| i64::from(meta.gmtoffset))
        .unwrap_or(0)
}

fn fetch_err<E: std::fmt::Display>(ticker: &str) -> impl Fn(E) -> MarketDataError + '_ {
    move |e| MarketDataError::Fetch {
        ticker: ticker.to_string(),
        reason: e.to_string(),
    }
}

fn parse_err<E: std::fmt::Display>(ticker: &str) -> impl Fn(E) -> MarketDataError + '_ {
    move |e| MarketDataError::Parse {
        ticker: ticker.to_string(),
        reason: e.to_string(),
    }
}

#[async_trait]
impl MarketDataPort for YahooMarketData {
    async fn fetch_history(
        &self,
        ticker: &str,
        request: &HistoryRequest,
    ) -> Result<Vec<RawQuote>, MarketDataError> {
        let interval = request.interval.token();

        let response = match request.range {
            HistoryRange::Period(period) => self
                .connector
                .get_quote_range(ticker, interval, period.token())
                .await
                .map_err(fetch_err(ticker))?,
            HistoryRange::Dates { start, end } => {
                // the provider treats the end bound as exclusive
                let end = end.checked_add_days(Days::new(1)).unwrap_or(end);
                let start = to_offset_datetime(ticker, start)?;
                let end = to_offset_datetime(ticker, end)?;
                self.connector
                    .get_quote_history_interval(ticker, start, end, interval)
                    .await
                    .map_err(fetch_err(ticker))?
            }
        };

        let offset = gmt_offset(&response);
        let quotes = response.quotes().map_err(parse_err(ticker))?;
        debug!(ticker, rows = quotes.len(), offset, "yahoo quotes received");
        Ok(quotes.iter().map(|q| to_raw(q, offset)).collect())
    }

    async fn latest_quote(&self, ticker: &str) -> Result<Option<RawQuote>, MarketDataError> {
        let response = self
            .connector
            .get_quote_range(ticker, "1m", "1d")
            .await
            .map_err(fetch_err(ticker))?;
        let offset = gmt_offset(&response);
        let quotes = response.quotes().map_err(parse_err(ticker))?;
        Ok(quotes.last().map(|q| to_raw(q, offset)))
    }
}
