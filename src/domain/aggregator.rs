//! Portfolio aggregation: weighted composite of per-asset daily returns.
//!
//! Tickers are fetched concurrently through a bounded `buffer_unordered`
//! fan-out. Each unit of work owns its ticker; outcomes are collected into a
//! map keyed by ticker so the result never depends on completion order.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::domain::error::PortfolioError;
use crate::domain::indicator::returns::daily_returns;
use crate::domain::metrics::PortfolioMetrics;
use crate::domain::portfolio::Portfolio;
use crate::domain::price_series::PriceSeries;
use crate::domain::request::HistoryRequest;
use crate::ports::market_data_port::{try_fetch_series, MarketDataPort};

#[derive(Debug, Clone, PartialEq)]
pub struct AssetReturns {
    pub ticker: String,
    pub weight: f64,
    pub returns: Vec<(NaiveDate, f64)>,
}

impl AssetReturns {
    pub fn from_series(series: &PriceSeries, weight: f64) -> Self {
        let returns = series
            .dates()
            .into_iter()
            .zip(daily_returns(&series.closes()))
            .collect();
        Self {
            ticker: series.ticker().to_string(),
            weight,
            returns,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioReturns {
    pub dates: Vec<NaiveDate>,
    pub portfolio_return: Vec<f64>,
    /// Compounded return up to each date, in percent.
    pub cumulative_return: Vec<f64>,
}

impl PortfolioReturns {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn final_cumulative(&self) -> Option<f64> {
        self.cumulative_return.last().copied()
    }

    pub fn metrics(&self) -> PortfolioMetrics {
        PortfolioMetrics::compute(&self.portfolio_return)
    }
}

/// Σ weight × daily return over the dates every asset has in common.
pub fn weighted_returns(assets: &[AssetReturns]) -> PortfolioReturns {
    let lookups: Vec<(f64, BTreeMap<NaiveDate, f64>)> = assets
        .iter()
        .map(|a| (a.weight, a.returns.iter().copied().collect()))
        .collect();

    let common: BTreeSet<NaiveDate> = match lookups.split_first() {
        None => BTreeSet::new(),
        Some(((_, first), rest)) => first
            .keys()
            .filter(|d| rest.iter().all(|(_, m)| m.contains_key(*d)))
            .copied()
            .collect(),
    };

    let mut dates = Vec::with_capacity(common.len());
    let mut portfolio_return = Vec::with_capacity(common.len());
    let mut cumulative_return = Vec::with_capacity(common.len());
    let mut growth = 1.0;

    for date in common {
        let r: f64 = lookups
            .iter()
            .map(|(w, m)| w * m.get(&date).copied().unwrap_or(0.0))
            .sum();
        growth *= 1.0 + r;
        dates.push(date);
        portfolio_return.push(r);
        cumulative_return.push((growth - 1.0) * 100.0);
    }

    PortfolioReturns {
        dates,
        portfolio_return,
        cumulative_return,
    }
}

#[derive(Debug, Clone)]
pub struct Aggregation {
    pub returns: PortfolioReturns,
    pub metrics: PortfolioMetrics,
    /// Tickers that were aggregated.
    pub included: Vec<String>,
    /// Tickers that were excluded, with the reason.
    pub errors: BTreeMap<String, String>,
}

impl Aggregation {
    pub fn coverage(&self, portfolio: &Portfolio) -> f64 {
        self.included
            .iter()
            .filter_map(|t| portfolio.weight_of(t))
            .sum()
    }
}

/// Fetch every position's history with at most `max_workers` requests in
/// flight, then aggregate the ones that returned data.
pub async fn aggregate(
    portfolio: &Portfolio,
    port: &dyn MarketDataPort,
    request: &HistoryRequest,
    max_workers: usize,
    min_assets: usize,
) -> Result<Aggregation, PortfolioError> {
    portfolio.ensure_normalized()?;

    let workers = max_workers.max(1);
    info!(
        assets = portfolio.positions().len(),
        workers,
        range = %request.range,
        "aggregating portfolio"
    );

    let outcomes: BTreeMap<String, Result<AssetReturns, String>> =
        stream::iter(portfolio.positions().iter().cloned())
            .map(|position| async move {
                let outcome = try_fetch_series(port, &position.ticker, request)
                    .await
                    .map(|series| {
                        debug!(ticker = %position.ticker, rows = series.len(), "fetched");
                        AssetReturns::from_series(&series, position.weight)
                    });
                (position.ticker, outcome)
            })
            .buffer_unordered(workers)
            .collect()
            .await;

    let mut assets = Vec::new();
    let mut errors = BTreeMap::new();
    for (ticker, outcome) in outcomes {
        match outcome {
            Ok(a) => assets.push(a),
            Err(reason) => {
                warn!(ticker = %ticker, reason = %reason, "excluded from portfolio");
                errors.insert(ticker, reason);
            }
        }
    }

    if assets.len() < min_assets {
        return Err(PortfolioError::InsufficientAssets {
            succeeded: assets.len(),
            required: min_assets,
            errors,
        });
    }

    let returns = weighted_returns(&assets);
    let included: Vec<String> = assets.iter().map(|a| a.ticker.clone()).collect();
    let aggregation = Aggregation {
        metrics: returns.metrics(),
        returns,
        included,
        errors,
    };

    let coverage = aggregation.coverage(portfolio);
    if coverage < 1.0 - crate::domain::portfolio::WEIGHT_TOLERANCE {
        warn!(coverage, "aggregated weights cover only part of the portfolio");
    }
    info!(
        included = aggregation.included.len(),
        failed = aggregation.errors.len(),
        days = aggregation.returns.len(),
        "portfolio aggregated"
    );

    Ok(aggregation)
}
