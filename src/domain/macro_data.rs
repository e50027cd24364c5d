//! Macro-economic indicator closes and their correlation with an asset.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::domain::price_series::PriceSeries;
use crate::domain::request::HistoryRequest;
use crate::ports::market_data_port::{try_fetch_series, MarketDataPort};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacroIndicator {
    pub name: &'static str,
    pub ticker: &'static str,
}

pub const MACRO_INDICATORS: &[MacroIndicator] = &[
    MacroIndicator { name: "VIX", ticker: "^VIX" },
    MacroIndicator { name: "Treasury 10Y", ticker: "^TNX" },
    MacroIndicator { name: "Brent Oil", ticker: "BZ=F" },
    MacroIndicator { name: "Gold", ticker: "GC=F" },
    MacroIndicator { name: "Dollar Index", ticker: "DX=F" },
    MacroIndicator { name: "Bitcoin", ticker: "BTC-USD" },
    MacroIndicator { name: "S&P 500", ticker: "^GSPC" },
];

/// Closing prices per indicator name, plus the indicators that failed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacroTable {
    pub closes: BTreeMap<String, BTreeMap<NaiveDate, f64>>,
    pub errors: BTreeMap<String, String>,
}

impl MacroTable {
    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn insert_series(&mut self, name: &str, series: &PriceSeries) {
        let closes = series.bars().iter().map(|b| (b.date, b.close)).collect();
        self.closes.insert(name.to_string(), closes);
    }
}

pub async fn fetch_macro(
    port: &dyn MarketDataPort,
    indicators: &[MacroIndicator],
    request: &HistoryRequest,
    max_workers: usize,
) -> MacroTable {
    let fetched: Vec<(MacroIndicator, Result<PriceSeries, String>)> =
        stream::iter(indicators.iter().copied())
            .map(|ind| async move { (ind, try_fetch_series(port, ind.ticker, request).await) })
            .buffer_unordered(max_workers.max(1))
            .collect()
            .await;

    let mut table = MacroTable::default();
    for (ind, outcome) in fetched {
        match outcome {
            Ok(series) => table.insert_series(ind.name, &series),
            Err(reason) => {
                warn!(indicator = ind.name, ticker = ind.ticker, reason = %reason, "no macro data");
                table.errors.insert(ind.name.to_string(), reason);
            }
        }
    }
    info!(
        loaded = table.closes.len(),
        failed = table.errors.len(),
        "macro indicators fetched"
    );
    table
}

/// Pearson correlation of the asset's closes against every indicator, over
/// the dates both share. Highest first; indicators with fewer than two
/// shared dates or no variance are left out.
pub fn correlations(asset: &PriceSeries, table: &MacroTable) -> Vec<(String, f64)> {
    if asset.is_empty() {
        return Vec::new();
    }

    let mut out: Vec<(String, f64)> = table
        .closes
        .iter()
        .filter_map(|(name, closes)| {
            let (xs, ys): (Vec<f64>, Vec<f64>) = asset
                .bars()
                .iter()
                .filter_map(|b| closes.get(&b.date).map(|m| (b.close, *m)))
                .unzip();
            pearson(&xs, &ys).map(|r| (name.clone(), r))
        })
        .collect();

    out.sort_by(|a, b| b.1.total_cmp(&a.1));
    out
}

pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len();
    if n < 2 || n != ys.len() {
        return None;
    }
    let mx = xs.iter().sum::<f64>() / n as f64;
    let my = ys.iter().sum::<f64>() / n as f64;

    let (mut cov, mut vx, mut vy) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let (dx, dy) = (x - mx, y - my);
        cov += dx * dy;
        vx += dx * dx;
        vy += dy * dy;
    }
    if vx == 0.0 || vy == 0.0 {
        return None;
    }
    Some(cov / (vx.sqrt() * vy.sqrt()))
}
