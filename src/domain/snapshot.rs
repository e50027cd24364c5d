//! Latest-value KPIs for a single analysed ticker.

use std::fmt;

use chrono::NaiveDate;

use crate::domain::analyzer::EnrichedSeries;
use crate::domain::error::Column;
use crate::domain::price_series::PriceSeries;

pub const RSI_OVERSOLD: f64 = 30.0;
pub const RSI_OVERBOUGHT: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsiZone {
    Oversold,
    Neutral,
    Overbought,
}

impl RsiZone {
    pub fn classify(rsi: f64) -> Self {
        if rsi < RSI_OVERSOLD {
            RsiZone::Oversold
        } else if rsi > RSI_OVERBOUGHT {
            RsiZone::Overbought
        } else {
            RsiZone::Neutral
        }
    }
}

impl fmt::Display for RsiZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RsiZone::Oversold => "oversold",
            RsiZone::Neutral => "neutral",
            RsiZone::Overbought => "overbought",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub ticker: String,
    pub date: NaiveDate,
    pub last_close: f64,
    /// Percent changes against 1, 5 and 20 rows back.
    pub day_change_pct: Option<f64>,
    pub change_5d_pct: Option<f64>,
    pub change_20d_pct: Option<f64>,
    /// Latest volatility, in percent.
    pub volatility_pct: Option<f64>,
    pub volume: f64,
    pub rsi: Option<f64>,
    pub rsi_zone: Option<RsiZone>,
}

impl Snapshot {
    /// `None` for an empty series.
    pub fn from_enriched(enriched: &EnrichedSeries) -> Option<Self> {
        let series = &enriched.series;
        let last = series.last()?;
        let rsi = enriched.latest(Column::Rsi);

        Some(Self {
            ticker: series.ticker().to_string(),
            date: last.date,
            last_close: last.close,
            day_change_pct: change_pct(series, 1),
            change_5d_pct: change_pct(series, 5),
            change_20d_pct: change_pct(series, 20),
            volatility_pct: enriched.latest(Column::Volatility).map(|v| v * 100.0),
            volume: last.volume,
            rsi,
            rsi_zone: rsi.map(RsiZone::classify),
        })
    }
}

fn change_pct(series: &PriceSeries, lookback: usize) -> Option<f64> {
    let bars = series.bars();
    let last = bars.last()?;
    let idx = bars.len().checked_sub(lookback + 1)?;
    let base = bars[idx].close;
    if base == 0.0 {
        return None;
    }
    Some((last.close - base) / base * 100.0)
}
