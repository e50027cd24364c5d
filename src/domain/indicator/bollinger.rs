//! Bollinger Bands.
//!
//! - Middle: SMA of close over n periods
//! - Upper: Middle + (multiplier × volatility)
//! - Lower: Middle - (multiplier × volatility)
//!
//! The band width comes from the return volatility column computed with the
//! same window, not from the stddev of prices.
//!
//! Warmup: a row is defined only where both the middle band and the
//! volatility are defined.

use super::rolling_mean;

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerSeries {
    pub window: usize,
    pub num_std: f64,
    pub middle: Vec<Option<f64>>,
    pub upper: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

pub fn calculate_bollinger(
    closes: &[f64],
    window: usize,
    num_std: f64,
    volatility: &[Option<f64>],
) -> BollingerSeries {
    let middle = rolling_mean(closes, window);

    let (upper, lower): (Vec<Option<f64>>, Vec<Option<f64>>) = middle
        .iter()
        .enumerate()
        .map(|(i, mid)| match (mid, volatility.get(i).copied().flatten()) {
            (Some(m), Some(vol)) => (Some(m + num_std * vol), Some(m - num_std * vol)),
            _ => (None, None),
        })
        .unzip();

    BollingerSeries {
        window,
        num_std,
        middle,
        upper,
        lower,
    }
}
