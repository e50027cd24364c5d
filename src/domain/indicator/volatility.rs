//! Rolling volatility of daily percentage returns.
//!
//! VOL(n)[i] = sample stddev of the last n returns ending at row i, times
//! sqrt(252) when annualized. Row 0 has no return, so the first defined row
//! is n.
//!
//! Short histories degrade to a smaller window: with fewer than n returns
//! the effective window is max(2, returns / 2). Fewer than two returns leave
//! the whole column undefined.

use super::returns::pct_change;
use super::{sample_std, TRADING_DAYS_PER_YEAR};

#[derive(Debug, Clone, PartialEq)]
pub struct VolatilitySeries {
    pub window: usize,
    pub effective_window: usize,
    pub annualized: bool,
    pub values: Vec<Option<f64>>,
}

pub fn effective_window(window: usize, return_count: usize) -> usize {
    if return_count >= window {
        window
    } else {
        (return_count / 2).max(2)
    }
}

pub fn calculate_volatility(closes: &[f64], window: usize, annualized: bool) -> VolatilitySeries {
    let returns = pct_change(closes);
    let return_count = closes.len().saturating_sub(1);
    let effective = effective_window(window, return_count);
    let scale = if annualized {
        TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        1.0
    };

    let mut values = vec![None; closes.len()];
    if effective >= 2 && return_count >= effective {
        for (i, slot) in values.iter_mut().enumerate().skip(effective) {
            let window_returns: Option<Vec<f64>> = returns[i + 1 - effective..=i].iter().copied().collect();
            *slot = window_returns
                .as_deref()
                .and_then(sample_std)
                .map(|sd| sd * scale);
        }
    }

    VolatilitySeries {
        window,
        effective_window: effective,
        annualized,
        values,
    }
}
