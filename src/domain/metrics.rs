//! Risk/return summary of a daily return series.

use crate::domain::indicator::{mean, sample_std, TRADING_DAYS_PER_YEAR};

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioMetrics {
    /// ((1 + mean daily) ^ 252 - 1) × 100
    pub annualized_return: f64,
    /// stddev(daily) × sqrt(252) × 100
    pub volatility: f64,
    /// mean / stddev × sqrt(252), zero risk-free rate. `None` when the
    /// stddev is zero or there are fewer than two returns.
    pub sharpe_ratio: Option<f64>,
    /// Compounded return over the whole series, in percent.
    pub total_return: f64,
    /// Largest peak-to-trough fall of the compounded curve, in percent.
    pub max_drawdown: f64,
    pub trading_days: usize,
}

impl PortfolioMetrics {
    pub fn compute(daily_returns: &[f64]) -> Self {
        if daily_returns.is_empty() {
            return Self {
                annualized_return: 0.0,
                volatility: 0.0,
                sharpe_ratio: None,
                total_return: 0.0,
                max_drawdown: 0.0,
                trading_days: 0,
            };
        }

        let avg = mean(daily_returns);
        let std = sample_std(daily_returns);

        let annualized_return = ((1.0 + avg).powf(TRADING_DAYS_PER_YEAR) - 1.0) * 100.0;
        let volatility = std.unwrap_or(0.0) * TRADING_DAYS_PER_YEAR.sqrt() * 100.0;
        let sharpe_ratio = std
            .filter(|sd| *sd > 0.0)
            .map(|sd| avg / sd * TRADING_DAYS_PER_YEAR.sqrt());

        let total_return =
            (daily_returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0) * 100.0;

        Self {
            annualized_return,
            volatility,
            sharpe_ratio,
            total_return,
            max_drawdown: compute_drawdown(daily_returns) * 100.0,
            trading_days: daily_returns.len(),
        }
    }
}

/// Maximum drawdown as a fraction of the running peak of the growth curve.
fn compute_drawdown(daily_returns: &[f64]) -> f64 {
    let mut equity = 1.0_f64;
    let mut peak = 1.0_f64;
    let mut max_dd = 0.0_f64;

    for r in daily_returns {
        equity *= 1.0 + r;
        if equity > peak {
            peak = equity;
        } else if peak > 0.0 {
            let dd = (peak - equity) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd
}
