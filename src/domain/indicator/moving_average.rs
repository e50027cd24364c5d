//! Simple moving average with back-filled warmup.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]). The first n-1 rows have no value of their
//! own and take the first defined value, so the column has no gaps.

use super::rolling_mean;

/// `None` when the series is shorter than `window` (nothing to back-fill from).
pub fn backfilled_sma(closes: &[f64], window: usize) -> Option<Vec<f64>> {
    if window == 0 || closes.len() < window {
        return None;
    }

    let rolled = rolling_mean(closes, window);
    let first = rolled[window - 1]?;

    Some(rolled.into_iter().map(|v| v.unwrap_or(first)).collect())
}
