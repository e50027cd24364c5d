//! Daily percentage returns and signal-driven strategy returns.

use super::signal::Signal;

/// (C[i] - C[i-1]) / C[i-1]. Row 0, and any row after a zero close, is `None`.
pub fn pct_change(closes: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(closes.len());
    if closes.is_empty() {
        return out;
    }
    out.push(None);
    for w in closes.windows(2) {
        let (prev, curr) = (w[0], w[1]);
        out.push(if prev != 0.0 { Some((curr - prev) / prev) } else { None });
    }
    out
}

/// Percentage change with undefined rows (including the first) set to 0.
pub fn daily_returns(closes: &[f64]) -> Vec<f64> {
    pct_change(closes)
        .into_iter()
        .map(|r| r.unwrap_or(0.0))
        .collect()
}

/// Yesterday's signal times today's return. Row 0 has no prior signal.
pub fn strategy_returns(signal: &[Signal], daily: &[f64]) -> Vec<Option<f64>> {
    (0..daily.len())
        .map(|i| {
            if i == 0 {
                None
            } else {
                signal.get(i - 1).map(|s| s.exposure() * daily[i])
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn first_daily_return_is_zero() {
        let r = daily_returns(&[100.0, 110.0, 99.0]);
        assert_eq!(r[0], 0.0);
        assert_relative_eq!(r[1], 0.10, epsilon = 1e-12);
        assert_relative_eq!(r[2], -0.10, epsilon = 1e-12);
    }

    #[test]
    fn constant_prices_have_zero_returns() {
        assert!(daily_returns(&[5.0; 10]).iter().all(|r| *r == 0.0));
    }

    #[test]
    fn zero_previous_close_is_undefined() {
        assert_eq!(pct_change(&[0.0, 1.0]), vec![None, None]);
        assert!(pct_change(&[]).is_empty());
    }

    #[test]
    fn strategy_uses_previous_signal() {
        let signal = [Signal::Long, Signal::Short, Signal::Flat];
        let daily = [0.0, 0.02, 0.03];
        let out = strategy_returns(&signal, &daily);
        assert_eq!(out[0], None);
        assert_relative_eq!(out[1].unwrap(), 0.02, epsilon = 1e-12);
        assert_relative_eq!(out[2].unwrap(), -0.03, epsilon = 1e-12);
    }
}
