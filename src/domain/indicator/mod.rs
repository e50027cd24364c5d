//! Technical indicator formulas.
//!
//! Each submodule is a pure function over closing prices (or over columns
//! derived from them). Undefined leading values during a window's warmup are
//! `None`; [`crate::domain::analyzer`] decides how they are surfaced.

pub mod bollinger;
pub mod moving_average;
pub mod returns;
pub mod rsi;
pub mod signal;
pub mod volatility;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

pub(crate) fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (divides by n - 1). `None` below two values.
pub(crate) fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let variance = values
        .iter()
        .map(|v| {
            let diff = v - m;
            diff * diff
        })
        .sum::<f64>()
        / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Rolling mean; position `i` is defined once `window` values are available.
pub(crate) fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let warmup = window.saturating_sub(1);
    (0..values.len())
        .map(|i| {
            if window == 0 || i < warmup {
                None
            } else {
                Some(mean(&values[i + 1 - window..=i]))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sample_std_known_values() {
        // mean 5, squared deviations sum 32, n-1 = 7
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(sample_std(&v).unwrap(), (32.0_f64 / 7.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn sample_std_needs_two_values() {
        assert!(sample_std(&[1.0]).is_none());
    }

    #[test]
    fn rolling_mean_warmup() {
        let out = rolling_mean(&[1.0, 2.0, 3.0, 4.0], 3);
        assert_eq!(out, vec![None, None, Some(2.0), Some(3.0)]);
    }

    #[test]
    fn rolling_mean_zero_window_is_undefined() {
        assert!(rolling_mean(&[1.0, 2.0], 0).iter().all(Option::is_none));
    }
}
