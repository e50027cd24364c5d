//! RSI (Relative Strength Index).
//!
//! avg_gain / avg_loss are simple means of the positive / negative close deltas
//! over the last n deltas. RSI = 100 - 100 / (1 + avg_gain / avg_loss).
//!
//! Zero average loss reports 100, or 50 when there was no gain either (flat
//! prices). The first n rows are undefined.

pub fn calculate_rsi(closes: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut values = vec![None; closes.len()];
    if window == 0 || closes.len() <= window {
        return values;
    }

    let mut gains = Vec::with_capacity(closes.len() - 1);
    let mut losses = Vec::with_capacity(closes.len() - 1);
    for w in closes.windows(2) {
        let change = w[1] - w[0];
        gains.push(if change > 0.0 { change } else { 0.0 });
        losses.push(if change < 0.0 { -change } else { 0.0 });
    }

    // values[i] uses deltas ending at close i, i.e. gains[i - window..i]
    for (i, slot) in values.iter_mut().enumerate().skip(window) {
        let avg_gain = gains[i - window..i].iter().sum::<f64>() / window as f64;
        let avg_loss = losses[i - window..i].iter().sum::<f64>() / window as f64;
        *slot = Some(rsi_value(avg_gain, avg_loss));
    }

    values
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 { 50.0 } else { 100.0 }
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}
