//! Indicator kernels over closing prices.
//!
//! Every kernel returns a vector aligned with its input: index `i` of the
//! output is the indicator value at bar `i`, `None` while the look-back
//! window is still filling. The feature builder zips these columns
//! per-bar without any offset arithmetic.

/// Simple Moving Average
pub fn sma(data: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; data.len()];
    if period == 0 || data.len() < period {
        return result;
    }

    let mut window_sum: f64 = data[..period].iter().sum();
    result[period - 1] = Some(window_sum / period as f64);
    for i in period..data.len() {
        window_sum += data[i] - data[i - period];
        result[i] = Some(window_sum / period as f64);
    }
    result
}

/// Exponential Moving Average, seeded with the SMA of the first window.
pub fn ema(data: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; data.len()];
    if period == 0 || data.len() < period {
        return result;
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut value: f64 = data[..period].iter().sum::<f64>() / period as f64;
    result[period - 1] = Some(value);
    for i in period..data.len() {
        value = (data[i] - value) * multiplier + value;
        result[i] = Some(value);
    }
    result
}

/// Relative Strength Index with Wilder smoothing.
pub fn rsi(data: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; data.len()];
    if period == 0 || data.len() < period + 1 {
        return result;
    }

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for i in 1..=period {
        let change = data[i] - data[i - 1];
        if change > 0.0 {
            avg_gain += change;
        } else {
            avg_loss += change.abs();
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;
    result[period] = Some(rsi_from_averages(avg_gain, avg_loss));

    for i in period + 1..data.len() {
        let change = data[i] - data[i - 1];
        let (gain, loss) = if change > 0.0 {
            (change, 0.0)
        } else {
            (0.0, change.abs())
        };
        avg_gain = (avg_gain * (period - 1) as f64 + gain) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + loss) / period as f64;
        result[i] = Some(rsi_from_averages(avg_gain, avg_loss));
    }
    result
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// MACD line and its signal line, both input-aligned.
pub struct MacdOutput {
    pub macd: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
}

pub fn macd(
    data: &[f64],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> MacdOutput {
    let mut out = MacdOutput {
        macd: vec![None; data.len()],
        signal: vec![None; data.len()],
    };
    if fast_period == 0 || signal_period == 0 || slow_period <= fast_period {
        return out;
    }

    let ema_fast = ema(data, fast_period);
    let ema_slow = ema(data, slow_period);
    for i in 0..data.len() {
        if let (Some(fast), Some(slow)) = (ema_fast[i], ema_slow[i]) {
            out.macd[i] = Some(fast - slow);
        }
    }

    // Signal line: EMA of the defined MACD suffix, re-aligned to the input.
    if let Some(start) = out.macd.iter().position(Option::is_some) {
        let macd_values: Vec<f64> = out.macd[start..].iter().map(|v| v.unwrap()).collect();
        let signal_suffix = ema(&macd_values, signal_period);
        for (offset, value) in signal_suffix.into_iter().enumerate() {
            out.signal[start + offset] = value;
        }
    }
    out
}
