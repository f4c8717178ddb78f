use super::moving_average::calculate_ema_series;

/// MACD trend oscillator output, aligned by index with the input prices
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    /// fast EMA - slow EMA
    pub line: Vec<f64>,
    /// EMA of `line`
    pub signal: Vec<f64>,
}

/// Calculate the MACD line and its signal line
///
/// Both EMAs are seeded with the first price, so the output has no warm-up gap.
pub fn calculate_macd(
    prices: &[f64],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> MacdSeries {
    let fast = calculate_ema_series(prices, fast_period);
    let slow = calculate_ema_series(prices, slow_period);

    let line: Vec<f64> = fast.iter().zip(slow.iter()).map(|(f, s)| f - s).collect();
    let signal = calculate_ema_series(&line, signal_period);

    MacdSeries { line, signal }
}
