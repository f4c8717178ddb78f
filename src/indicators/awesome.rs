use super::moving_average::{calculate_sma_series, subtract_series};

/// Awesome oscillator on closing prices: SMA(short) - SMA(long)
///
/// Defined wherever the long SMA is defined.
pub fn calculate_awesome_oscillator(
    prices: &[f64],
    short_period: usize,
    long_period: usize,
) -> Vec<Option<f64>> {
    let short = calculate_sma_series(prices, short_period);
    let long = calculate_sma_series(prices, long_period);
    subtract_series(&short, &long)
}
