/// Calculate Simple Moving Average (SMA) for every index of `prices`
///
/// The window includes the current price, so index `k` is defined once
/// `k + 1 >= period`. Earlier indices are `None`.
pub fn calculate_sma_series(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut series = vec![None; prices.len()];
    if period == 0 {
        return series;
    }

    for end in period..=prices.len() {
        let sum: f64 = prices[end - period..end].iter().sum();
        series[end - 1] = Some(sum / period as f64);
    }

    series
}

/// Calculate Exponential Moving Average (EMA) for every index of `prices`
///
/// Smoothing factor is `2 / (period + 1)`. The average is seeded with the
/// first price rather than a warm-up SMA, so every index has a value.
pub fn calculate_ema_series(prices: &[f64], period: usize) -> Vec<f64> {
    let multiplier = 2.0 / (period as f64 + 1.0);

    let mut series = Vec::with_capacity(prices.len());
    let mut iter = prices.iter();
    let Some(&first) = iter.next() else {
        return series;
    };

    let mut ema = first;
    series.push(ema);
    for &price in iter {
        ema = price * multiplier + ema * (1.0 - multiplier);
        series.push(ema);
    }

    series
}

/// Difference of two optional series, `None` wherever either side is missing
pub fn subtract_series(a: &[Option<f64>], b: &[Option<f64>]) -> Vec<Option<f64>> {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| Some((*x)? - (*y)?))
        .collect()
}
