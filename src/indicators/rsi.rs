/// Calculate the momentum oscillator (RSI) for every index of `prices`
///
/// Each defined value averages the last `period` price changes with a plain
/// mean (not Wilder smoothing):
///
/// - RSI > 70: Overbought
/// - RSI < 30: Oversold
///
/// Index `k` is defined from `k = period` on. A window without any losing
/// change has no finite ratio and yields `None` rather than 100.
pub fn calculate_rsi_series(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut series = vec![None; prices.len()];
    if period == 0 || prices.len() <= period {
        return series;
    }

    for end in period..prices.len() {
        let mut gains = 0.0;
        let mut losses = 0.0;
        for pair in prices[end - period..=end].windows(2) {
            let change = pair[1] - pair[0];
            if change > 0.0 {
                gains += change;
            } else {
                losses += change.abs();
            }
        }

        let avg_gain = gains / period as f64;
        let avg_loss = losses / period as f64;
        series[end] = rsi_from_averages(avg_gain, avg_loss);
    }

    series
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss <= 0.0 {
        return None;
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - (100.0 / (1.0 + rs)))
}
