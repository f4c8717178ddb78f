use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;

use crate::models::Candle;
use crate::Result;

/// Source of candles for one asset and interval
pub trait CandleSource: Send + Sync {
    /// Fetch the most recent `count` candles, oldest first
    ///
    /// The last candle may still be forming. An empty result means the
    /// fetch failed and the cycle should be skipped.
    fn fetch_candles(
        &self,
        asset: &str,
        interval_secs: u64,
        count: usize,
    ) -> impl Future<Output = Result<Vec<Candle>>> + Send;
}

struct FeedState {
    rng: StdRng,
    history: VecDeque<Candle>,
    last_price: f64,
}

/// Seeded random-walk feed for paper trading
///
/// Candles sit on the interval grid. Each fetch appends one candle per
/// interval elapsed since the previous fetch, so repeated fetches within
/// one interval return the same window.
pub struct SyntheticCandleSource {
    state: Mutex<FeedState>,
    volatility: f64,
    base_volume: f64,
}

impl SyntheticCandleSource {
    /// Create a new feed with a seed for reproducibility
    pub fn new(seed: u64, base_price: f64) -> Self {
        Self {
            state: Mutex::new(FeedState {
                rng: StdRng::seed_from_u64(seed),
                history: VecDeque::new(),
                last_price: base_price,
            }),
            volatility: 0.0005,
            base_volume: 1_000.0,
        }
    }

    /// Per-candle relative price noise (default ±0.05%)
    pub fn with_volatility(mut self, volatility: f64) -> Self {
        self.volatility = volatility;
        self
    }

    /// Window of `count` candles as seen at `now`
    pub fn candles_at(
        &self,
        now: DateTime<Utc>,
        interval_secs: u64,
        count: usize,
    ) -> Result<Vec<Candle>> {
        if interval_secs == 0 || count == 0 {
            return Ok(Vec::new());
        }

        let interval = interval_secs as i64;
        let forming_open = Utc
            .timestamp_opt(now.timestamp().div_euclid(interval) * interval, 0)
            .single()
            .ok_or("timestamp out of range")?;
        let step = Duration::seconds(interval);

        let mut state = self.state.lock().map_err(|e| e.to_string())?;

        let last_open = state.history.back().map(|c| c.timestamp);
        let mut next_open = match last_open {
            Some(last) if last >= forming_open => forming_open + step,
            Some(last) if forming_open - last <= step * count as i32 => last + step,
            // First fetch, or the feed was idle longer than a window
            _ => {
                state.history.clear();
                forming_open - step * (count as i32 - 1)
            }
        };

        while next_open <= forming_open {
            let candle = self.next_candle(&mut state, next_open);
            state.history.push_back(candle);
            next_open += step;
        }

        while state.history.len() > count {
            state.history.pop_front();
        }

        Ok(state.history.iter().cloned().collect())
    }

    fn next_candle(&self, state: &mut FeedState, timestamp: DateTime<Utc>) -> Candle {
        let open = state.last_price;
        let change = state.rng.gen_range(-self.volatility..=self.volatility);
        let close = open * (1.0 + change);

        let wick = self.volatility / 2.0;
        let high = open.max(close) * (1.0 + state.rng.gen_range(0.0..=wick));
        let low = open.min(close) * (1.0 - state.rng.gen_range(0.0..=wick));

        // Vary volume ±30%
        let volume = self.base_volume * state.rng.gen_range(0.7..1.3);

        state.last_price = close;
        Candle {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

impl CandleSource for SyntheticCandleSource {
    async fn fetch_candles(
        &self,
        asset: &str,
        interval_secs: u64,
        count: usize,
    ) -> Result<Vec<Candle>> {
        let candles = self.candles_at(Utc::now(), interval_secs, count)?;

        tracing::debug!(
            asset = %asset,
            count = candles.len(),
            "Generated synthetic candles"
        );

        Ok(candles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_first_fetch_fills_window() {
        let feed = SyntheticCandleSource::new(42, 1.1);
        let candles = feed.candles_at(at(6_030), 60, 100).unwrap();

        assert_eq!(candles.len(), 100);
        // Forming candle opened on the last minute boundary
        assert_eq!(candles.last().unwrap().timestamp, at(6_000));
        for pair in candles.windows(2) {
            assert_eq!((pair[1].timestamp - pair[0].timestamp).num_seconds(), 60);
            assert_eq!(pair[1].open, pair[0].close);
        }
    }

    #[test]
    fn test_same_interval_returns_same_window() {
        let feed = SyntheticCandleSource::new(7, 1.1);
        let first = feed.candles_at(at(6_010), 60, 50).unwrap();
        let second = feed.candles_at(at(6_050), 60, 50).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_advances_one_candle_per_interval() {
        let feed = SyntheticCandleSource::new(7, 1.1);
        let first = feed.candles_at(at(6_000), 60, 50).unwrap();
        let second = feed.candles_at(at(6_125), 60, 50).unwrap();

        assert_eq!(second.len(), 50);
        assert_eq!(second.last().unwrap().timestamp, at(6_120));
        // Window slid by two candles
        assert_eq!(second[0], first[2]);
    }

    #[test]
    fn test_long_idle_restarts_window() {
        let feed = SyntheticCandleSource::new(7, 1.1);
        feed.candles_at(at(6_000), 60, 10).unwrap();
        let later = feed.candles_at(at(60_000), 60, 10).unwrap();

        assert_eq!(later.len(), 10);
        assert_eq!(later[0].timestamp, at(60_000 - 9 * 60));
    }

    #[test]
    fn test_seed_is_reproducible() {
        let a = SyntheticCandleSource::new(42, 1.1).candles_at(at(6_000), 60, 30).unwrap();
        let b = SyntheticCandleSource::new(42, 1.1).candles_at(at(6_000), 60, 30).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_ohlc_consistent() {
        let feed = SyntheticCandleSource::new(3, 1.1).with_volatility(0.01);
        for candle in feed.candles_at(at(600_000), 300, 200).unwrap() {
            assert!(candle.high >= candle.open.max(candle.close));
            assert!(candle.low <= candle.open.min(candle.close));
            assert!(candle.volume > 0.0);
        }
    }

    #[tokio::test]
    async fn test_fetch_candles() {
        let feed = SyntheticCandleSource::new(1, 1.1);
        let candles = feed.fetch_candles("EURUSD", 60, 100).await.unwrap();
        assert_eq!(candles.len(), 100);
    }
}
