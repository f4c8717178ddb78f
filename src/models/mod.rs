use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::settings::BotConfig;

/// OHLCV candlestick for one fixed-duration interval
///
/// Broker payloads name the open time `start` and send it as unix seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candle {
    #[serde(with = "chrono::serde::ts_seconds", alias = "start")]
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl Candle {
    fn prices_are_finite(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|p| p.is_finite())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SeriesError {
    #[error("candle series is empty")]
    Empty,
    #[error("candle {index} is not after the previous candle ({timestamp})")]
    NotAscending {
        index: usize,
        timestamp: DateTime<Utc>,
    },
    #[error("candle {index} has a non-finite price")]
    NonFinitePrice { index: usize },
}

/// Candles in strictly ascending timestamp order
///
/// The last candle may still be forming.
#[derive(Debug, Clone)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(candles: Vec<Candle>) -> Result<Self, SeriesError> {
        if candles.is_empty() {
            return Err(SeriesError::Empty);
        }

        for (index, candle) in candles.iter().enumerate() {
            if !candle.prices_are_finite() {
                return Err(SeriesError::NonFinitePrice { index });
            }
        }

        for (offset, pair) in candles.windows(2).enumerate() {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(SeriesError::NotAscending {
                    index: offset + 1,
                    timestamp: pair[1].timestamp,
                });
            }
        }

        Ok(Self { candles })
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }
}

/// Trade direction accepted by the broker
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Call,
    Put,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Call => "call",
            Direction::Put => "put",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trading signal produced once per cycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    Call,
    Put,
    NoAction,
}

impl Signal {
    /// Direction to trade, `None` for `NoAction`
    pub fn direction(&self) -> Option<Direction> {
        match self {
            Signal::Call => Some(Direction::Call),
            Signal::Put => Some(Direction::Put),
            Signal::NoAction => None,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Signal::Call => "CALL",
            Signal::Put => "PUT",
            Signal::NoAction => "NO_ACTION",
        })
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AccountMode {
    #[default]
    Demo,
    Real,
}

impl AccountMode {
    pub fn is_demo(&self) -> bool {
        matches!(self, AccountMode::Demo)
    }
}

impl fmt::Display for AccountMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.is_demo() { "demo" } else { "real" })
    }
}

/// Order handed to the trade sink, built and consumed within one cycle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeRequest {
    pub asset: String,
    pub direction: Direction,
    pub stake: f64,
    pub expiry_secs: u64,
    pub account_mode: AccountMode,
}

impl TradeRequest {
    pub fn from_config(config: &BotConfig, direction: Direction) -> Self {
        Self {
            asset: config.asset.clone(),
            direction,
            stake: config.stake,
            expiry_secs: config.expiry_secs(),
            account_mode: config.account_mode,
        }
    }
}
