// Technical indicators module
// Implements MACD, RSI, SMA/EMA and the awesome oscillator as index-aligned series

pub mod awesome;
pub mod frame;
pub mod macd;
pub mod moving_average;
pub mod rsi;

pub use awesome::calculate_awesome_oscillator;
pub use frame::{IndicatorEngine, IndicatorFrame, IndicatorRow};
pub use macd::{calculate_macd, MacdSeries};
pub use moving_average::{calculate_ema_series, calculate_sma_series};
pub use rsi::calculate_rsi_series;
