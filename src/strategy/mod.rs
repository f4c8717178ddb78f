// Trading strategy module
pub mod confluence;
pub mod signals;

use crate::models::Candle;

pub use confluence::ConfluenceStrategy;
pub use signals::{
    decide, validate_candle_spacing, Bias, Evaluation, EvaluationStatus, Evidence, SignalEvaluator,
};

/// Base trait for all trading strategies
pub trait Strategy: Send + Sync {
    /// Score a candle window whose newest candle may still be forming
    fn evaluate(&self, candles: &[Candle]) -> Evaluation;

    /// Get strategy name
    fn name(&self) -> &str;

    /// Minimum candles required before the strategy can score anything
    fn min_candles_required(&self) -> usize;
}
