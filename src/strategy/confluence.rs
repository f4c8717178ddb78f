use super::{signals::SignalEvaluator, Evaluation, Strategy};
use crate::indicators::IndicatorEngine;
use crate::models::Candle;
use crate::settings::IndicatorConfig;

/// Three-indicator confluence strategy for short-expiry options
///
/// Votes with:
/// - MACD line crossing its signal line
/// - RSI oversold/overbought levels
/// - Short SMA crossing the long SMA
///
/// Trades only when two of the three agree.
#[derive(Debug, Clone)]
pub struct ConfluenceStrategy {
    engine: IndicatorEngine,
    evaluator: SignalEvaluator,
}

impl ConfluenceStrategy {
    pub fn new(config: IndicatorConfig) -> Self {
        Self {
            engine: IndicatorEngine::new(config.clone()),
            evaluator: SignalEvaluator::new(config),
        }
    }
}

impl Default for ConfluenceStrategy {
    fn default() -> Self {
        Self::new(IndicatorConfig::default())
    }
}

impl Strategy for ConfluenceStrategy {
    fn evaluate(&self, candles: &[Candle]) -> Evaluation {
        let frame = self.engine.compute(candles);
        self.evaluator.evaluate(candles, &frame)
    }

    fn name(&self) -> &str {
        "ConfluenceStrategy"
    }

    fn min_candles_required(&self) -> usize {
        // Evaluation index is len - 2
        self.evaluator.required_history() + 2
    }
}
