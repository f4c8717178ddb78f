use crate::models::Candle;
use crate::settings::IndicatorConfig;

use super::awesome::calculate_awesome_oscillator;
use super::macd::calculate_macd;
use super::moving_average::calculate_sma_series;
use super::rsi::calculate_rsi_series;

/// Indicator values at a single candle index
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IndicatorRow {
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub rsi: Option<f64>,
    pub sma_short: Option<f64>,
    pub sma_long: Option<f64>,
    pub awesome: Option<f64>,
}

/// Derived series aligned by index with the source candles
///
/// `None` marks insufficient history; it is never replaced by a number.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndicatorFrame {
    pub macd: Vec<Option<f64>>,
    pub macd_signal: Vec<Option<f64>>,
    pub rsi: Vec<Option<f64>>,
    pub sma_short: Vec<Option<f64>>,
    pub sma_long: Vec<Option<f64>>,
    pub awesome: Vec<Option<f64>>,
}

impl IndicatorFrame {
    pub fn len(&self) -> usize {
        self.macd.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macd.is_empty()
    }

    /// Values at `index`, or `None` past the end of the frame
    pub fn row(&self, index: usize) -> Option<IndicatorRow> {
        if index >= self.len() {
            return None;
        }

        Some(IndicatorRow {
            macd: self.macd[index],
            macd_signal: self.macd_signal[index],
            rsi: self.rsi[index],
            sma_short: self.sma_short[index],
            sma_long: self.sma_long[index],
            awesome: self.awesome[index],
        })
    }
}

/// Pure transformation from candles to an [`IndicatorFrame`]
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    config: IndicatorConfig,
}

impl IndicatorEngine {
    pub fn new(config: IndicatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IndicatorConfig {
        &self.config
    }

    pub fn compute(&self, candles: &[Candle]) -> IndicatorFrame {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        self.compute_from_closes(&closes)
    }

    pub fn compute_from_closes(&self, closes: &[f64]) -> IndicatorFrame {
        let cfg = &self.config;
        let macd = calculate_macd(
            closes,
            cfg.fast_period,
            cfg.slow_period,
            cfg.signal_period,
        );

        IndicatorFrame {
            macd: macd.line.into_iter().map(Some).collect(),
            macd_signal: macd.signal.into_iter().map(Some).collect(),
            rsi: calculate_rsi_series(closes, cfg.momentum_period),
            sma_short: calculate_sma_series(closes, cfg.sma_short_period),
            sma_long: calculate_sma_series(closes, cfg.sma_long_period),
            awesome: calculate_awesome_oscillator(
                closes,
                cfg.ao_short_period,
                cfg.ao_long_period,
            ),
        }
    }
}
