// Bot configuration
// Layered: built-in defaults, optional TOML file, OPTIONBOT__* environment variables

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::models::AccountMode;

const ENV_PREFIX: &str = "OPTIONBOT";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Indicator periods and thresholds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndicatorConfig {
    pub fast_period: usize,
    pub slow_period: usize,
    pub signal_period: usize,
    pub momentum_period: usize,
    pub oversold: f64,
    pub overbought: f64,
    pub ao_short_period: usize,
    pub ao_long_period: usize,
    pub sma_short_period: usize,
    pub sma_long_period: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
            momentum_period: 14,
            oversold: 30.0,
            overbought: 70.0,
            ao_short_period: 5,
            ao_long_period: 34,
            sma_short_period: 14,
            sma_long_period: 26,
        }
    }
}

impl IndicatorConfig {
    /// History the slowest indicator needs before the evaluator scores anything
    ///
    /// The signal period is not part of this: the signal line is seeded
    /// from the first trend value and never has a gap.
    pub fn required_history(&self) -> usize {
        [
            self.fast_period,
            self.slow_period,
            self.momentum_period,
            self.ao_long_period,
            self.sma_long_period,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        let periods = [
            ("fast_period", self.fast_period),
            ("slow_period", self.slow_period),
            ("signal_period", self.signal_period),
            ("momentum_period", self.momentum_period),
            ("ao_short_period", self.ao_short_period),
            ("ao_long_period", self.ao_long_period),
            ("sma_short_period", self.sma_short_period),
            ("sma_long_period", self.sma_long_period),
        ];
        if let Some((name, _)) = periods.iter().find(|(_, p)| *p == 0) {
            return Err(SettingsError::Invalid(format!("{} must be positive", name)));
        }

        let pairs = [
            ("fast_period", self.fast_period, "slow_period", self.slow_period),
            (
                "ao_short_period",
                self.ao_short_period,
                "ao_long_period",
                self.ao_long_period,
            ),
            (
                "sma_short_period",
                self.sma_short_period,
                "sma_long_period",
                self.sma_long_period,
            ),
        ];
        for (short_name, short, long_name, long) in pairs {
            if short >= long {
                return Err(SettingsError::Invalid(format!(
                    "{} ({}) must be shorter than {} ({})",
                    short_name, short, long_name, long
                )));
            }
        }

        let in_range = |v: f64| (0.0..=100.0).contains(&v);
        if !in_range(self.oversold) || !in_range(self.overbought) {
            return Err(SettingsError::Invalid(
                "momentum thresholds must lie within 0..=100".to_string(),
            ));
        }
        if self.oversold >= self.overbought {
            return Err(SettingsError::Invalid(format!(
                "oversold ({}) must be below overbought ({})",
                self.oversold, self.overbought
            )));
        }

        Ok(())
    }
}

/// Immutable bot configuration, passed to each component at construction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BotConfig {
    pub asset: String,
    /// Candle duration in seconds
    pub interval_secs: u64,
    /// Trade duration in candles
    pub trade_duration: u64,
    pub stake: f64,
    pub account_mode: AccountMode,
    /// Candles requested per cycle
    pub window_size: usize,
    pub indicators: IndicatorConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            asset: "EURUSD".to_string(),
            interval_secs: 60,
            trade_duration: 1,
            stake: 10.0,
            account_mode: AccountMode::Demo,
            window_size: 100,
            indicators: IndicatorConfig::default(),
        }
    }
}

impl BotConfig {
    /// Load defaults, then the optional file, then environment overrides
    ///
    /// Environment keys use `__` between levels, e.g.
    /// `OPTIONBOT__INDICATORS__MOMENTUM_PERIOD=10`.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings: BotConfig = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse a TOML document on top of the defaults
    pub fn from_toml(contents: &str) -> Result<Self, SettingsError> {
        let settings: BotConfig = config::Config::builder()
            .add_source(config::File::from_str(contents, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.asset.trim().is_empty() {
            return Err(SettingsError::Invalid("asset must not be empty".to_string()));
        }
        if self.interval_secs == 0 {
            return Err(SettingsError::Invalid(
                "interval_secs must be positive".to_string(),
            ));
        }
        if self.trade_duration == 0 {
            return Err(SettingsError::Invalid(
                "trade_duration must be positive".to_string(),
            ));
        }
        if !self.stake.is_finite() || self.stake <= 0.0 {
            return Err(SettingsError::Invalid(format!(
                "stake must be a positive amount, got {}",
                self.stake
            )));
        }

        self.indicators.validate()?;

        // Evaluation index is window_size - 2 and must reach required_history
        let min_window = self.indicators.required_history() + 2;
        if self.window_size < min_window {
            return Err(SettingsError::Invalid(format!(
                "window_size {} can never be evaluated, need at least {}",
                self.window_size, min_window
            )));
        }

        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn expiry_secs(&self) -> u64 {
        self.trade_duration * self.interval_secs
    }
}
