// Core modules
pub mod execution;
pub mod indicators;
pub mod models;
pub mod settings;
pub mod strategy;

// Re-export commonly used types
pub use models::*;
pub use settings::{BotConfig, IndicatorConfig, SettingsError};
pub use strategy::Strategy;

// Error handling
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
