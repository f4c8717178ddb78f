// Candle collection, trade submission and the cycle loop
pub mod broker;
pub mod controller;
pub mod feed;
pub mod scheduler;

pub use broker::{PaperTradeSink, TradeReceipt, TradeSink};
pub use controller::{BotError, CycleController, CycleOutcome, CycleState, RunSummary};
pub use feed::{CandleSource, SyntheticCandleSource};
pub use scheduler::{Shutdown, Sleeper, TokioSleeper};
