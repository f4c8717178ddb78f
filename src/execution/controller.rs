use std::fmt;

use super::broker::TradeSink;
use super::feed::CandleSource;
use super::scheduler::{Shutdown, Sleeper};
use crate::models::{CandleSeries, Signal, TradeRequest};
use crate::settings::BotConfig;
use crate::strategy::{validate_candle_spacing, ConfluenceStrategy, EvaluationStatus, Strategy};

#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("authentication failed: {0}")]
    Authentication(String),
}

/// Where the controller is within a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    AwaitingData,
    DataReady,
    Decided,
    Idle,
}

/// Result of one fetch-evaluate-trade cycle
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Evaluation ran; `trade_id` is set when a trade was accepted
    Completed {
        signal: Signal,
        trade_id: Option<String>,
    },
    InsufficientHistory {
        required: usize,
        available: usize,
    },
    /// The candle source returned nothing
    FetchFailure,
    /// The trade sink did not return an acceptance id
    TradeRejected { signal: Signal, reason: String },
    UnexpectedFault(String),
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleOutcome::Completed {
                signal,
                trade_id: Some(id),
            } => write!(f, "{} placed ({})", signal, id),
            CycleOutcome::Completed { signal, .. } => write!(f, "{}", signal),
            CycleOutcome::InsufficientHistory {
                required,
                available,
            } => write!(f, "insufficient history ({}/{})", available, required),
            CycleOutcome::FetchFailure => f.write_str("fetch failure"),
            CycleOutcome::TradeRejected { signal, .. } => write!(f, "{} rejected", signal),
            CycleOutcome::UnexpectedFault(e) => write!(f, "unexpected fault: {}", e),
        }
    }
}

/// Tally of cycle outcomes over one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub trades_placed: u64,
    pub trades_rejected: u64,
    pub no_action: u64,
    pub insufficient_history: u64,
    pub fetch_failures: u64,
    pub faults: u64,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &CycleOutcome) {
        self.cycles += 1;
        match outcome {
            CycleOutcome::Completed {
                trade_id: Some(_), ..
            } => self.trades_placed += 1,
            CycleOutcome::Completed { .. } => self.no_action += 1,
            CycleOutcome::InsufficientHistory { .. } => self.insufficient_history += 1,
            CycleOutcome::FetchFailure => self.fetch_failures += 1,
            CycleOutcome::TradeRejected { .. } => self.trades_rejected += 1,
            CycleOutcome::UnexpectedFault(_) => self.faults += 1,
        }
    }
}

/// Drives the periodic evaluation loop
///
/// One evaluation and at most one trade submission per interval. Nothing but
/// the configuration carries over from one cycle to the next.
pub struct CycleController<S, T, Z> {
    config: BotConfig,
    strategy: Box<dyn Strategy>,
    source: S,
    sink: T,
    sleeper: Z,
    shutdown: Shutdown,
    state: CycleState,
}

impl<S, T, Z> CycleController<S, T, Z>
where
    S: CandleSource,
    T: TradeSink,
    Z: Sleeper,
{
    pub fn new(config: BotConfig, source: S, sink: T, sleeper: Z) -> Self {
        let strategy = Box::new(ConfluenceStrategy::new(config.indicators.clone()));
        Self {
            config,
            strategy,
            source,
            sink,
            sleeper,
            shutdown: Shutdown::new(),
            state: CycleState::Idle,
        }
    }

    pub fn with_strategy(mut self, strategy: Box<dyn Strategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn sink(&self) -> &T {
        &self.sink
    }

    pub fn sleeper(&self) -> &Z {
        &self.sleeper
    }

    /// Authenticate, then run the loop
    ///
    /// Authentication failure is the only error that stops the bot; it is
    /// returned before any cycle runs.
    pub async fn start(&mut self, max_cycles: Option<u64>) -> Result<RunSummary, BotError> {
        if let Err(e) = self.sink.authenticate().await {
            tracing::error!("Login failed. Check credentials or network status: {}", e);
            return Err(BotError::Authentication(e.to_string()));
        }

        tracing::info!(
            "Login successful. Starting trading loop on {} ({} via {})",
            self.config.asset,
            self.config.account_mode,
            self.strategy.name()
        );

        Ok(self.run(max_cycles).await)
    }

    /// Run cycles until shutdown is triggered or `max_cycles` is reached
    pub async fn run(&mut self, max_cycles: Option<u64>) -> RunSummary {
        let mut summary = RunSummary::default();
        let interval = self.config.interval();

        loop {
            if self.shutdown.is_triggered() {
                tracing::info!("Shutdown requested, stopping before the next cycle");
                break;
            }
            if max_cycles.is_some_and(|max| summary.cycles >= max) {
                break;
            }

            let outcome = self.run_cycle().await;
            tracing::debug!(outcome = %outcome, "Cycle finished");
            summary.record(&outcome);

            tracing::info!(
                "Waiting for {} seconds until the next check...",
                interval.as_secs()
            );
            self.sleeper.sleep(interval).await;
        }

        summary
    }

    /// Run one cycle: fetch, evaluate, maybe trade
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        self.transition(CycleState::AwaitingData);
        let outcome = self.execute_cycle().await;
        self.transition(CycleState::Idle);
        outcome
    }

    async fn execute_cycle(&mut self) -> CycleOutcome {
        let candles = match self
            .source
            .fetch_candles(
                &self.config.asset,
                self.config.interval_secs,
                self.config.window_size,
            )
            .await
        {
            Ok(candles) if candles.is_empty() => {
                tracing::error!("Failed to fetch candles. Check asset name or API connection.");
                return CycleOutcome::FetchFailure;
            }
            Ok(candles) => candles,
            Err(e) => return Self::fault(format!("candle fetch failed: {}", e)),
        };

        let series = match CandleSeries::new(candles) {
            Ok(series) => series,
            Err(e) => return Self::fault(format!("malformed candle data: {}", e)),
        };

        if let Err(e) = validate_candle_spacing(series.candles(), self.config.interval_secs) {
            tracing::warn!("{}", e);
        }
        self.transition(CycleState::DataReady);

        let evaluation = self.strategy.evaluate(series.candles());
        self.transition(CycleState::Decided);

        if let EvaluationStatus::InsufficientData {
            required,
            available,
        } = evaluation.status
        {
            tracing::info!(
                "Insufficient data (need {} candles, have {}).",
                required,
                available
            );
            return CycleOutcome::InsufficientHistory {
                required,
                available,
            };
        }

        tracing::info!(
            call = evaluation.bull_score,
            put = evaluation.bear_score,
            decision = %evaluation.signal,
            "Signal Check: CALL={}, PUT={} | Decision: {} ({})",
            evaluation.bull_score,
            evaluation.bear_score,
            evaluation.signal,
            evaluation.reasons()
        );

        let Some(direction) = evaluation.signal.direction() else {
            tracing::info!("No strong signal found. Waiting for next check.");
            return CycleOutcome::Completed {
                signal: Signal::NoAction,
                trade_id: None,
            };
        };

        tracing::info!("Strong signal found: {}! Placing trade...", evaluation.signal);
        let request = TradeRequest::from_config(&self.config, direction);
        self.place_trade(evaluation.signal, &request).await
    }

    async fn place_trade(&self, signal: Signal, request: &TradeRequest) -> CycleOutcome {
        match self.sink.submit_trade(request).await {
            Ok(receipt) => match receipt.id() {
                Some(id) => {
                    tracing::info!(
                        trade_id = %id,
                        "Trade successfully placed (ID: {}) on {}. Duration: {}s.",
                        id,
                        request.asset,
                        request.expiry_secs
                    );
                    CycleOutcome::Completed {
                        signal,
                        trade_id: Some(id.to_string()),
                    }
                }
                None => {
                    tracing::error!("Trade failed to place. Response: {}", receipt.raw());
                    CycleOutcome::TradeRejected {
                        signal,
                        reason: format!("no trade id in response {}", receipt.raw()),
                    }
                }
            },
            Err(e) => {
                tracing::error!("Trade failed to place. Error: {}", e);
                CycleOutcome::TradeRejected {
                    signal,
                    reason: e.to_string(),
                }
            }
        }
    }

    fn fault(message: String) -> CycleOutcome {
        tracing::error!("An unexpected error occurred during execution: {}", message);
        CycleOutcome::UnexpectedFault(message)
    }

    fn transition(&mut self, next: CycleState) {
        tracing::trace!(from = ?self.state, to = ?next, "Cycle state");
        self.state = next;
    }
}
