use clap::Parser;
use optionbot::execution::{
    CycleController, PaperTradeSink, Shutdown, SyntheticCandleSource, TokioSleeper,
};
use optionbot::settings::BotConfig;
use optionbot::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// Synthetic feed starting price (EURUSD-like)
const PAPER_BASE_PRICE: f64 = 1.1;

/// Periodic MACD/RSI/SMA confluence bot for short-expiry options
#[derive(Parser, Debug)]
#[command(name = "optionbot", version)]
struct Cli {
    /// TOML settings file, layered over defaults and under OPTIONBOT__* env vars
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for the synthetic candle feed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Stop after this many cycles (runs until Ctrl+C if omitted)
    #[arg(long)]
    max_cycles: Option<u64>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "optionbot=info")]
    log_filter: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    setup_logging(&cli.log_filter);

    tracing::info!("🚀 OptionBot starting");

    let config = BotConfig::load(cli.config.as_deref())?;
    tracing::info!(
        "📋 Config: asset={} interval={}s expiry={}s stake={:.2} account={} window={}",
        config.asset,
        config.interval_secs,
        config.expiry_secs(),
        config.stake,
        config.account_mode,
        config.window_size
    );
    if !config.account_mode.is_demo() {
        tracing::warn!("⚠️  Account mode is REAL; paper sink still places no live orders");
    }

    let shutdown = Shutdown::new();
    spawn_ctrl_c_listener(shutdown.clone());

    let mut controller = CycleController::new(
        config,
        SyntheticCandleSource::new(cli.seed, PAPER_BASE_PRICE),
        PaperTradeSink::new(),
        TokioSleeper,
    )
    .with_shutdown(shutdown);

    let summary = controller.start(cli.max_cycles).await?;

    tracing::info!(
        "✅ Stopped after {} cycles: {} placed, {} rejected, {} no action, {} short history, {} fetch failures, {} faults",
        summary.cycles,
        summary.trades_placed,
        summary.trades_rejected,
        summary.no_action,
        summary.insufficient_history,
        summary.fetch_failures,
        summary.faults
    );

    Ok(())
}

fn setup_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn spawn_ctrl_c_listener(shutdown: Shutdown) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("⚠️  Received Ctrl+C, stopping after the current cycle...");
            shutdown.trigger();
        }
    });
}
