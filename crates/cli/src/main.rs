mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::AppConfig;
use futfan_api::AppState;
use futfan_core::{ExchangeClient, Symbol};
use futfan_engine::{aggregate, summary, FanOutConfig};
use futfan_exchanges_binance::BinanceFuturesClient;
use futfan_exchanges_common::SimulatedExchange;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

/// How long the startup connectivity check may take.
const PING_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Parser)]
#[command(name = "futfan")]
#[command(about = "Binance futures trade proxy: fans requests out across every listed symbol")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Path to the TOML config file
    #[arg(short, long, env = "FUTFAN_CONFIG", default_value = "config/config.toml")]
    config: PathBuf,

    /// API key (overrides server.api_key)
    #[arg(long, env = "FUTFAN_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Secret key (overrides server.secret_key)
    #[arg(long, env = "FUTFAN_SECRET_KEY", hide_env_values = true)]
    secret_key: Option<String>,

    /// Serve from an in-memory exchange with demo data instead of Binance
    #[arg(long, global = true)]
    simulated: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Listen port (overrides server.port)
        #[arg(short, long, env = "FUTFAN_PORT")]
        port: Option<u16>,
    },

    /// List the exchange's futures symbols
    Symbols,

    /// Fetch recent trades for the given symbols concurrently
    Trades {
        /// Symbols to fetch (e.g. BTCUSDT ETHUSDT)
        #[arg(short, long, required = true, num_args = 1..)]
        symbol: Vec<String>,

        /// Trades per symbol
        #[arg(long)]
        limit: Option<u16>,

        /// Cap on concurrent requests
        #[arg(long)]
        max_concurrency: Option<usize>,

        /// Print the full trades as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    if cli.json_logs {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt().with_env_filter(filter).with_target(false).init();
    }

    let config = load_config(&cli)?;
    let exchange = connect(&config, cli.simulated).await?;

    match cli.command {
        Commands::Serve { port } => {
            let port = port.unwrap_or(config.server.port);
            let state = AppState::new(exchange, config.fanout.clone())
                .with_recent_trades_limit(config.exchange.recent_trades_limit);
            futfan_api::start_server(state, &format!("0.0.0.0:{}", port)).await?;
        }
        Commands::Symbols => {
            let symbols = aggregate::all_symbols(exchange.as_ref()).await?;
            for symbol in &symbols {
                println!("{}", symbol);
            }
            println!("{} symbols", symbols.len());
        }
        Commands::Trades {
            symbol,
            limit,
            max_concurrency,
            json,
        } => {
            let fanout = match max_concurrency {
                Some(n) => FanOutConfig {
                    max_concurrency: Some(n.max(1)),
                    ..config.fanout.clone()
                },
                None => config.fanout.clone(),
            };
            let symbols = symbol.into_iter().map(Symbol::from).collect();
            let mut grouped = aggregate::recent_trades_by_symbol(exchange, symbols, limit, &fanout)
                .await
                .context("Failed to fetch trades")?;
            summary::sort_by_symbol(&mut grouped);

            if json {
                println!("{}", serde_json::to_string_pretty(&grouped)?);
            } else {
                for count in summary::trade_counts(&grouped) {
                    println!("  {:<16} {:>6}", count.symbol, count.count);
                }
                println!("  {:<16} {:>6}", "TOTAL", summary::total_trades(&grouped));
            }
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match AppConfig::load(&cli.config) {
        Ok(config) => config,
        Err(_) if cli.simulated && !cli.config.exists() => {
            tracing::warn!(path = %cli.config.display(), "No config file, using defaults");
            AppConfig::default()
        }
        Err(e) => return Err(e),
    };

    if let Some(key) = &cli.api_key {
        config.server.api_key = key.clone();
    }
    if let Some(secret) = &cli.secret_key {
        config.server.secret_key = secret.clone();
    }
    tracing::debug!(?config, "Loaded configuration");
    Ok(config)
}

/// Build the exchange client and check it is reachable.
async fn connect(config: &AppConfig, simulated: bool) -> Result<Arc<dyn ExchangeClient>> {
    if simulated {
        tracing::info!("Using simulated exchange with demo data");
        return Ok(Arc::new(SimulatedExchange::with_demo_data()));
    }

    if config.server.api_key.is_empty() || config.server.secret_key.is_empty() {
        tracing::warn!("API credentials missing; account endpoints will be rejected");
    }

    let client = BinanceFuturesClient::new(config.binance())?;
    tokio::time::timeout(PING_TIMEOUT, client.ping())
        .await
        .context("Exchange ping timed out")?
        .context("Exchange ping failed")?;
    tracing::info!(base_url = %client.config().base_url, "Connected to exchange");

    Ok(Arc::new(client))
}
