//! TOML configuration, loaded once at startup and passed into constructors.

use anyhow::{bail, Context, Result};
use futfan_engine::FanOutConfig;
use futfan_exchanges_binance::config::{BinanceConfig, MAINNET_BASE_URL, TESTNET_BASE_URL};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub exchange: ExchangeConfig,
    pub fanout: FanOutConfig,
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub api_key: String,
    pub secret_key: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            secret_key: String::new(),
            port: 3000,
        }
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("api_key", &"***")
            .field("secret_key", &"***")
            .field("port", &self.port)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    /// Use the futures testnet. Ignored when `base_url` is set.
    pub testnet: bool,
    pub base_url: Option<String>,
    pub recv_window_ms: u64,
    pub request_timeout_ms: u64,
    /// Recent trades per symbol returned by `/allfut` without `?limit=`.
    pub recent_trades_limit: u16,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            testnet: true,
            base_url: None,
            recv_window_ms: 5_000,
            request_timeout_ms: 10_000,
            recent_trades_limit: 50,
        }
    }
}

impl AppConfig {
    /// Read and validate the config file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("fatal error config file: {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid config file: {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=1000).contains(&self.exchange.recent_trades_limit) {
            bail!(
                "exchange.recent_trades_limit must be between 1 and 1000, got {}",
                self.exchange.recent_trades_limit
            );
        }
        if self.exchange.request_timeout_ms == 0 {
            bail!("exchange.request_timeout_ms must be positive");
        }
        Ok(())
    }

    pub fn base_url(&self) -> &str {
        match &self.exchange.base_url {
            Some(url) => url,
            None if self.exchange.testnet => TESTNET_BASE_URL,
            None => MAINNET_BASE_URL,
        }
    }

    pub fn binance(&self) -> BinanceConfig {
        let mut config = BinanceConfig::with_base_url(
            self.server.api_key.clone(),
            self.server.secret_key.clone(),
            self.base_url(),
        );
        config.recv_window_ms = self.exchange.recv_window_ms;
        config.request_timeout = Duration::from_millis(self.exchange.request_timeout_ms);
        config
    }
}
