use std::fmt;
use std::time::Duration;

pub const MAINNET_BASE_URL: &str = "https://fapi.binance.com";
pub const TESTNET_BASE_URL: &str = "https://testnet.binancefuture.com";

/// Connection settings for the futures REST API.
#[derive(Clone)]
pub struct BinanceConfig {
    pub api_key: String,
    pub secret_key: String,
    /// REST base URL without trailing slash.
    pub base_url: String,
    /// `recvWindow` sent with signed requests, in milliseconds.
    pub recv_window_ms: u64,
    /// Per-request timeout for the HTTP client.
    pub request_timeout: Duration,
}

impl BinanceConfig {
    pub fn testnet(api_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, secret_key, TESTNET_BASE_URL)
    }

    pub fn mainnet(api_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, secret_key, MAINNET_BASE_URL)
    }

    pub fn with_base_url(
        api_key: impl Into<String>,
        secret_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            secret_key: secret_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            recv_window_ms: 5_000,
            request_timeout: Duration::from_secs(10),
        }
    }
}

// Keep credentials out of logs.
impl fmt::Debug for BinanceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinanceConfig")
            .field("api_key", &redact(&self.api_key))
            .field("secret_key", &"***")
            .field("base_url", &self.base_url)
            .field("recv_window_ms", &self.recv_window_ms)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

fn redact(key: &str) -> String {
    match key.get(..4) {
        Some(prefix) if key.len() > 8 => format!("{prefix}***"),
        _ => "***".to_string(),
    }
}
