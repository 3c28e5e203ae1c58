//! Binance USDⓈ-M futures REST client.
//!
//! | Operation      | Method | Path                  | Auth   |
//! |----------------|--------|-----------------------|--------|
//! | Ping           | GET    | `/fapi/v1/ping`       | none   |
//! | Exchange info  | GET    | `/fapi/v1/exchangeInfo` | none |
//! | Recent trades  | GET    | `/fapi/v1/trades`     | none   |
//! | Account trades | GET    | `/fapi/v1/userTrades` | SIGNED |

use async_trait::async_trait;
use futfan_core::*;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::auth;
use crate::config::BinanceConfig;

/// Largest `limit` the recent-trades endpoint accepts.
pub const MAX_RECENT_TRADES_LIMIT: u16 = 1000;

#[derive(Deserialize)]
struct ExchangeInfo {
    symbols: Vec<SymbolInfo>,
}

/// Error body returned with non-2xx responses.
#[derive(Deserialize)]
struct ApiErrorBody {
    code: i64,
    msg: String,
}

/// Futures REST client. Cheap to share behind an `Arc`.
pub struct BinanceFuturesClient {
    http: reqwest::Client,
    config: BinanceConfig,
}

impl BinanceFuturesClient {
    pub fn new(config: BinanceConfig) -> Result<Self, ExchangeError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ExchangeError::Transport(format!("HTTP client build failed: {}", e)))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &BinanceConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    async fn get_public<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ExchangeError> {
        let request = self.http.get(self.url(path)).query(params);
        self.execute(path, request).await
    }

    async fn get_signed<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ExchangeError> {
        let recv_window = self.config.recv_window_ms.to_string();
        let timestamp = chrono::Utc::now().timestamp_millis().to_string();

        let mut signed: Vec<(&str, &str)> = params.to_vec();
        signed.push(("recvWindow", recv_window.as_str()));
        signed.push(("timestamp", timestamp.as_str()));
        let query = auth::build_signed_query(&signed, &self.config.secret_key);

        let request = self
            .http
            .get(format!("{}?{}", self.url(path), query))
            .header("X-MBX-APIKEY", &self.config.api_key);
        self.execute(path, request).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        path: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ExchangeError> {
        let resp = request
            .send()
            .await
            .map_err(|e| ExchangeError::Transport(format!("{} request failed: {}", path, e)))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ExchangeError::Transport(format!("{} read failed: {}", path, e)))?;
        debug!(path, status = status.as_u16(), bytes = body.len(), "Exchange response");

        if !status.is_success() {
            return Err(match serde_json::from_str::<ApiErrorBody>(&body) {
                Ok(err) => ExchangeError::Api {
                    status: status.as_u16(),
                    code: err.code,
                    msg: err.msg,
                },
                Err(_) => ExchangeError::Api {
                    status: status.as_u16(),
                    code: 0,
                    msg: body,
                },
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| ExchangeError::Decode(format!("{} response: {}", path, e)))
    }
}

#[async_trait]
impl ExchangeClient for BinanceFuturesClient {
    async fn ping(&self) -> Result<(), ExchangeError> {
        let _: serde_json::Value = self.get_public("/fapi/v1/ping", &[]).await?;
        Ok(())
    }

    async fn list_symbols(&self) -> Result<Vec<SymbolInfo>, ExchangeError> {
        let info: ExchangeInfo = self.get_public("/fapi/v1/exchangeInfo", &[]).await?;
        Ok(info.symbols)
    }

    async fn recent_trades(
        &self,
        symbol: &Symbol,
        limit: Option<u16>,
    ) -> Result<Vec<Trade>, ExchangeError> {
        let mut params = vec![("symbol", symbol.to_string())];
        if let Some(limit) = limit {
            params.push(("limit", limit.min(MAX_RECENT_TRADES_LIMIT).to_string()));
        }
        self.get_public("/fapi/v1/trades", &params).await
    }

    async fn account_trades(&self, symbol: &Symbol) -> Result<Vec<AccountTrade>, ExchangeError> {
        self.get_signed("/fapi/v1/userTrades", &[("symbol", symbol.as_str())])
            .await
    }
}
