use crate::models::*;
use async_trait::async_trait;

// ---------------------------------------------------------------------------
// Exchange Errors
// ---------------------------------------------------------------------------

/// Errors returned by an exchange client.
///
/// Every variant means "the upstream call failed"; callers that fan out over
/// many symbols pass these through unchanged.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExchangeError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Exchange API error (HTTP {status}, code {code}): {msg}")]
    Api { status: u16, code: i64, msg: String },
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("{0}")]
    Simulated(String),
}

// ---------------------------------------------------------------------------
// Exchange Client Trait
// ---------------------------------------------------------------------------

/// Read-only access to an exchange's futures market data and account trades.
///
/// Implementations must be safe to call concurrently from many tasks.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Check connectivity to the exchange.
    async fn ping(&self) -> Result<(), ExchangeError>;

    /// List every symbol the exchange advertises.
    async fn list_symbols(&self) -> Result<Vec<SymbolInfo>, ExchangeError>;

    /// Most recent public trades for a symbol.
    ///
    /// `limit` of `None` uses the exchange default.
    async fn recent_trades(
        &self,
        symbol: &Symbol,
        limit: Option<u16>,
    ) -> Result<Vec<Trade>, ExchangeError>;

    /// Trades of the authenticated account for a symbol.
    async fn account_trades(&self, symbol: &Symbol) -> Result<Vec<AccountTrade>, ExchangeError>;
}
