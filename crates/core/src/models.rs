use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Symbol
// ---------------------------------------------------------------------------

/// Identifier of a tradable futures instrument (e.g. `BTCUSDT`).
///
/// Opaque: no structure is assumed beyond being a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ---------------------------------------------------------------------------
// Exchange metadata
// ---------------------------------------------------------------------------

/// One entry of the exchange's symbol listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    pub symbol: Symbol,
    #[serde(default)]
    pub pair: Option<String>,
    #[serde(default)]
    pub contract_type: Option<String>,
    /// Trading status (e.g. `TRADING`, `SETTLING`).
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub base_asset: Option<String>,
    #[serde(default)]
    pub quote_asset: Option<String>,
}

impl SymbolInfo {
    /// Bare listing entry with no metadata beyond the symbol.
    pub fn bare(symbol: impl Into<Symbol>) -> Self {
        Self {
            symbol: symbol.into(),
            pair: None,
            contract_type: None,
            status: None,
            base_asset: None,
            quote_asset: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Trades
// ---------------------------------------------------------------------------

/// A public trade from the market-data feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: u64,
    pub price: Decimal,
    pub qty: Decimal,
    #[serde(default)]
    pub quote_qty: Decimal,
    /// Trade time in milliseconds since the Unix epoch.
    pub time: i64,
    pub is_buyer_maker: bool,
}

impl Trade {
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        millis_to_utc(self.time)
    }
}

/// Order side as reported on account trades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

/// A fill on the authenticated account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountTrade {
    pub id: u64,
    pub order_id: u64,
    pub symbol: Symbol,
    pub side: Side,
    /// Hedge-mode position side (`BOTH`, `LONG`, `SHORT`).
    #[serde(default)]
    pub position_side: Option<String>,
    pub price: Decimal,
    pub qty: Decimal,
    #[serde(default)]
    pub quote_qty: Decimal,
    #[serde(default)]
    pub realized_pnl: Decimal,
    pub commission: Decimal,
    pub commission_asset: String,
    pub time: i64,
    pub buyer: bool,
    pub maker: bool,
}

impl AccountTrade {
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        millis_to_utc(self.time)
    }
}

fn millis_to_utc(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

/// All trades fetched for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolTrades<T> {
    pub symbol: Symbol,
    pub trades: Vec<T>,
}

impl<T> SymbolTrades<T> {
    pub fn new(symbol: Symbol, trades: Vec<T>) -> Self {
        Self { symbol, trades }
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }
}

/// Number of trades fetched for one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolTradeCount {
    pub symbol: Symbol,
    pub count: usize,
}
