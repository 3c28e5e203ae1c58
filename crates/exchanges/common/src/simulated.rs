use async_trait::async_trait;
use futfan_core::*;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

/// Exchange default for recent trades when no limit is given.
const DEFAULT_RECENT_LIMIT: usize = 500;

/// Base timestamp for synthetic trades (2024-01-01T00:00:00Z, in ms).
const SYNTHETIC_BASE_TIME_MS: i64 = 1_704_067_200_000;

/// An in-memory exchange with scripted responses.
///
/// Used for offline runs and tests. Symbols are listed in the order they
/// were first registered. Requests for unlisted symbols are rejected the way
/// the real exchange rejects them.
#[derive(Debug, Default)]
pub struct SimulatedExchange {
    listing: Vec<Symbol>,
    recent: HashMap<Symbol, Vec<Trade>>,
    account: HashMap<Symbol, Vec<AccountTrade>>,
    /// Symbols whose requests fail, with the error message to return.
    failures: HashMap<Symbol, String>,
    delays: HashMap<Symbol, Duration>,
    default_delay: Option<Duration>,
    listing_failure: Option<String>,
    calls: AtomicUsize,
}

impl SimulatedExchange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Three symbols with a handful of trades each.
    pub fn with_demo_data() -> Self {
        Self::new()
            .with_recent_trades("BTCUSDT", Self::synthetic_trades(1_000, 60))
            .with_recent_trades("ETHUSDT", Self::synthetic_trades(2_000, 40))
            .with_recent_trades("SOLUSDT", Self::synthetic_trades(3_000, 25))
            .with_account_trades("BTCUSDT", Self::synthetic_account_trades("BTCUSDT", 4))
            .with_account_trades("ETHUSDT", Self::synthetic_account_trades("ETHUSDT", 2))
            .with_default_delay(Duration::from_millis(5))
    }

    pub fn with_recent_trades(mut self, symbol: impl Into<Symbol>, trades: Vec<Trade>) -> Self {
        let symbol = self.register(symbol.into());
        self.recent.insert(symbol, trades);
        self
    }

    pub fn with_account_trades(
        mut self,
        symbol: impl Into<Symbol>,
        trades: Vec<AccountTrade>,
    ) -> Self {
        let symbol = self.register(symbol.into());
        self.account.insert(symbol, trades);
        self
    }

    /// Make every request for `symbol` fail with `message`.
    pub fn with_failure(mut self, symbol: impl Into<Symbol>, message: impl Into<String>) -> Self {
        let symbol = self.register(symbol.into());
        self.failures.insert(symbol, message.into());
        self
    }

    pub fn with_delay(mut self, symbol: impl Into<Symbol>, delay: Duration) -> Self {
        let symbol = self.register(symbol.into());
        self.delays.insert(symbol, delay);
        self
    }

    /// Delay applied to symbols without a specific delay.
    pub fn with_default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = Some(delay);
        self
    }

    pub fn with_listing_failure(mut self, message: impl Into<String>) -> Self {
        self.listing_failure = Some(message.into());
        self
    }

    /// Total number of per-symbol trade requests served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `count` ascending trades starting at id `first_id`.
    pub fn synthetic_trades(first_id: u64, count: usize) -> Vec<Trade> {
        (0..count as u64)
            .map(|i| {
                let price = Decimal::new(5_000_000 + (i as i64 % 7) * 25, 2);
                let qty = Decimal::new(1 + (i as i64 % 5), 3);
                Trade {
                    id: first_id + i,
                    price,
                    qty,
                    quote_qty: price * qty,
                    time: SYNTHETIC_BASE_TIME_MS + (i as i64) * 1_000,
                    is_buyer_maker: i % 2 == 0,
                }
            })
            .collect()
    }

    pub fn synthetic_account_trades(symbol: &str, count: usize) -> Vec<AccountTrade> {
        (0..count as u64)
            .map(|i| {
                let price = Decimal::new(300_000 + (i as i64) * 10, 2);
                let qty = Decimal::new(10, 3);
                let buyer = i % 2 == 0;
                AccountTrade {
                    id: 10_000 + i,
                    order_id: 90_000 + i,
                    symbol: Symbol::from(symbol),
                    side: if buyer { Side::Buy } else { Side::Sell },
                    position_side: Some("BOTH".to_string()),
                    price,
                    qty,
                    quote_qty: price * qty,
                    realized_pnl: Decimal::ZERO,
                    commission: Decimal::new(12, 3),
                    commission_asset: "USDT".to_string(),
                    time: SYNTHETIC_BASE_TIME_MS + (i as i64) * 60_000,
                    buyer,
                    maker: false,
                }
            })
            .collect()
    }

    fn register(&mut self, symbol: Symbol) -> Symbol {
        if !self.listing.contains(&symbol) {
            self.listing.push(symbol.clone());
        }
        symbol
    }

    /// Count the call, apply the scripted delay and failure for `symbol`.
    async fn serve(&self, symbol: &Symbol) -> Result<(), ExchangeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(symbol).copied().or(self.default_delay) {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = self.failures.get(symbol) {
            debug!(%symbol, %message, "Simulated failure");
            return Err(ExchangeError::Simulated(message.clone()));
        }
        if !self.listing.contains(symbol) {
            return Err(ExchangeError::Api {
                status: 400,
                code: -1121,
                msg: "Invalid symbol.".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ExchangeClient for SimulatedExchange {
    async fn ping(&self) -> Result<(), ExchangeError> {
        Ok(())
    }

    async fn list_symbols(&self) -> Result<Vec<SymbolInfo>, ExchangeError> {
        if let Some(message) = &self.listing_failure {
            return Err(ExchangeError::Simulated(message.clone()));
        }
        Ok(self
            .listing
            .iter()
            .map(|symbol| SymbolInfo {
                status: Some("TRADING".to_string()),
                contract_type: Some("PERPETUAL".to_string()),
                ..SymbolInfo::bare(symbol.clone())
            })
            .collect())
    }

    async fn recent_trades(
        &self,
        symbol: &Symbol,
        limit: Option<u16>,
    ) -> Result<Vec<Trade>, ExchangeError> {
        self.serve(symbol).await?;
        let trades = self.recent.get(symbol).map(Vec::as_slice).unwrap_or_default();
        let limit = limit.map(usize::from).unwrap_or(DEFAULT_RECENT_LIMIT);
        // Most recent trades are at the tail.
        let start = trades.len().saturating_sub(limit);
        Ok(trades[start..].to_vec())
    }

    async fn account_trades(&self, symbol: &Symbol) -> Result<Vec<AccountTrade>, ExchangeError> {
        self.serve(symbol).await?;
        Ok(self.account.get(symbol).cloned().unwrap_or_default())
    }
}
