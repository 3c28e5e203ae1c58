use futfan_core::ExchangeClient;
use futfan_engine::FanOutConfig;
use std::sync::Arc;

/// Recent trades requested per symbol by `/allfut` when no limit is given.
pub const DEFAULT_RECENT_TRADES_LIMIT: u16 = 50;

/// Shared application state accessible by all route handlers.
pub struct AppState {
    pub exchange: Arc<dyn ExchangeClient>,
    /// How per-symbol requests are fanned out.
    pub fanout: FanOutConfig,
    pub recent_trades_limit: u16,
}

impl AppState {
    pub fn new(exchange: Arc<dyn ExchangeClient>, fanout: FanOutConfig) -> Self {
        Self {
            exchange,
            fanout,
            recent_trades_limit: DEFAULT_RECENT_TRADES_LIMIT,
        }
    }

    pub fn with_recent_trades_limit(mut self, limit: u16) -> Self {
        self.recent_trades_limit = limit;
        self
    }
}
