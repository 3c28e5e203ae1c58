//! Fan-out engine: runs one fetch per symbol concurrently and merges the
//! outcomes into a single all-or-nothing result.

pub mod aggregate;
pub mod fanout;
pub mod summary;

pub use aggregate::{account_trades_by_symbol, all_symbols, recent_trades_by_symbol};
pub use fanout::{fetch_all, FanOutConfig, FetchResult};
