//! Binance USDⓈ-M futures adapter.
//!
//! REST only: exchange info, recent trades, and the signed account-trade
//! listing. Defaults to the futures testnet.

pub mod auth;
pub mod client;
pub mod config;

pub use client::BinanceFuturesClient;
pub use config::BinanceConfig;
