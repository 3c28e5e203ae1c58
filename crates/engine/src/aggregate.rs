use crate::fanout::{fetch_all, FanOutConfig, FetchResult};
use futfan_core::*;
use std::sync::Arc;
use tracing::info;

/// Every symbol the exchange lists, in listing order.
pub async fn all_symbols(client: &dyn ExchangeClient) -> Result<Vec<Symbol>, ExchangeError> {
    let listing = client.list_symbols().await?;
    info!(symbols = listing.len(), "Loaded exchange symbol listing");
    Ok(listing.into_iter().map(|info| info.symbol).collect())
}

/// Fetch recent public trades for every symbol concurrently.
pub async fn recent_trades_by_symbol(
    client: Arc<dyn ExchangeClient>,
    symbols: Vec<Symbol>,
    limit: Option<u16>,
    config: &FanOutConfig,
) -> Result<Vec<SymbolTrades<Trade>>, ExchangeError> {
    let requested = symbols.len();
    let results = fetch_all(symbols, config, move |symbol| {
        let client = Arc::clone(&client);
        async move { client.recent_trades(&symbol, limit).await }
    })
    .await?;

    info!(symbols = requested, ?limit, "Fetched recent trades");
    Ok(results.into_iter().map(into_symbol_trades).collect())
}

/// Fetch the account's trades for every symbol concurrently.
pub async fn account_trades_by_symbol(
    client: Arc<dyn ExchangeClient>,
    symbols: Vec<Symbol>,
    config: &FanOutConfig,
) -> Result<Vec<SymbolTrades<AccountTrade>>, ExchangeError> {
    let requested = symbols.len();
    let results = fetch_all(symbols, config, move |symbol| {
        let client = Arc::clone(&client);
        async move { client.account_trades(&symbol).await }
    })
    .await?;

    info!(symbols = requested, "Fetched account trades");
    Ok(results.into_iter().map(into_symbol_trades).collect())
}

fn into_symbol_trades<T>(result: FetchResult<Vec<T>>) -> SymbolTrades<T> {
    SymbolTrades::new(result.symbol, result.payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futfan_exchanges_common::simulated::SimulatedExchange;

    fn exchange() -> SimulatedExchange {
        SimulatedExchange::new()
            .with_recent_trades("BTCUSDT", SimulatedExchange::synthetic_trades(1, 3))
            .with_recent_trades("ETHUSDT", SimulatedExchange::synthetic_trades(100, 5))
            .with_account_trades("BTCUSDT", SimulatedExchange::synthetic_account_trades("BTCUSDT", 2))
    }

    #[tokio::test]
    async fn test_all_symbols_in_listing_order() {
        let exchange = exchange();
        let symbols = all_symbols(&exchange).await.unwrap();
        assert_eq!(symbols, vec![Symbol::from("BTCUSDT"), Symbol::from("ETHUSDT")]);
    }

    #[tokio::test]
    async fn test_recent_trades_grouped_by_symbol() {
        let client: Arc<dyn ExchangeClient> = Arc::new(exchange());
        let symbols = all_symbols(client.as_ref()).await.unwrap();
        let mut grouped =
            recent_trades_by_symbol(client, symbols, Some(50), &FanOutConfig::default())
                .await
                .unwrap();
        crate::summary::sort_by_symbol(&mut grouped);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].symbol.as_str(), "BTCUSDT");
        assert_eq!(grouped[0].len(), 3);
        assert_eq!(grouped[1].len(), 5);
    }

    #[tokio::test]
    async fn test_recent_trades_respects_limit() {
        let client: Arc<dyn ExchangeClient> = Arc::new(exchange());
        let grouped = recent_trades_by_symbol(
            client,
            vec![Symbol::from("ETHUSDT")],
            Some(2),
            &FanOutConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(grouped[0].len(), 2);
    }

    #[tokio::test]
    async fn test_account_trades_fail_on_single_symbol_error() {
        let client: Arc<dyn ExchangeClient> =
            Arc::new(exchange().with_failure("ETHUSDT", "Too many requests"));
        let outcome = account_trades_by_symbol(
            client,
            vec![Symbol::from("BTCUSDT"), Symbol::from("ETHUSDT")],
            &FanOutConfig::bounded(1),
        )
        .await;

        match outcome {
            Err(ExchangeError::Simulated(msg)) => assert_eq!(msg, "Too many requests"),
            other => panic!("Expected simulated failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_account_trades_for_symbol_without_history_is_empty() {
        let client: Arc<dyn ExchangeClient> = Arc::new(exchange());
        let grouped = account_trades_by_symbol(
            client,
            vec![Symbol::from("BTCUSDT"), Symbol::from("ETHUSDT")],
            &FanOutConfig::default(),
        )
        .await
        .unwrap();

        let total: usize = grouped.iter().map(|g| g.len()).sum();
        assert_eq!(total, 2);
        assert!(grouped.iter().any(|g| g.symbol.as_str() == "ETHUSDT" && g.is_empty()));
    }
}
