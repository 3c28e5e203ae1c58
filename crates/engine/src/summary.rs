use futfan_core::{SymbolTradeCount, SymbolTrades};

/// Per-symbol trade counts, in the same order as `grouped`.
pub fn trade_counts<T>(grouped: &[SymbolTrades<T>]) -> Vec<SymbolTradeCount> {
    grouped
        .iter()
        .map(|g| SymbolTradeCount {
            symbol: g.symbol.clone(),
            count: g.len(),
        })
        .collect()
}

pub fn total_trades<T>(grouped: &[SymbolTrades<T>]) -> usize {
    grouped.iter().map(|g| g.len()).sum()
}

/// Fan-out results arrive in completion order; sort them for stable output.
pub fn sort_by_symbol<T>(grouped: &mut [SymbolTrades<T>]) {
    grouped.sort_by(|a, b| a.symbol.cmp(&b.symbol));
}
