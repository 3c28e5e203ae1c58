use futfan_core::Symbol;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::debug;

/// Configuration for a fan-out run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FanOutConfig {
    /// Maximum fetches in flight at once. `None` runs every symbol at the
    /// same time, which can saturate the upstream API on large symbol lists.
    pub max_concurrency: Option<usize>,
    /// Abort outstanding fetches once the first error is seen.
    pub cancel_on_error: bool,
}

impl FanOutConfig {
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Cap in-flight fetches. A cap of zero is raised to one.
    pub fn bounded(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: Some(max_concurrency.max(1)),
            ..Self::default()
        }
    }

    pub fn with_cancel_on_error(mut self, cancel_on_error: bool) -> Self {
        self.cancel_on_error = cancel_on_error;
        self
    }
}

/// The payload one fetch produced, tagged with its symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult<T> {
    pub symbol: Symbol,
    pub payload: T,
}

/// Run `fetch` once per symbol concurrently and collect the results.
///
/// Results come back in completion order. If any fetch fails the whole call
/// fails with the first error observed and no partial results are returned.
/// Either way every spawned task has finished (or, with `cancel_on_error`,
/// been cancelled) before this returns. Duplicate symbols are fetched
/// independently.
///
/// A panic inside a fetch is re-raised here once the remaining tasks drain.
pub async fn fetch_all<I, F, Fut, T, E>(
    symbols: I,
    config: &FanOutConfig,
    fetch: F,
) -> Result<Vec<FetchResult<T>>, E>
where
    I: IntoIterator<Item = Symbol>,
    F: Fn(Symbol) -> Fut,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let limiter = config
        .max_concurrency
        .map(|n| Arc::new(Semaphore::new(n.max(1))));

    let mut tasks = JoinSet::new();
    for symbol in symbols {
        let fut = fetch(symbol.clone());
        let limiter = limiter.clone();
        tasks.spawn(async move {
            // The semaphore is never closed, so acquisition only fails if it
            // is dropped, in which case running unthrottled is harmless.
            let _permit = match limiter {
                Some(sem) => sem.acquire_owned().await.ok(),
                None => None,
            };
            let outcome = fut.await;
            (symbol, outcome)
        });
    }

    let launched = tasks.len();
    if launched == 0 {
        return Ok(Vec::new());
    }
    debug!(
        tasks = launched,
        max_concurrency = ?config.max_concurrency,
        "Fan-out started"
    );

    let mut results = Vec::with_capacity(launched);
    let mut first_error: Option<E> = None;
    let mut panic_payload = None;

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((symbol, Ok(payload))) => {
                if first_error.is_none() {
                    results.push(FetchResult { symbol, payload });
                }
            }
            Ok((symbol, Err(err))) => {
                if first_error.is_none() {
                    debug!(%symbol, "Fetch failed, discarding remaining results");
                    first_error = Some(err);
                    results.clear();
                    if config.cancel_on_error {
                        tasks.abort_all();
                    }
                }
            }
            Err(join_err) if join_err.is_panic() => {
                if panic_payload.is_none() {
                    panic_payload = Some(join_err.into_panic());
                }
            }
            // Cancelled by abort_all above.
            Err(_) => {}
        }
    }

    if let Some(payload) = panic_payload {
        std::panic::resume_unwind(payload);
    }

    match first_error {
        Some(err) => Err(err),
        None => {
            debug!(completed = results.len(), "Fan-out complete");
            Ok(results)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    fn symbols(names: &[&str]) -> Vec<Symbol> {
        names.iter().map(|s| Symbol::from(*s)).collect()
    }

    fn sorted_pairs<T: Clone + Ord>(results: &[FetchResult<T>]) -> Vec<(String, T)> {
        let mut pairs: Vec<_> = results
            .iter()
            .map(|r| (r.symbol.to_string(), r.payload.clone()))
            .collect();
        pairs.sort();
        pairs
    }

    #[tokio::test]
    async fn test_all_success_returns_every_symbol() {
        let input = symbols(&["BTCUSDT", "ETHUSDT", "SOLUSDT", "XRPUSDT"]);
        let results = fetch_all(input.clone(), &FanOutConfig::default(), |symbol| async move {
            Ok::<_, String>(symbol.as_str().len())
        })
        .await
        .unwrap();

        let mut got: Vec<_> = results.iter().map(|r| r.symbol.clone()).collect();
        let mut want = input;
        got.sort();
        want.sort();
        assert_eq!(got, want);
        assert!(results.iter().all(|r| r.payload == r.symbol.as_str().len()));
    }

    #[tokio::test]
    async fn test_scenario_success_payloads() {
        let counts: HashMap<&str, usize> = [("A", 3), ("B", 7), ("C", 5)].into_iter().collect();
        let results = fetch_all(symbols(&["A", "B", "C"]), &FanOutConfig::default(), |symbol| {
            let count = counts[symbol.as_str()];
            async move { Ok::<_, String>(count) }
        })
        .await
        .unwrap();

        assert_eq!(
            sorted_pairs(&results),
            vec![
                ("A".to_string(), 3),
                ("B".to_string(), 7),
                ("C".to_string(), 5)
            ]
        );
    }

    #[tokio::test]
    async fn test_scenario_failure_surfaces_error() {
        let counts: HashMap<&str, usize> = [("A", 3), ("C", 5)].into_iter().collect();
        let outcome = fetch_all(symbols(&["A", "B", "C"]), &FanOutConfig::default(), |symbol| {
            let count = counts.get(symbol.as_str()).copied();
            async move { count.ok_or_else(|| "rate limited".to_string()) }
        })
        .await;

        assert_eq!(outcome, Err("rate limited".to_string()));
    }

    #[tokio::test]
    async fn test_any_failure_never_returns_partial_results() {
        for failing in ["A", "M", "Z"] {
            let input = symbols(&["A", "F", "M", "T", "Z"]);
            let outcome = fetch_all(input, &FanOutConfig::default(), |symbol| {
                let fails = symbol.as_str() == failing;
                async move {
                    if fails {
                        Err(format!("{symbol} failed"))
                    } else {
                        Ok(1u32)
                    }
                }
            })
            .await;

            assert_eq!(outcome, Err(format!("{failing} failed")));
        }
    }

    #[tokio::test]
    async fn test_concurrent_failures_surface_exactly_one() {
        let outcome = fetch_all(symbols(&["A", "B", "C"]), &FanOutConfig::default(), |symbol| async move {
            Err::<(), _>(symbol.to_string())
        })
        .await;

        let err = outcome.unwrap_err();
        assert!(["A", "B", "C"].contains(&err.as_str()));
    }

    #[tokio::test]
    async fn test_empty_input_is_empty_success() {
        let calls = AtomicUsize::new(0);
        let results = fetch_all(Vec::new(), &FanOutConfig::default(), |_symbol| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<u8, String>(0) }
        })
        .await
        .unwrap();

        assert!(results.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_duplicates_are_fetched_independently() {
        let calls = Arc::new(AtomicUsize::new(0));
        let results = fetch_all(symbols(&["A", "A", "B"]), &FanOutConfig::default(), |symbol| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(symbol)
            }
        })
        .await
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(results.iter().filter(|r| r.symbol.as_str() == "A").count(), 2);
    }

    #[tokio::test]
    async fn test_waits_for_slow_tasks_after_early_failure() {
        let finished = Arc::new(AtomicUsize::new(0));
        let outcome = fetch_all(symbols(&["FAST", "SLOW"]), &FanOutConfig::default(), |symbol| {
            let finished = Arc::clone(&finished);
            async move {
                if symbol.as_str() == "FAST" {
                    return Err("boom".to_string());
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
                finished.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await;

        assert_eq!(outcome, Err("boom".to_string()));
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_on_error_tears_down_outstanding_tasks() {
        struct DropCounter(Arc<AtomicUsize>);
        impl Drop for DropCounter {
            fn drop(&mut self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let finished = Arc::new(AtomicUsize::new(0));
        let dropped = Arc::new(AtomicUsize::new(0));
        let config = FanOutConfig::default().with_cancel_on_error(true);
        let start = Instant::now();

        let outcome = fetch_all(symbols(&["FAST", "SLOW"]), &config, |symbol| {
            let finished = Arc::clone(&finished);
            let guard = DropCounter(Arc::clone(&dropped));
            async move {
                let _guard = guard;
                if symbol.as_str() == "FAST" {
                    return Err("boom".to_string());
                }
                tokio::time::sleep(Duration::from_secs(5)).await;
                finished.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await;

        assert_eq!(outcome, Err("boom".to_string()));
        assert!(start.elapsed() < Duration::from_secs(2));
        assert_eq!(finished.load(Ordering::SeqCst), 0);
        // Both futures, including the aborted one, were dropped before return.
        assert_eq!(dropped.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrency_cap_is_honored() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let input: Vec<Symbol> = (0..20).map(|i| Symbol::new(format!("S{i}"))).collect();

        let results = fetch_all(input, &FanOutConfig::bounded(4), |_symbol| {
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, String>(())
            }
        })
        .await
        .unwrap();

        assert_eq!(results.len(), 20);
        assert!(peak.load(Ordering::SeqCst) <= 4);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn test_bounded_zero_is_raised_to_one() {
        assert_eq!(FanOutConfig::bounded(0).max_concurrency, Some(1));
        assert_eq!(FanOutConfig::unbounded().max_concurrency, None);
    }

    #[tokio::test]
    #[should_panic(expected = "exchange exploded")]
    async fn test_panicking_fetch_is_reraised() {
        let _ = fetch_all(symbols(&["A", "B"]), &FanOutConfig::default(), |symbol| async move {
            if symbol.as_str() == "B" {
                panic!("exchange exploded");
            }
            Ok::<_, String>(())
        })
        .await;
    }

    #[tokio::test]
    async fn test_five_hundred_symbols_run_in_parallel() {
        let input: Vec<Symbol> = (0..500).map(|i| Symbol::new(format!("SYM{i}"))).collect();
        let start = Instant::now();

        let results = fetch_all(input, &FanOutConfig::default(), |symbol| {
            let n: u64 = symbol.as_str()[3..].parse().unwrap();
            // Spread delays over 10..=50ms.
            let delay = Duration::from_millis(10 + (n * 7919) % 41);
            async move {
                tokio::time::sleep(delay).await;
                Ok::<_, String>(delay)
            }
        })
        .await
        .unwrap();

        let elapsed = start.elapsed();
        assert_eq!(results.len(), 500);
        // Serial execution would take ~15s.
        assert!(elapsed < Duration::from_secs(1), "took {elapsed:?}");
    }
}
