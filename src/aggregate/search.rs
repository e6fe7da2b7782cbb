// src/aggregate/search.rs

//! Aggregated multi-provider search.
//!
//! Fans a query out to every enabled adapter concurrently, bounds each call
//! with a per-provider timeout and the whole pass with a shared deadline,
//! then merges and deduplicates whatever completed.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use tokio::time::{Instant, timeout, timeout_at};

use crate::aggregate::dedupe::dedupe_candidates;
use crate::error::{AppError, Result};
use crate::models::{Candidate, Config, MatchingConfig, MediaKind, SearchConfig};
use crate::providers::{AmazonProvider, BookProvider, OpenLibraryProvider, ReadarrProvider};

/// Result of one aggregation pass.
#[derive(Debug, Default, Serialize)]
pub struct SearchOutcome {
    /// Merged candidates in discovery order
    pub candidates: Vec<Candidate>,

    /// Raw per-provider result counts (pre-dedup); `0` for a provider that
    /// failed, timed out, or returned nothing
    pub provider_results: BTreeMap<String, usize>,
}

/// Fans a search out to the enabled source adapters and merges the results.
pub struct Aggregator {
    providers: Vec<Arc<dyn BookProvider>>,
    search: SearchConfig,
    matching: MatchingConfig,
}

impl Aggregator {
    /// Build an aggregator with the adapters enabled in the configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let toggles = &config.search.providers;
        let mut providers: Vec<Arc<dyn BookProvider>> = Vec::new();

        // Dispatch order is also merge priority: Amazon, Readarr, Open Library.
        if toggles.amazon {
            providers.push(Arc::new(AmazonProvider::new(config)?));
        }
        if toggles.readarr {
            providers.push(Arc::new(ReadarrProvider::new(config)?));
        }
        if toggles.open_library {
            providers.push(Arc::new(OpenLibraryProvider::new(config)?));
        }

        Ok(Self::with_providers(
            providers,
            config.search.clone(),
            config.matching.clone(),
        ))
    }

    /// Build an aggregator over an explicit adapter list.
    ///
    /// The list order determines merge priority.
    pub fn with_providers(
        providers: Vec<Arc<dyn BookProvider>>,
        search: SearchConfig,
        matching: MatchingConfig,
    ) -> Self {
        Self {
            providers,
            search,
            matching,
        }
    }

    /// Run one aggregation pass for the query.
    ///
    /// Adapter failures and timeouts are non-fatal: the failed source is
    /// logged and reported with a zero count while the pass continues with
    /// the remaining providers. Zero candidates overall is an empty result,
    /// not an error.
    pub async fn search(&self, query: &str, kind: MediaKind) -> Result<SearchOutcome> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::invalid_query("query must not be empty"));
        }

        let eligible: Vec<Arc<dyn BookProvider>> = self
            .providers
            .iter()
            .filter(|p| p.supports(kind))
            .cloned()
            .collect();

        let mut provider_results: BTreeMap<String, usize> = eligible
            .iter()
            .map(|p| (p.name().to_string(), 0))
            .collect();
        let mut slots: Vec<Vec<Candidate>> = (0..eligible.len()).map(|_| Vec::new()).collect();

        let provider_budget = Duration::from_secs(self.search.provider_timeout_secs);
        let deadline = Instant::now() + Duration::from_secs(self.search.overall_timeout_secs);

        let total = slots.len();
        let mut settled = 0;
        let mut in_flight: FuturesUnordered<_> = eligible
            .into_iter()
            .enumerate()
            .map(|(slot, provider)| {
                let query = query.to_string();
                async move {
                    let result = timeout(provider_budget, provider.search(&query, kind)).await;
                    (slot, provider.name(), result)
                }
            })
            .collect();

        loop {
            match timeout_at(deadline, in_flight.next()).await {
                Ok(None) => break,
                Ok(Some((slot, name, Ok(Ok(candidates))))) => {
                    settled += 1;
                    provider_results.insert(name.to_string(), candidates.len());
                    slots[slot] = candidates;
                }
                Ok(Some((_, name, Ok(Err(error))))) => {
                    settled += 1;
                    log::warn!("Provider {name} failed: {error}");
                }
                Ok(Some((_, name, Err(_)))) => {
                    settled += 1;
                    log::warn!(
                        "Provider {name} timed out after {}s",
                        self.search.provider_timeout_secs
                    );
                }
                Err(_) => {
                    log::warn!(
                        "Search deadline reached with {} provider(s) still in flight",
                        total - settled
                    );
                    break;
                }
            }
        }
        // Dropping the stream cancels any in-flight adapter calls.
        drop(in_flight);

        let combined: Vec<Candidate> = slots.into_iter().flatten().collect();
        let raw_count = combined.len();
        let candidates = dedupe_candidates(combined, &self.matching);

        log::info!(
            "Search '{query}' ({kind}): {raw_count} raw, {} merged from {} provider(s)",
            candidates.len(),
            provider_results.len()
        );

        Ok(SearchOutcome {
            candidates,
            provider_results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::providers::{AMAZON, OPEN_LIBRARY, READARR};

    struct StubProvider {
        tag: &'static str,
        delay: Duration,
        outcome: StubOutcome,
    }

    enum StubOutcome {
        Results(Vec<Candidate>),
        Fail,
    }

    impl StubProvider {
        fn ok(tag: &'static str, delay: Duration, results: Vec<Candidate>) -> Arc<Self> {
            Arc::new(Self {
                tag,
                delay,
                outcome: StubOutcome::Results(results),
            })
        }

        fn failing(tag: &'static str) -> Arc<Self> {
            Arc::new(Self {
                tag,
                delay: Duration::ZERO,
                outcome: StubOutcome::Fail,
            })
        }
    }

    #[async_trait]
    impl BookProvider for StubProvider {
        fn name(&self) -> &'static str {
            self.tag
        }

        fn supports(&self, _kind: MediaKind) -> bool {
            true
        }

        async fn search(&self, _query: &str, _kind: MediaKind) -> Result<Vec<Candidate>> {
            tokio::time::sleep(self.delay).await;
            match &self.outcome {
                StubOutcome::Results(results) => Ok(results.clone()),
                StubOutcome::Fail => Err(AppError::provider(self.tag, "stub failure")),
            }
        }
    }

    fn candidate(provider: &str, title: &str) -> Candidate {
        Candidate {
            title: title.to_string(),
            authors: vec!["Author".to_string()],
            provider: provider.to_string(),
            ..Candidate::default()
        }
    }

    fn aggregator(providers: Vec<Arc<dyn BookProvider>>) -> Aggregator {
        let search = SearchConfig {
            provider_timeout_secs: 2,
            overall_timeout_secs: 10,
            ..SearchConfig::default()
        };
        Aggregator::with_providers(providers, search, MatchingConfig::default())
    }

    #[tokio::test]
    async fn test_empty_query_rejected_before_dispatch() {
        let aggregator = aggregator(vec![StubProvider::ok(AMAZON, Duration::ZERO, vec![])]);
        let result = aggregator.search("   ", MediaKind::Ebook).await;
        assert!(matches!(result, Err(AppError::InvalidQuery(_))));
    }

    #[tokio::test]
    async fn test_zero_candidates_is_empty_not_error() {
        let aggregator = aggregator(vec![
            StubProvider::ok(AMAZON, Duration::ZERO, vec![]),
            StubProvider::ok(OPEN_LIBRARY, Duration::ZERO, vec![]),
        ]);

        let outcome = aggregator.search("gatsby", MediaKind::Ebook).await.unwrap();
        assert!(outcome.candidates.is_empty());
        assert_eq!(outcome.provider_results.get(AMAZON), Some(&0));
        assert_eq!(outcome.provider_results.get(OPEN_LIBRARY), Some(&0));
    }

    #[tokio::test]
    async fn test_provider_failure_is_non_fatal() {
        let aggregator = aggregator(vec![
            StubProvider::failing(AMAZON),
            StubProvider::ok(
                OPEN_LIBRARY,
                Duration::ZERO,
                vec![candidate(OPEN_LIBRARY, "Dune")],
            ),
        ]);

        let outcome = aggregator.search("dune", MediaKind::Ebook).await.unwrap();
        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.provider_results.get(AMAZON), Some(&0));
        assert_eq!(outcome.provider_results.get(OPEN_LIBRARY), Some(&1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_provider_times_out_and_pass_returns_promptly() {
        // One adapter sleeps 5s against a 2s per-provider timeout.
        let aggregator = aggregator(vec![
            StubProvider::ok(
                AMAZON,
                Duration::from_secs(5),
                vec![candidate(AMAZON, "Too Late")],
            ),
            StubProvider::ok(
                OPEN_LIBRARY,
                Duration::from_millis(10),
                vec![candidate(OPEN_LIBRARY, "Dune")],
            ),
        ]);

        let start = Instant::now();
        let outcome = aggregator.search("dune", MediaKind::Ebook).await.unwrap();
        let elapsed = start.elapsed();

        assert!(elapsed >= Duration::from_secs(2));
        assert!(elapsed < Duration::from_secs(3), "took {elapsed:?}");
        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.candidates[0].provider, OPEN_LIBRARY);
        assert_eq!(outcome.provider_results.get(AMAZON), Some(&0));
        assert_eq!(outcome.provider_results.get(OPEN_LIBRARY), Some(&1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overall_deadline_returns_completed_providers() {
        let search = SearchConfig {
            provider_timeout_secs: 30,
            overall_timeout_secs: 2,
            ..SearchConfig::default()
        };
        let aggregator = Aggregator::with_providers(
            vec![
                StubProvider::ok(
                    AMAZON,
                    Duration::from_secs(20),
                    vec![candidate(AMAZON, "Never Arrives")],
                ),
                StubProvider::ok(
                    OPEN_LIBRARY,
                    Duration::from_secs(1),
                    vec![candidate(OPEN_LIBRARY, "Dune")],
                ),
            ],
            search,
            MatchingConfig::default(),
        );

        let outcome = aggregator.search("dune", MediaKind::Ebook).await.unwrap();
        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.candidates[0].provider, OPEN_LIBRARY);
        assert_eq!(outcome.provider_results.get(AMAZON), Some(&0));
    }

    #[tokio::test]
    async fn test_merged_output_follows_dispatch_order_not_completion_order() {
        // Open Library answers first, but Amazon leads the merged list.
        let aggregator = aggregator(vec![
            StubProvider::ok(
                AMAZON,
                Duration::from_millis(50),
                vec![candidate(AMAZON, "Dune")],
            ),
            StubProvider::ok(
                OPEN_LIBRARY,
                Duration::ZERO,
                vec![candidate(OPEN_LIBRARY, "Dune Messiah")],
            ),
        ]);

        let outcome = aggregator.search("dune", MediaKind::Ebook).await.unwrap();
        assert_eq!(outcome.candidates.len(), 2);
        assert_eq!(outcome.candidates[0].provider, AMAZON);
        assert_eq!(outcome.candidates[1].provider, OPEN_LIBRARY);
    }

    #[tokio::test]
    async fn test_same_identity_across_providers_merges_to_one() {
        let mut amazon_hit = candidate(AMAZON, "The Great Gatsby");
        amazon_hit.asin = Some("B004EHZDE8".to_string());
        amazon_hit.isbn13 = Some("9780743273565".to_string());

        let mut open_library_hit = candidate(OPEN_LIBRARY, "The Great Gatsby");
        open_library_hit.isbn13 = Some("9780743273565".to_string());
        open_library_hit.page_count = Some(180);

        let aggregator = aggregator(vec![
            StubProvider::ok(AMAZON, Duration::ZERO, vec![amazon_hit]),
            StubProvider::ok(READARR, Duration::ZERO, vec![]),
            StubProvider::ok(OPEN_LIBRARY, Duration::ZERO, vec![open_library_hit]),
        ]);

        let outcome = aggregator
            .search("great gatsby", MediaKind::Ebook)
            .await
            .unwrap();

        assert_eq!(outcome.candidates.len(), 1);
        let merged = &outcome.candidates[0];
        assert_eq!(merged.provider, AMAZON);
        assert_eq!(merged.asin.as_deref(), Some("B004EHZDE8"));
        assert_eq!(merged.isbn13.as_deref(), Some("9780743273565"));
        assert_eq!(merged.page_count, Some(180));

        // Pre-dedup counts are preserved for observability.
        assert_eq!(outcome.provider_results.get(AMAZON), Some(&1));
        assert_eq!(outcome.provider_results.get(READARR), Some(&0));
        assert_eq!(outcome.provider_results.get(OPEN_LIBRARY), Some(&1));
    }
}
