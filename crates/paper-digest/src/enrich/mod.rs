//! Enrichment broker: secondary-signal providers with caching, timeout, and
//! bounded concurrency.
//!
//! Each provider implements the [`SignalProvider`] capability. The broker
//! wraps every lookup with a per-call timeout, an in-run `moka` cache keyed
//! by the provider's lookup key, and a per-provider semaphore so calls to one
//! provider respect its rate limit while different providers proceed
//! concurrently. Retries on transient failures happen inside the providers'
//! HTTP clients (retry middleware with jittered exponential backoff).
//!
//! Enrichment never fails a paper as a whole: an exhausted or permanently
//! failed lookup leaves the default zero in place and is tallied per provider
//! in the run report.

mod citations;
mod repos;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use moka::future::Cache;
use tokio::sync::Semaphore;

use crate::config::Config;
use crate::error::ClientResult;
use crate::models::{EnrichedPaper, MergedPaper, SignalSet};

pub use citations::CitationProvider;
pub use repos::RepoStarsProvider;

/// Capability implemented by every secondary-signal provider.
#[async_trait::async_trait]
pub trait SignalProvider: Send + Sync {
    /// Stable provider name, used for failure tallies in the run report.
    fn name(&self) -> &'static str;

    /// The cache/lookup key for a paper, or `None` when this provider has
    /// nothing to look up (e.g. no repository URL anywhere in the record).
    fn lookup_key(&self, paper: &MergedPaper) -> Option<String>;

    /// Fetch the signal value for a paper.
    ///
    /// A missing upstream resource is a valid zero, reported as
    /// `ClientError::NotFound`, which the broker treats as a hit of 0 rather
    /// than a failure.
    ///
    /// # Errors
    ///
    /// Returns error on API failure.
    async fn fetch(&self, paper: &MergedPaper) -> ClientResult<u64>;

    /// Write the fetched value into its slot of the signal set.
    fn apply(&self, signals: &mut SignalSet, value: u64);
}

/// One registered provider with its in-run cache and concurrency cap.
struct ProviderSlot {
    provider: Arc<dyn SignalProvider>,
    cache: Cache<String, u64>,
    limiter: Arc<Semaphore>,
}

/// Outcome of a single provider lookup for a single paper.
enum LookupOutcome {
    /// Value fetched (or cached, or a valid upstream miss).
    Value(u64),
    /// Nothing to look up for this paper.
    Skipped,
    /// Lookup failed after retries; the default zero stands.
    Failed,
}

/// Fans merged papers out to signal providers and folds results back by
/// paper identity, so enrichment arrival order never affects the output.
pub struct EnrichmentBroker {
    slots: Vec<ProviderSlot>,
    call_timeout: Duration,
}

impl EnrichmentBroker {
    /// Create a broker over the given providers.
    #[must_use]
    pub fn new(config: &Config, providers: Vec<Arc<dyn SignalProvider>>) -> Self {
        let slots = providers
            .into_iter()
            .map(|provider| ProviderSlot {
                provider,
                cache: Cache::builder().max_capacity(config.cache_max_size).build(),
                limiter: Arc::new(Semaphore::new(config.provider_concurrency.max(1))),
            })
            .collect();

        Self { slots, call_timeout: config.provider_timeout }
    }

    /// Number of registered providers.
    #[must_use]
    pub fn provider_count(&self) -> usize {
        self.slots.len()
    }

    /// Enrich every paper, returning the papers with signals attached plus
    /// failed-lookup counts per provider.
    pub async fn enrich_all(
        &self,
        papers: Vec<MergedPaper>,
    ) -> (Vec<EnrichedPaper>, BTreeMap<String, usize>) {
        let mut failures: BTreeMap<String, usize> = BTreeMap::new();
        for slot in &self.slots {
            failures.insert(slot.provider.name().to_string(), 0);
        }

        // One future per (paper, provider) pair; per-provider semaphores
        // bound in-flight calls, so a flat join is safe.
        let lookups = papers.iter().enumerate().flat_map(|(paper_idx, paper)| {
            self.slots.iter().enumerate().map(move |(slot_idx, slot)| {
                let timeout = self.call_timeout;
                async move {
                    let outcome = lookup_one(slot, paper, timeout).await;
                    (paper_idx, slot_idx, outcome)
                }
            })
        });

        let results = join_all(lookups).await;

        let mut signal_sets = vec![SignalSet::default(); papers.len()];
        for (paper_idx, slot_idx, outcome) in results {
            let slot = &self.slots[slot_idx];
            match outcome {
                LookupOutcome::Value(value) => {
                    slot.provider.apply(&mut signal_sets[paper_idx], value);
                }
                LookupOutcome::Skipped => {}
                LookupOutcome::Failed => {
                    *failures.entry(slot.provider.name().to_string()).or_insert(0) += 1;
                }
            }
        }

        let enriched = papers
            .into_iter()
            .zip(signal_sets)
            .map(|(paper, signals)| EnrichedPaper { paper, signals })
            .collect();

        (enriched, failures)
    }
}

/// Run one provider lookup for one paper: cache, cap, timeout.
///
/// `try_get_with` coalesces concurrent lookups for the same key, so papers
/// sharing an identifier cost one upstream call. Failures are not cached;
/// only values (including valid upstream misses, stored as 0) are.
async fn lookup_one(slot: &ProviderSlot, paper: &MergedPaper, timeout: Duration) -> LookupOutcome {
    let Some(key) = slot.provider.lookup_key(paper) else {
        return LookupOutcome::Skipped;
    };

    let result = slot
        .cache
        .try_get_with(key.clone(), async {
            let _permit =
                slot.limiter.acquire().await.expect("provider semaphore is never closed");

            match tokio::time::timeout(timeout, slot.provider.fetch(paper)).await {
                Ok(Ok(value)) => Ok(value),
                // Upstream says the thing doesn't exist: a valid zero.
                Ok(Err(err)) if err.is_missing() => Ok(0),
                Ok(Err(err)) => Err(err),
                Err(_) => Err(crate::error::ClientError::Timeout(timeout)),
            }
        })
        .await;

    match result {
        Ok(value) => LookupOutcome::Value(value),
        Err(err) => {
            tracing::warn!(
                provider = slot.provider.name(),
                key = %key,
                error = %err,
                "signal lookup failed"
            );
            LookupOutcome::Failed
        }
    }
}

impl std::fmt::Debug for EnrichmentBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.slots.iter().map(|s| s.provider.name()).collect();
        f.debug_struct("EnrichmentBroker").field("providers", &names).finish()
    }
}
