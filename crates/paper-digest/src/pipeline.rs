//! Pipeline orchestrator: harvest, merge, enrich, score, select.
//!
//! The orchestrator holds no persistent state: running twice with the same
//! run key and window recomputes the same result purely, so idempotency at
//! the publishing boundary is the downstream collaborator's only concern.
//! Soft failures (an unreachable source, a timed-out provider call) are
//! absorbed into the [`RunReport`]; only configuration-level problems and
//! total harvest failure surface as errors.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;

use crate::config::Config;
use crate::enrich::EnrichmentBroker;
use crate::error::{PipelineError, PipelineResult};
use crate::models::{PipelineState, RunReport, ScoredPaper, SourceTally};
use crate::sources::{SourceAdapter, TimeRange};
use crate::{resolve, score, select};

/// Final result of a pipeline run, handed to the summarization collaborator.
#[derive(Debug)]
pub struct PipelineOutcome {
    /// Top-K papers, best first.
    pub papers: Vec<ScoredPaper>,

    /// Counts, soft failures, and timing for this run.
    pub report: RunReport,
}

/// Sequences the pipeline stages over registered sources and providers.
pub struct Pipeline {
    config: Config,
    adapters: Vec<Arc<dyn SourceAdapter>>,
    broker: EnrichmentBroker,
}

impl Pipeline {
    /// Create a pipeline over the given adapters and enrichment broker.
    #[must_use]
    pub fn new(
        config: Config,
        adapters: Vec<Arc<dyn SourceAdapter>>,
        broker: EnrichmentBroker,
    ) -> Self {
        Self { config, adapters, broker }
    }

    /// Execute one run under the caller's idempotency key.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] on invalid configuration, an empty adapter
    /// set, or when harvesting yields nothing at all (every source failed,
    /// or every source succeeded with zero records).
    pub async fn run(&self, run_key: &str) -> PipelineResult<PipelineOutcome> {
        let started = Instant::now();
        let mut report = RunReport::new(run_key);

        tracing::info!(run_key = %run_key, "pipeline run starting");

        self.config.validate().inspect_err(|err| {
            tracing::error!(run_key = %run_key, error = %err, "configuration rejected");
        })?;
        if self.adapters.is_empty() {
            return Err(PipelineError::NoSources);
        }

        // Harvest: all adapters concurrently, no shared state between them.
        report.state = PipelineState::Harvesting;
        let window = TimeRange::last_days(self.config.days_lookback);
        let records = self.harvest(&window, &mut report).await?;

        // Merge: group by fingerprint, fold each group.
        report.state = PipelineState::Merging;
        let merged = resolve::merge(records);
        report.merged = merged.len();
        tracing::info!(merged = merged.len(), "records merged");

        // Enrich: signal providers with caching, caps, and local recovery.
        report.state = PipelineState::Enriching;
        let (enriched, provider_failures) = self.broker.enrich_all(merged).await;
        report.provider_failures = provider_failures;
        for (provider, failed) in &report.provider_failures {
            if *failed > 0 {
                tracing::warn!(provider = %provider, failed, "provider lookups degraded");
            }
        }

        // Score and select: synchronous, deterministic.
        report.state = PipelineState::Scoring;
        let scored = score::score(enriched, &self.config);

        report.state = PipelineState::Selecting;
        let papers = select::select(scored, self.config.top_k);

        report.state = PipelineState::Completed;
        report.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        tracing::info!(
            run_key = %run_key,
            fetched = report.total_fetched(),
            merged = report.merged,
            selected = papers.len(),
            elapsed_ms = report.elapsed_ms,
            "pipeline run completed"
        );

        Ok(PipelineOutcome { papers, report })
    }

    /// Fetch from every adapter, tallying soft failures.
    async fn harvest(
        &self,
        window: &TimeRange,
        report: &mut RunReport,
    ) -> PipelineResult<Vec<crate::models::RawRecord>> {
        let topics = &self.config.topics;
        let fetches = self.adapters.iter().map(|adapter| {
            let adapter = Arc::clone(adapter);
            async move {
                let result = adapter.fetch(window, topics).await;
                (adapter.name(), result)
            }
        });

        // join_all preserves adapter registration order, keeping the
        // concatenated record order reproducible.
        let outcomes = join_all(fetches).await;

        let mut records = Vec::new();
        let mut errors = Vec::new();
        for (name, result) in outcomes {
            match result {
                Ok(batch) => {
                    tracing::info!(source = name, fetched = batch.len(), "source harvested");
                    report.sources.push(SourceTally {
                        source: name.to_string(),
                        fetched: batch.len(),
                        error: None,
                    });
                    records.extend(batch);
                }
                Err(err) => {
                    tracing::warn!(source = name, error = %err, "source failed");
                    errors.push(format!("{name}: {err}"));
                    report.sources.push(SourceTally {
                        source: name.to_string(),
                        fetched: 0,
                        error: Some(err.to_string()),
                    });
                }
            }
        }

        if errors.len() == self.adapters.len() {
            return Err(PipelineError::AllSourcesFailed { errors });
        }
        if records.is_empty() {
            return Err(PipelineError::NoRecords);
        }

        Ok(records)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sources: Vec<&str> = self.adapters.iter().map(|a| a.name()).collect();
        f.debug_struct("Pipeline")
            .field("sources", &sources)
            .field("providers", &self.broker.provider_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ClientError, ClientResult};
    use crate::models::RawRecord;
    use chrono::{Duration, Utc};

    /// Fixed-output adapter for orchestration tests.
    struct StaticSource {
        name: &'static str,
        records: Vec<RawRecord>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl SourceAdapter for StaticSource {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn fetch(
            &self,
            _window: &TimeRange,
            _topics: &[String],
        ) -> ClientResult<Vec<RawRecord>> {
            if self.fail {
                Err(ClientError::server(503, "unavailable"))
            } else {
                Ok(self.records.clone())
            }
        }
    }

    fn record(arxiv_id: &str, title: &str) -> RawRecord {
        RawRecord {
            source: "static".to_string(),
            arxiv_id: Some(arxiv_id.to_string()),
            title: title.to_string(),
            published: Some(Utc::now() - Duration::days(1)),
            ..RawRecord::default()
        }
    }

    fn pipeline(sources: Vec<StaticSource>) -> Pipeline {
        let config = Config::default();
        let broker = EnrichmentBroker::new(&config, Vec::new());
        let adapters: Vec<Arc<dyn SourceAdapter>> =
            sources.into_iter().map(|s| Arc::new(s) as Arc<dyn SourceAdapter>).collect();
        Pipeline::new(config, adapters, broker)
    }

    #[tokio::test]
    async fn test_run_tolerates_partial_source_failure() {
        let p = pipeline(vec![
            StaticSource { name: "up", records: vec![record("1", "Alpha")], fail: false },
            StaticSource { name: "down", records: Vec::new(), fail: true },
        ]);

        let outcome = p.run("2026-W35").await.unwrap();
        assert_eq!(outcome.papers.len(), 1);
        assert_eq!(outcome.report.failed_sources(), 1);
        assert_eq!(outcome.report.state, PipelineState::Completed);
    }

    #[tokio::test]
    async fn test_run_fails_when_all_sources_fail() {
        let p = pipeline(vec![
            StaticSource { name: "a", records: Vec::new(), fail: true },
            StaticSource { name: "b", records: Vec::new(), fail: true },
        ]);

        let err = p.run("2026-W35").await.unwrap_err();
        assert!(matches!(err, PipelineError::AllSourcesFailed { .. }));
    }

    #[tokio::test]
    async fn test_run_fails_on_zero_records() {
        let p = pipeline(vec![StaticSource { name: "quiet", records: Vec::new(), fail: false }]);

        let err = p.run("2026-W35").await.unwrap_err();
        assert!(matches!(err, PipelineError::NoRecords));
    }

    #[tokio::test]
    async fn test_run_fails_without_adapters() {
        let p = pipeline(Vec::new());
        let err = p.run("2026-W35").await.unwrap_err();
        assert!(matches!(err, PipelineError::NoSources));
    }

    #[tokio::test]
    async fn test_run_rejects_invalid_config() {
        let mut config = Config::default();
        config.days_lookback = 0;
        let broker = EnrichmentBroker::new(&config, Vec::new());
        let adapters: Vec<Arc<dyn SourceAdapter>> = vec![Arc::new(StaticSource {
            name: "up",
            records: vec![record("1", "Alpha")],
            fail: false,
        })];
        let p = Pipeline::new(config, adapters, broker);

        let err = p.run("2026-W35").await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfig { .. }));
    }

    #[tokio::test]
    async fn test_run_is_repeatable() {
        let p = pipeline(vec![StaticSource {
            name: "up",
            records: vec![record("1", "Alpha"), record("2", "Beta"), record("1", "Alpha v2")],
            fail: false,
        }]);

        let first = p.run("2026-W35").await.unwrap();
        let second = p.run("2026-W35").await.unwrap();

        let titles = |o: &PipelineOutcome| {
            o.papers.iter().map(|p| p.paper.title.clone()).collect::<Vec<_>>()
        };
        assert_eq!(titles(&first), titles(&second));
        assert_eq!(first.report.merged, 2);
    }
}
