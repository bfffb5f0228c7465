//! Run report and pipeline state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Stages of a pipeline run.
///
/// `Failed` is reachable only from a hard configuration-level error; soft
/// source/provider failures never leave the `Completed` path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    /// Not started.
    Idle,
    /// Fetching from source adapters.
    Harvesting,
    /// Grouping records by fingerprint.
    Merging,
    /// Gathering secondary signals.
    Enriching,
    /// Computing composite scores.
    Scoring,
    /// Sorting and truncating to top-K.
    Selecting,
    /// Run finished; report is final.
    Completed,
    /// Hard failure; nothing was handed downstream.
    Failed,
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Harvesting => "harvesting",
            Self::Merging => "merging",
            Self::Enriching => "enriching",
            Self::Scoring => "scoring",
            Self::Selecting => "selecting",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Per-source fetch outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceTally {
    /// Source adapter name.
    pub source: String,

    /// Records fetched (0 on failure).
    pub fetched: usize,

    /// Soft-failure description, if the fetch errored.
    #[serde(default)]
    pub error: Option<String>,
}

/// Summary of one pipeline execution. Read-only after completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Caller-supplied idempotency key (e.g. an ISO week identifier).
    pub run_key: String,

    /// Per-source fetched counts and soft failures.
    pub sources: Vec<SourceTally>,

    /// Number of merged papers after deduplication.
    pub merged: usize,

    /// Failed lookups per enrichment provider.
    ///
    /// `BTreeMap` keeps serialization order deterministic.
    pub provider_failures: BTreeMap<String, usize>,

    /// Total wall time of the run, in milliseconds.
    pub elapsed_ms: u64,

    /// Terminal state of the run.
    pub state: PipelineState,
}

impl RunReport {
    /// Create an empty report for the given run key.
    #[must_use]
    pub fn new(run_key: impl Into<String>) -> Self {
        Self {
            run_key: run_key.into(),
            sources: Vec::new(),
            merged: 0,
            provider_failures: BTreeMap::new(),
            elapsed_ms: 0,
            state: PipelineState::Idle,
        }
    }

    /// Total records fetched across all sources.
    #[must_use]
    pub fn total_fetched(&self) -> usize {
        self.sources.iter().map(|s| s.fetched).sum()
    }

    /// Number of sources that soft-failed.
    #[must_use]
    pub fn failed_sources(&self) -> usize {
        self.sources.iter().filter(|s| s.error.is_some()).count()
    }
}
