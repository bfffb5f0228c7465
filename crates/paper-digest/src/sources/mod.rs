//! Source adapters: fetch raw paper records from external catalogs.
//!
//! Each adapter implements the [`SourceAdapter`] capability and normalizes
//! its upstream's wire format into [`RawRecord`]s. Adapters hold no shared
//! mutable state, so the orchestrator runs them concurrently without
//! coordination. An unreachable source or an empty result is a soft failure,
//! absorbed into the run report by the orchestrator.

mod arxiv;
mod trending;

use chrono::{DateTime, Duration, Utc};

use crate::error::ClientResult;
use crate::models::RawRecord;

pub use arxiv::ArxivAdapter;
pub use trending::TrendingAdapter;

/// The harvesting lookback window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    /// Inclusive lower bound.
    pub since: DateTime<Utc>,
    /// Exclusive upper bound.
    pub until: DateTime<Utc>,
}

impl TimeRange {
    /// Window covering the last `days` days, ending now.
    #[must_use]
    pub fn last_days(days: u32) -> Self {
        Self::ending_at(Utc::now(), days)
    }

    /// Window covering the `days` days before `until`.
    #[must_use]
    pub fn ending_at(until: DateTime<Utc>, days: u32) -> Self {
        Self { since: until - Duration::days(i64::from(days)), until }
    }

    /// Check whether a timestamp falls inside the window.
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.since && at < self.until
    }
}

/// Capability implemented by every paper catalog.
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Stable adapter name, used in run reports and merged-paper audit trails.
    fn name(&self) -> &'static str;

    /// Fetch records published inside `window`, scoped to `topics` where the
    /// upstream supports topical queries.
    ///
    /// # Errors
    ///
    /// Returns error when the source is unreachable or returns garbage. The
    /// orchestrator treats this as a soft failure; it never aborts the run.
    async fn fetch(&self, window: &TimeRange, topics: &[String]) -> ClientResult<Vec<RawRecord>>;
}
