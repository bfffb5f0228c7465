//! Paper Digest pipeline core
//!
//! Harvests scholarly-paper metadata from heterogeneous catalogs, merges and
//! deduplicates it by identity fingerprint, enriches it with secondary signals
//! (citation counts, repository stars), and hands back a deterministic top-K
//! ranking plus a run report.
//!
//! # Features
//!
//! - **Pluggable sources**: anything implementing [`sources::SourceAdapter`]
//! - **Fingerprint dedup**: DOI / arXiv id / normalized-title grouping, no pairwise matching
//! - **Degradable enrichment**: provider failures default to zero, never abort a run
//! - **Deterministic ranking**: total order, reproducible byte-for-byte
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use paper_digest::{Config, Pipeline};
//! use paper_digest::sources::{ArxivAdapter, SourceAdapter};
//! use paper_digest::enrich::{CitationProvider, EnrichmentBroker, RepoStarsProvider, SignalProvider};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let adapters: Vec<Arc<dyn SourceAdapter>> =
//!         vec![Arc::new(ArxivAdapter::new(&config)?)];
//!     let providers: Vec<Arc<dyn SignalProvider>> = vec![
//!         Arc::new(CitationProvider::new(&config)?),
//!         Arc::new(RepoStarsProvider::new(&config)?),
//!     ];
//!     let broker = EnrichmentBroker::new(&config, providers);
//!     let outcome = Pipeline::new(config, adapters, broker).run("2026-W35").await?;
//!     println!("{} papers ranked", outcome.papers.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod enrich;
pub mod error;
pub mod http;
pub mod models;
pub mod pipeline;
pub mod resolve;
pub mod score;
pub mod select;
pub mod sources;

pub use config::Config;
pub use error::{ClientError, PipelineError};
pub use models::{MergedPaper, RawRecord, RunReport, ScoredPaper, SignalSet};
pub use pipeline::{Pipeline, PipelineOutcome};
