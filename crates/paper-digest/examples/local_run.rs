//! Run the full pipeline against the real upstream APIs.
//!
//! Intended for local development only; the hosting process owns scheduling
//! and publishing in production. Configuration comes from the environment
//! (`DAYS_LOOKBACK`, `TOP_K_PAPERS`, `ARXIV_CATEGORIES`,
//! `SEMANTIC_SCHOLAR_API_KEY`, `GITHUB_TOKEN`).
//!
//! ```sh
//! RUST_LOG=paper_digest=debug cargo run --example local_run
//! ```

use std::sync::Arc;

use paper_digest::enrich::{CitationProvider, EnrichmentBroker, RepoStarsProvider, SignalProvider};
use paper_digest::sources::{ArxivAdapter, SourceAdapter, TrendingAdapter};
use paper_digest::{Config, Pipeline};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paper_digest=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    let adapters: Vec<Arc<dyn SourceAdapter>> =
        vec![Arc::new(ArxivAdapter::new(&config)?), Arc::new(TrendingAdapter::new(&config)?)];
    let providers: Vec<Arc<dyn SignalProvider>> = vec![
        Arc::new(CitationProvider::new(&config)?),
        Arc::new(RepoStarsProvider::new(&config)?),
    ];
    let broker = EnrichmentBroker::new(&config, providers);

    // ISO week of the current date, e.g. "2026-W35".
    let run_key = chrono::Utc::now().format("%G-W%V").to_string();

    let outcome = Pipeline::new(config, adapters, broker).run(&run_key).await?;

    for (rank, paper) in outcome.papers.iter().enumerate() {
        println!(
            "#{:<2} {:.3}  {} (citations: {}, stars: {})",
            rank + 1,
            paper.score,
            paper.paper.title,
            paper.signals.citations,
            paper.signals.repo_stars,
        );
    }
    println!("{}", serde_json::to_string_pretty(&outcome.report)?);

    Ok(())
}
