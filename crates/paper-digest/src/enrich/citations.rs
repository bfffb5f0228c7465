//! Citation-count provider backed by a citation graph API.
//!
//! Resolution order: direct `arXiv:<id>` lookup, then a title search whose
//! top hit is accepted only when its word-set Jaccard similarity against the
//! canonical title reaches 0.8. A paper the graph simply doesn't know about
//! yields 0 citations, not a failure.

use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;

use super::SignalProvider;
use crate::config::Config;
use crate::error::{ClientError, ClientResult};
use crate::http;
use crate::models::{MergedPaper, SignalSet};
use crate::resolve;

/// Provider name as it appears in run reports.
pub const PROVIDER_NAME: &str = "citations";

/// Minimum title similarity for accepting a search hit.
const TITLE_SIMILARITY_THRESHOLD: f64 = 0.8;

/// Fields requested from the citation graph.
const FIELDS: &str = "paperId,title,citationCount";

/// Looks up citation counts for merged papers.
pub struct CitationProvider {
    client: ClientWithMiddleware,
    base_url: String,
}

/// Citation graph paper payload.
#[derive(Debug, Deserialize)]
struct GraphPaper {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, rename = "citationCount")]
    citation_count: Option<u64>,
}

/// Title search page.
#[derive(Debug, Deserialize)]
struct GraphSearchPage {
    #[serde(default)]
    data: Vec<GraphPaper>,
}

impl CitationProvider {
    /// Create a provider from the pipeline configuration.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails or the API key is
    /// not a valid header value.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(ref key) = config.citation_api_key {
            headers.insert("x-api-key", key.parse()?);
        }

        Ok(Self {
            client: http::build_client(config, headers)?,
            base_url: config.citation_api_url.clone(),
        })
    }

    /// Direct lookup by arXiv id.
    async fn by_arxiv_id(&self, arxiv_id: &str) -> ClientResult<GraphPaper> {
        let url = format!("{}/paper/arXiv:{}", self.base_url, arxiv_id);
        let params = vec![("fields".to_string(), FIELDS.to_string())];

        let response = self.client.get(&url).query(&params).send().await?;
        let response = http::check_status(response).await?;
        Ok(response.json().await?)
    }

    /// Title search fallback, gated by similarity.
    async fn by_title(&self, title: &str) -> ClientResult<Option<GraphPaper>> {
        let url = format!("{}/paper/search", self.base_url);
        let params = vec![
            ("query".to_string(), title.to_string()),
            ("limit".to_string(), "1".to_string()),
            ("fields".to_string(), FIELDS.to_string()),
        ];

        let response = self.client.get(&url).query(&params).send().await?;
        let response = http::check_status(response).await?;
        let page: GraphSearchPage = response.json().await?;

        Ok(page.data.into_iter().next().filter(|hit| {
            hit.title
                .as_deref()
                .is_some_and(|t| title_similarity(title, t) >= TITLE_SIMILARITY_THRESHOLD)
        }))
    }
}

#[async_trait::async_trait]
impl SignalProvider for CitationProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn lookup_key(&self, paper: &MergedPaper) -> Option<String> {
        paper
            .arxiv_id
            .clone()
            .or_else(|| Some(resolve::normalize_text(&paper.title)).filter(|t| !t.is_empty()))
    }

    async fn fetch(&self, paper: &MergedPaper) -> ClientResult<u64> {
        if let Some(ref arxiv_id) = paper.arxiv_id {
            match self.by_arxiv_id(arxiv_id).await {
                Ok(hit) => return Ok(hit.citation_count.unwrap_or(0)),
                // Unknown to the graph under that id; fall through to title search.
                Err(err) if err.is_missing() => {}
                Err(err) => return Err(err),
            }
        }

        match self.by_title(&paper.title).await? {
            Some(hit) => Ok(hit.citation_count.unwrap_or(0)),
            None => {
                tracing::debug!(title = %paper.title, "paper not found in citation graph");
                Ok(0)
            }
        }
    }

    fn apply(&self, signals: &mut SignalSet, value: u64) {
        signals.citations = value;
    }
}

/// Word-set Jaccard similarity between two titles, case/punctuation blind.
fn title_similarity(a: &str, b: &str) -> f64 {
    use std::collections::HashSet;

    let norm_a = resolve::normalize_text(a);
    let norm_b = resolve::normalize_text(b);
    let words_a: HashSet<&str> = norm_a.split(' ').filter(|w| !w.is_empty()).collect();
    let words_b: HashSet<&str> = norm_b.split(' ').filter(|w| !w.is_empty()).collect();

    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }

    let intersection = words_a.intersection(&words_b).count();
    let union = words_a.union(&words_b).count();
    intersection as f64 / union as f64
}
