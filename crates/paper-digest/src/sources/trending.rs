//! Trending-papers adapter.
//!
//! Queries a trending-papers JSON API ordered by repository activity and
//! normalizes results into [`RawRecord`]s. Topics are ignored: the upstream
//! has no topical query surface, only a global trending feed.

use chrono::{DateTime, NaiveDate, Utc};
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;

use super::{SourceAdapter, TimeRange};
use crate::config::{Config, api};
use crate::error::ClientResult;
use crate::http;
use crate::models::RawRecord;

/// Adapter name as it appears in run reports.
pub const SOURCE_NAME: &str = "trending";

/// Fetches trending papers ranked by repository activity.
pub struct TrendingAdapter {
    client: ClientWithMiddleware,
    base_url: String,
    page_size: u32,
}

/// One page of trending papers.
#[derive(Debug, Deserialize)]
struct TrendingPage {
    #[serde(default)]
    results: Vec<TrendingItem>,
}

/// One trending paper as the upstream reports it.
#[derive(Debug, Deserialize)]
struct TrendingItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
    #[serde(default, rename = "abstract")]
    abstract_text: Option<String>,
    #[serde(default)]
    published: Option<String>,
    #[serde(default)]
    url_abs: Option<String>,
    #[serde(default)]
    arxiv_id: Option<String>,
    #[serde(default)]
    github_url: Option<String>,
}

impl TrendingAdapter {
    /// Create an adapter from the pipeline configuration.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            client: http::build_client(config, reqwest::header::HeaderMap::new())?,
            base_url: config.trending_api_url.clone(),
            page_size: api::TRENDING_PAGE_SIZE,
        })
    }
}

#[async_trait::async_trait]
impl SourceAdapter for TrendingAdapter {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn fetch(&self, window: &TimeRange, _topics: &[String]) -> ClientResult<Vec<RawRecord>> {
        let url = format!("{}/papers/", self.base_url);
        let params = vec![
            ("ordering".to_string(), "-github_mentions".to_string()),
            ("page_size".to_string(), self.page_size.to_string()),
        ];

        let response = self.client.get(&url).query(&params).send().await?;
        let response = http::check_status(response).await?;
        let page: TrendingPage = response.json().await?;

        let records: Vec<RawRecord> = page
            .results
            .into_iter()
            .filter_map(|item| {
                let published = item.published.as_deref().and_then(parse_date)?;
                if !window.contains(published) {
                    return None;
                }
                let title = item.title.filter(|t| !t.trim().is_empty())?;

                Some(RawRecord {
                    source: SOURCE_NAME.to_string(),
                    arxiv_id: item.arxiv_id.filter(|s| !s.is_empty()),
                    doi: None,
                    url: item.url_abs.filter(|s| !s.is_empty()),
                    title: title.trim().to_string(),
                    authors: item.authors,
                    abstract_text: item.abstract_text.unwrap_or_default(),
                    published: Some(published),
                    repo_url: item.github_url.filter(|s| !s.is_empty()),
                    categories: Vec::new(),
                })
            })
            .collect();

        tracing::debug!(fetched = records.len(), "trending papers fetched");
        Ok(records)
    }
}

/// Parse an ISO timestamp or bare date, normalizing to UTC.
fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&s.replace('Z', "+00:00"))
        .map(|at| at.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_variants() {
        assert!(parse_date("2026-08-25T12:00:00Z").is_some());
        assert!(parse_date("2026-08-25T12:00:00+00:00").is_some());
        assert!(parse_date("2026-08-25").is_some());
        assert!(parse_date("").is_none());
    }

    #[test]
    fn test_trending_item_deserializes_abstract_rename() {
        let json = r#"{
            "id": "foo-paper",
            "title": "Foo",
            "abstract": "An abstract.",
            "published": "2026-08-25",
            "github_url": "https://github.com/foo/foo"
        }"#;
        let item: TrendingItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.abstract_text.as_deref(), Some("An abstract."));
        assert_eq!(item.github_url.as_deref(), Some("https://github.com/foo/foo"));
    }
}
