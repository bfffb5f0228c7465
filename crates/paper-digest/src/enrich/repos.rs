//! Repository-star provider backed by a code-hosting API.
//!
//! The lookup key is the paper's repository URL, taken from the record when a
//! source reported one, otherwise extracted from the abstract and title text
//! by GitHub-URL pattern. A deleted or private repository (404) yields 0
//! stars without counting as a provider failure.

use std::sync::LazyLock;

use regex::Regex;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use url::Url;

use super::SignalProvider;
use crate::config::Config;
use crate::error::{ClientError, ClientResult};
use crate::http;
use crate::models::{MergedPaper, SignalSet};

/// Provider name as it appears in run reports.
pub const PROVIDER_NAME: &str = "repo_stars";

static GITHUB_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:https?://)?github\.com/[A-Za-z0-9_.-]+/[A-Za-z0-9_.-]+")
        .expect("github url pattern is valid")
});

/// Looks up repository star counts for merged papers.
pub struct RepoStarsProvider {
    client: ClientWithMiddleware,
    base_url: String,
}

/// Repository metadata payload.
#[derive(Debug, Deserialize)]
struct RepoInfo {
    #[serde(default)]
    stargazers_count: u64,
}

impl RepoStarsProvider {
    /// Create a provider from the pipeline configuration.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails or the token is not
    /// a valid header value.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(ref token) = config.repo_api_token {
            headers.insert(reqwest::header::AUTHORIZATION, format!("token {token}").parse()?);
        }

        Ok(Self {
            client: http::build_client(config, headers)?,
            base_url: config.repo_api_url.clone(),
        })
    }
}

#[async_trait::async_trait]
impl SignalProvider for RepoStarsProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn lookup_key(&self, paper: &MergedPaper) -> Option<String> {
        repo_url_for(paper)
    }

    async fn fetch(&self, paper: &MergedPaper) -> ClientResult<u64> {
        let Some(repo_url) = repo_url_for(paper) else {
            return Ok(0);
        };
        let Some((owner, repo)) = parse_owner_repo(&repo_url) else {
            tracing::debug!(url = %repo_url, "repository url has no owner/repo path");
            return Ok(0);
        };

        let url = format!("{}/repos/{owner}/{repo}", self.base_url);
        let response = self.client.get(&url).send().await?;
        let response = http::check_status(response).await?;
        let info: RepoInfo = response.json().await?;

        Ok(info.stargazers_count)
    }

    fn apply(&self, signals: &mut SignalSet, value: u64) {
        signals.repo_stars = value;
    }
}

/// Repository URL for a paper: the recorded one, else the first GitHub URL
/// mentioned in the abstract or title.
fn repo_url_for(paper: &MergedPaper) -> Option<String> {
    if let Some(ref url) = paper.repo_url {
        if !url.trim().is_empty() {
            return Some(url.trim().to_string());
        }
    }

    let text = format!("{} {}", paper.abstract_text, paper.title);
    GITHUB_URL.find(&text).map(|m| {
        // Sentence-final punctuation is not part of the repo name.
        let raw = m.as_str().trim_end_matches('.');
        if raw.to_lowercase().starts_with("http") {
            raw.to_string()
        } else {
            format!("https://{raw}")
        }
    })
}

/// Extract `(owner, repo)` from a repository URL, stripping any `.git` suffix.
fn parse_owner_repo(repo_url: &str) -> Option<(String, String)> {
    let parsed = Url::parse(repo_url).ok()?;
    let mut segments = parsed.path_segments()?.filter(|s| !s.is_empty());

    let owner = segments.next()?.to_string();
    let repo = segments.next()?.trim_end_matches(".git").to_string();
    if owner.is_empty() || repo.is_empty() { None } else { Some((owner, repo)) }
}
