//! Configuration for the digest pipeline.

use std::time::Duration;

use crate::error::{PipelineError, PipelineResult};

/// Upstream API constants.
pub mod api {
    use std::time::Duration;

    /// arXiv listing API endpoint.
    pub const ARXIV_API: &str = "http://export.arxiv.org/api/query";

    /// Trending-papers API endpoint.
    pub const TRENDING_API: &str = "https://paperswithcode.com/api/v1";

    /// Citation graph API endpoint.
    pub const CITATION_API: &str = "https://api.semanticscholar.org/graph/v1";

    /// Repository metadata API endpoint.
    pub const REPO_API: &str = "https://api.github.com";

    /// Request timeout for source listing calls.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection timeout.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Per-call timeout for enrichment provider lookups.
    pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

    /// Retries per provider call on transient failures.
    pub const PROVIDER_MAX_RETRIES: u32 = 2;

    /// Concurrent in-flight calls allowed per provider.
    pub const PROVIDER_CONCURRENCY: usize = 4;

    /// Maximum entries per provider cache.
    pub const CACHE_MAX_SIZE: u64 = 1000;

    /// Page size for arXiv listing queries.
    pub const ARXIV_PAGE_SIZE: u32 = 100;

    /// Page size for trending-paper queries.
    pub const TRENDING_PAGE_SIZE: u32 = 50;
}

/// Ranking weight defaults (citations / repo stars / social buzz).
pub mod weights {
    /// Weight of the log-citation term.
    pub const CITATION: f64 = 0.5;

    /// Weight of the normalized repository-star term.
    pub const STARS: f64 = 0.3;

    /// Weight of the reserved social-buzz term.
    pub const SOCIAL: f64 = 0.2;
}

/// Default arXiv topic categories.
pub const DEFAULT_TOPICS: &[&str] = &["cs.AI", "cs.LG", "cs.CL", "cs.CV"];

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Lookback window in days.
    pub days_lookback: u32,

    /// Topic categories to harvest.
    pub topics: Vec<String>,

    /// How many papers to keep after ranking.
    pub top_k: usize,

    /// Weight of the citation term in the composite score.
    pub citation_weight: f64,

    /// Weight of the normalized-stars term.
    pub stars_weight: f64,

    /// Weight of the reserved social-buzz term.
    pub social_weight: f64,

    /// arXiv listing API base URL (overridable for mock servers).
    pub arxiv_api_url: String,

    /// Trending-papers API base URL.
    pub trending_api_url: String,

    /// Citation graph API base URL.
    pub citation_api_url: String,

    /// Repository metadata API base URL.
    pub repo_api_url: String,

    /// Citation API key (optional).
    pub citation_api_key: Option<String>,

    /// Repository API token (optional).
    pub repo_api_token: Option<String>,

    /// Request timeout for source fetches.
    pub request_timeout: Duration,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// Per-call timeout for provider lookups.
    pub provider_timeout: Duration,

    /// Retries per provider call on transient failures.
    pub provider_max_retries: u32,

    /// Concurrent in-flight calls allowed per provider.
    pub provider_concurrency: usize,

    /// Maximum entries per provider cache.
    pub cache_max_size: u64,
}

impl Config {
    /// Create a configuration with default endpoints and weights.
    #[must_use]
    pub fn new(citation_api_key: Option<String>, repo_api_token: Option<String>) -> Self {
        Self {
            days_lookback: 7,
            topics: DEFAULT_TOPICS.iter().map(ToString::to_string).collect(),
            top_k: 10,
            citation_weight: weights::CITATION,
            stars_weight: weights::STARS,
            social_weight: weights::SOCIAL,
            arxiv_api_url: api::ARXIV_API.to_string(),
            trending_api_url: api::TRENDING_API.to_string(),
            citation_api_url: api::CITATION_API.to_string(),
            repo_api_url: api::REPO_API.to_string(),
            citation_api_key,
            repo_api_token,
            request_timeout: api::REQUEST_TIMEOUT,
            connect_timeout: api::CONNECT_TIMEOUT,
            provider_timeout: api::PROVIDER_TIMEOUT,
            provider_max_retries: api::PROVIDER_MAX_RETRIES,
            provider_concurrency: api::PROVIDER_CONCURRENCY,
            cache_max_size: api::CACHE_MAX_SIZE,
        }
    }

    /// Create a test configuration pointing every endpoint at a mock server.
    #[must_use]
    pub fn for_testing(base_url: &str) -> Self {
        Self {
            days_lookback: 7,
            topics: vec!["cs.AI".to_string()],
            top_k: 10,
            citation_weight: weights::CITATION,
            stars_weight: weights::STARS,
            social_weight: weights::SOCIAL,
            arxiv_api_url: format!("{base_url}/arxiv/query"),
            trending_api_url: format!("{base_url}/trending/v1"),
            citation_api_url: format!("{base_url}/graph/v1"),
            repo_api_url: format!("{base_url}/repos-api"),
            citation_api_key: None,
            repo_api_token: None,
            request_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
            provider_timeout: Duration::from_secs(5),
            provider_max_retries: 0, // No retries in tests
            provider_concurrency: api::PROVIDER_CONCURRENCY,
            cache_max_size: api::CACHE_MAX_SIZE,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Recognized variables: `DAYS_LOOKBACK`, `TOP_K_PAPERS`,
    /// `ARXIV_CATEGORIES` (comma-separated), `SEMANTIC_SCHOLAR_API_KEY`,
    /// `GITHUB_TOKEN`.
    ///
    /// # Errors
    ///
    /// Returns error if a numeric variable fails to parse.
    pub fn from_env() -> anyhow::Result<Self> {
        let citation_api_key = std::env::var("SEMANTIC_SCHOLAR_API_KEY").ok();
        let repo_api_token = std::env::var("GITHUB_TOKEN").ok();
        let mut config = Self::new(citation_api_key, repo_api_token);

        if let Ok(days) = std::env::var("DAYS_LOOKBACK") {
            config.days_lookback = days.parse()?;
        }
        if let Ok(top_k) = std::env::var("TOP_K_PAPERS") {
            config.top_k = top_k.parse()?;
        }
        if let Ok(raw) = std::env::var("ARXIV_CATEGORIES") {
            let topics: Vec<String> =
                raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect();
            if !topics.is_empty() {
                config.topics = topics;
            }
        }

        Ok(config)
    }

    /// Validate the configuration, collecting every problem at once.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] listing each invalid input.
    pub fn validate(&self) -> PipelineResult<()> {
        let mut issues = Vec::new();

        if self.days_lookback == 0 {
            issues.push("days_lookback must be positive".to_string());
        }
        if self.topics.is_empty() {
            issues.push("topics must not be empty".to_string());
        }
        if self.topics.iter().any(|t| t.trim().is_empty()) {
            issues.push("topics must not contain blank entries".to_string());
        }

        if issues.is_empty() { Ok(()) } else { Err(PipelineError::invalid_config(issues)) }
    }

    /// Check if a citation API key is configured.
    #[must_use]
    pub const fn has_citation_api_key(&self) -> bool {
        self.citation_api_key.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.days_lookback, 7);
        assert_eq!(config.top_k, 10);
        assert!(!config.has_citation_api_key());
        assert_eq!(config.topics.len(), DEFAULT_TOPICS.len());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_weights_sum_to_one() {
        let config = Config::default();
        let sum = config.citation_weight + config.stars_weight + config.social_weight;
        assert!((sum - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_validate_rejects_zero_lookback() {
        let mut config = Config::default();
        config.days_lookback = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("days_lookback"));
    }

    #[test]
    fn test_validate_collects_all_issues() {
        let mut config = Config::default();
        config.days_lookback = 0;
        config.topics.clear();
        let err = config.validate().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("days_lookback"));
        assert!(msg.contains("topics"));
    }

    #[test]
    fn test_for_testing_points_at_base_url() {
        let config = Config::for_testing("http://127.0.0.1:9999");
        assert!(config.arxiv_api_url.starts_with("http://127.0.0.1:9999"));
        assert!(config.citation_api_url.ends_with("/graph/v1"));
        assert_eq!(config.provider_max_retries, 0);
    }
}
