//! Mock-based enrichment provider tests using wiremock.
//!
//! These verify the provider HTTP behavior and the broker's degradation
//! policy against a mocked citation graph and repository API.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use paper_digest::config::Config;
use paper_digest::enrich::{CitationProvider, EnrichmentBroker, RepoStarsProvider, SignalProvider};
use paper_digest::models::{Fingerprint, MergedPaper};

fn paper(arxiv_id: Option<&str>, title: &str, repo_url: Option<&str>) -> MergedPaper {
    MergedPaper {
        fingerprint: Fingerprint(format!("test:{title}")),
        title: title.to_string(),
        published: None,
        arxiv_id: arxiv_id.map(String::from),
        doi: None,
        url: None,
        repo_url: repo_url.map(String::from),
        authors: vec!["Ada Lovelace".to_string()],
        abstract_text: String::new(),
        categories: Vec::new(),
        sources: vec!["arxiv".to_string()],
    }
}

fn broker_with(config: &Config, provider: Arc<dyn SignalProvider>) -> EnrichmentBroker {
    EnrichmentBroker::new(config, vec![provider])
}

#[tokio::test]
async fn test_citations_resolved_by_arxiv_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/arXiv:2401.00001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "paperId": "abc",
            "title": "Foo: A Method",
            "citationCount": 123
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = Config::for_testing(&mock_server.uri());
    let provider = Arc::new(CitationProvider::new(&config).unwrap());
    let broker = broker_with(&config, provider);

    let (enriched, failures) =
        broker.enrich_all(vec![paper(Some("2401.00001"), "Foo: A Method", None)]).await;

    assert_eq!(enriched[0].signals.citations, 123);
    assert_eq!(failures["citations"], 0);
}

#[tokio::test]
async fn test_citations_fall_back_to_title_search() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/arXiv:2401.99999"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Paper not found"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/search"))
        .and(query_param("query", "Foo: A Method"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 1,
            "data": [{"paperId": "abc", "title": "Foo: a method", "citationCount": 55}]
        })))
        .mount(&mock_server)
        .await;

    let config = Config::for_testing(&mock_server.uri());
    let provider = Arc::new(CitationProvider::new(&config).unwrap());
    let broker = broker_with(&config, provider);

    let (enriched, failures) =
        broker.enrich_all(vec![paper(Some("2401.99999"), "Foo: A Method", None)]).await;

    assert_eq!(enriched[0].signals.citations, 55);
    assert_eq!(failures["citations"], 0);
}

#[tokio::test]
async fn test_citations_reject_dissimilar_search_hit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 1,
            "data": [{"paperId": "abc", "title": "An Entirely Unrelated Survey", "citationCount": 9000}]
        })))
        .mount(&mock_server)
        .await;

    let config = Config::for_testing(&mock_server.uri());
    let provider = Arc::new(CitationProvider::new(&config).unwrap());
    let broker = broker_with(&config, provider);

    // No arXiv id, so the provider goes straight to title search.
    let (enriched, failures) =
        broker.enrich_all(vec![paper(None, "Foo: A Method", None)]).await;

    assert_eq!(enriched[0].signals.citations, 0);
    assert_eq!(failures["citations"], 0);
}

#[tokio::test]
async fn test_repo_stars_fetched() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos-api/repos/foo/bar"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "full_name": "foo/bar",
            "stargazers_count": 777
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = Config::for_testing(&mock_server.uri());
    let provider = Arc::new(RepoStarsProvider::new(&config).unwrap());
    let broker = broker_with(&config, provider);

    let (enriched, failures) = broker
        .enrich_all(vec![paper(None, "Foo", Some("https://github.com/foo/bar.git"))])
        .await;

    assert_eq!(enriched[0].signals.repo_stars, 777);
    assert_eq!(failures["repo_stars"], 0);
}

#[tokio::test]
async fn test_repo_stars_missing_repo_is_zero_not_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos-api/repos/gone/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&mock_server)
        .await;

    let config = Config::for_testing(&mock_server.uri());
    let provider = Arc::new(RepoStarsProvider::new(&config).unwrap());
    let broker = broker_with(&config, provider);

    let (enriched, failures) = broker
        .enrich_all(vec![paper(None, "Gone", Some("https://github.com/gone/gone"))])
        .await;

    assert_eq!(enriched[0].signals.repo_stars, 0);
    assert_eq!(failures["repo_stars"], 0);
}

#[tokio::test]
async fn test_provider_outage_tallied_per_paper() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("meltdown"))
        .mount(&mock_server)
        .await;

    let config = Config::for_testing(&mock_server.uri());
    let provider = Arc::new(CitationProvider::new(&config).unwrap());
    let broker = broker_with(&config, provider);

    let batch = vec![
        paper(Some("2401.00001"), "Alpha", None),
        paper(Some("2401.00002"), "Beta", None),
        paper(Some("2401.00003"), "Gamma", None),
    ];
    let (enriched, failures) = broker.enrich_all(batch).await;

    // Full output with the provider's term at zero, failures == batch size.
    assert_eq!(enriched.len(), 3);
    assert!(enriched.iter().all(|e| e.signals.citations == 0));
    assert_eq!(failures["citations"], 3);
}

#[tokio::test]
async fn test_shared_identifier_hits_cache() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/arXiv:2401.00001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "paperId": "abc",
            "title": "Foo",
            "citationCount": 5
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = Config::for_testing(&mock_server.uri());
    let provider = Arc::new(CitationProvider::new(&config).unwrap());
    let broker = broker_with(&config, provider);

    // Same lookup key three times: coalesced into one upstream call.
    let batch = vec![
        paper(Some("2401.00001"), "Foo", None),
        paper(Some("2401.00001"), "Foo again", None),
        paper(Some("2401.00001"), "Foo the third", None),
    ];
    let (enriched, _) = broker.enrich_all(batch).await;

    assert!(enriched.iter().all(|e| e.signals.citations == 5));
}
