//! arXiv listing adapter.
//!
//! Queries the arXiv Atom listing API per topic category, newest submissions
//! first, and normalizes entries into [`RawRecord`]s. The Atom payload is
//! decoded with an event-driven `quick-xml` parser; no DOM is built.

use chrono::{DateTime, Utc};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use reqwest_middleware::ClientWithMiddleware;

use super::{SourceAdapter, TimeRange};
use crate::config::{Config, api};
use crate::error::{ClientError, ClientResult};
use crate::http;
use crate::models::RawRecord;

/// Adapter name as it appears in run reports.
pub const SOURCE_NAME: &str = "arxiv";

/// Fetches recent submissions from an arXiv-style listing API.
pub struct ArxivAdapter {
    client: ClientWithMiddleware,
    base_url: String,
    page_size: u32,
}

impl ArxivAdapter {
    /// Create an adapter from the pipeline configuration.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            client: http::build_client(config, reqwest::header::HeaderMap::new())?,
            base_url: config.arxiv_api_url.clone(),
            page_size: api::ARXIV_PAGE_SIZE,
        })
    }

    async fn fetch_topic(&self, topic: &str, window: &TimeRange) -> ClientResult<Vec<RawRecord>> {
        let params = vec![
            ("search_query".to_string(), format!("cat:{topic}")),
            ("start".to_string(), "0".to_string()),
            ("max_results".to_string(), self.page_size.to_string()),
            ("sortBy".to_string(), "submittedDate".to_string()),
            ("sortOrder".to_string(), "descending".to_string()),
        ];

        let response = self.client.get(&self.base_url).query(&params).send().await?;
        let response = http::check_status(response).await?;
        let body = response.text().await.map_err(ClientError::Http)?;

        let records = parse_listing(&body)?;
        Ok(records
            .into_iter()
            .filter(|r| r.published.is_some_and(|at| window.contains(at)))
            .collect())
    }
}

#[async_trait::async_trait]
impl SourceAdapter for ArxivAdapter {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn fetch(&self, window: &TimeRange, topics: &[String]) -> ClientResult<Vec<RawRecord>> {
        let mut records = Vec::new();
        let mut first_error: Option<ClientError> = None;
        let mut any_ok = false;

        for topic in topics {
            match self.fetch_topic(topic, window).await {
                Ok(batch) => {
                    tracing::debug!(topic = %topic, fetched = batch.len(), "arxiv topic fetched");
                    records.extend(batch);
                    any_ok = true;
                }
                Err(err) => {
                    // One bad category should not sink the others.
                    tracing::warn!(topic = %topic, error = %err, "arxiv topic fetch failed");
                    first_error.get_or_insert(err);
                }
            }
        }

        match (any_ok, first_error) {
            (false, Some(err)) => Err(err),
            _ => Ok(records),
        }
    }
}

/// Per-entry accumulator for the Atom parser.
#[derive(Default)]
struct EntryAccum {
    id: String,
    title: String,
    summary: String,
    published: String,
    authors: Vec<String>,
    categories: Vec<String>,
    link: Option<String>,
}

impl EntryAccum {
    fn into_record(self) -> Option<RawRecord> {
        if self.id.is_empty() || self.title.trim().is_empty() {
            return None;
        }

        // Entry ids look like "http://arxiv.org/abs/2401.00001v1".
        let arxiv_id = self.id.rsplit("/abs/").next().map(str::trim).unwrap_or(&self.id);

        Some(RawRecord {
            source: SOURCE_NAME.to_string(),
            arxiv_id: Some(arxiv_id.to_string()),
            doi: None,
            url: self.link.or_else(|| Some(self.id.trim().to_string())),
            title: collapse_whitespace(&self.title),
            authors: self.authors,
            abstract_text: collapse_whitespace(&self.summary),
            published: parse_timestamp(self.published.trim()),
            repo_url: None,
            categories: self.categories,
        })
    }
}

/// Which text field the parser is currently inside.
#[derive(PartialEq, Eq, Clone, Copy)]
enum Field {
    Id,
    Title,
    Summary,
    Published,
    AuthorName,
}

/// Decode an arXiv Atom listing into raw records.
fn parse_listing(xml: &str) -> ClientResult<Vec<RawRecord>> {
    let mut reader = Reader::from_str(xml);
    let mut records = Vec::new();

    let mut entry = EntryAccum::default();
    let mut in_entry = false;
    let mut in_author = false;
    let mut field: Option<Field> = None;
    let mut author_name = String::new();

    loop {
        let event =
            reader.read_event().map_err(|e| ClientError::Decode(e.to_string()))?;
        match event {
            Event::Start(ref e) => match e.name().as_ref() {
                b"entry" => {
                    in_entry = true;
                    entry = EntryAccum::default();
                }
                b"author" if in_entry => in_author = true,
                b"id" if in_entry && !in_author => field = Some(Field::Id),
                b"title" if in_entry => field = Some(Field::Title),
                b"summary" if in_entry => field = Some(Field::Summary),
                b"published" if in_entry => field = Some(Field::Published),
                b"name" if in_author => field = Some(Field::AuthorName),
                _ => {}
            },
            Event::Empty(ref e) if in_entry => match e.name().as_ref() {
                b"category" | b"arxiv:primary_category" => {
                    if let Some(term) = attr_value(e, b"term") {
                        if !entry.categories.contains(&term) {
                            entry.categories.push(term);
                        }
                    }
                }
                b"link" => {
                    let rel = attr_value(e, b"rel");
                    if rel.is_none() || rel.as_deref() == Some("alternate") {
                        entry.link = attr_value(e, b"href");
                    }
                }
                _ => {}
            },
            Event::Text(ref e) => {
                if let (true, Some(field)) = (in_entry, field) {
                    let text = e.unescape().map_err(|e| ClientError::Decode(e.to_string()))?;
                    match field {
                        Field::Id => entry.id.push_str(&text),
                        Field::Title => entry.title.push_str(&text),
                        Field::Summary => entry.summary.push_str(&text),
                        Field::Published => entry.published.push_str(&text),
                        Field::AuthorName => author_name.push_str(&text),
                    }
                }
            }
            Event::End(ref e) => {
                match e.name().as_ref() {
                    b"entry" => {
                        in_entry = false;
                        if let Some(record) = std::mem::take(&mut entry).into_record() {
                            records.push(record);
                        }
                    }
                    b"author" => {
                        in_author = false;
                        let name = collapse_whitespace(&author_name);
                        if !name.is_empty() {
                            entry.authors.push(name);
                        }
                        author_name.clear();
                    }
                    _ => {}
                }
                field = None;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(records)
}

fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .filter_map(Result::ok)
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| String::from_utf8(a.value.into_owned()).ok())
}

/// Collapse newlines and runs of whitespace into single spaces.
fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse an Atom timestamp, tolerating a missing timezone suffix.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|at| at.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(s.get(..19)?, "%Y-%m-%dT%H:%M:%S")
                .map(|naive| naive.and_utc())
                .ok()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <title>ArXiv Query</title>
  <entry>
    <id>http://arxiv.org/abs/2401.00001v2</id>
    <title>Foo:
      A Method</title>
    <summary>We present Foo. Code at https://github.com/foo/foo.</summary>
    <published>2026-08-25T12:00:00Z</published>
    <author><name>Ada Lovelace</name></author>
    <author><name>Charles Babbage</name></author>
    <link href="http://arxiv.org/abs/2401.00001v2" rel="alternate" type="text/html"/>
    <arxiv:primary_category term="cs.AI"/>
    <category term="cs.AI"/>
    <category term="cs.LG"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2401.00002v1</id>
    <title>Bar</title>
    <summary>Bar abstract.</summary>
    <published>2026-08-01T00:00:00Z</published>
    <author><name>Grace Hopper</name></author>
    <category term="cs.CL"/>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_listing() {
        let records = parse_listing(SAMPLE_FEED).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.arxiv_id.as_deref(), Some("2401.00001v2"));
        assert_eq!(first.title, "Foo: A Method");
        assert_eq!(first.authors, vec!["Ada Lovelace", "Charles Babbage"]);
        assert_eq!(first.categories, vec!["cs.AI", "cs.LG"]);
        assert_eq!(
            first.published,
            Some(Utc.with_ymd_and_hms(2026, 8, 25, 12, 0, 0).unwrap())
        );
        assert!(first.abstract_text.contains("github.com/foo/foo"));
    }

    #[test]
    fn test_parse_listing_skips_titleless_entries() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
            <entry><id>http://arxiv.org/abs/2401.00003v1</id><title>  </title></entry>
        </feed>"#;
        assert!(parse_listing(xml).unwrap().is_empty());
    }

    #[test]
    fn test_parse_timestamp_fallback() {
        assert!(parse_timestamp("2026-08-25T12:00:00Z").is_some());
        assert!(parse_timestamp("2026-08-25T12:00:00").is_some());
        assert!(parse_timestamp("not a date").is_none());
    }
}
