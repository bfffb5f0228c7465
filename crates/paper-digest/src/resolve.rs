//! Identity resolution: fingerprint derivation and cross-source merging.
//!
//! Records are grouped by a deterministic fingerprint, never compared
//! pairwise, so merging is a single hash-grouping pass and the output order
//! is reproducible for a fixed adapter output order.

use std::collections::HashMap;

use crate::models::{Fingerprint, MergedPaper, RawRecord};

/// Derive the identity fingerprint for a record.
///
/// Priority: DOI, then arXiv id (version suffix stripped), then normalized
/// title plus first-author surname. The title fallback is a heuristic; two
/// distinct papers with identical normalized titles and first-author surname
/// will merge.
#[must_use]
pub fn fingerprint(record: &RawRecord) -> Fingerprint {
    if let Some(doi) = non_blank(record.doi.as_deref()) {
        return Fingerprint(format!("doi:{}", doi.trim().to_lowercase()));
    }

    if let Some(arxiv_id) = non_blank(record.arxiv_id.as_deref()) {
        return Fingerprint(format!("arxiv:{}", strip_arxiv_version(arxiv_id.trim())));
    }

    let title = normalize_text(&record.title);
    let surname = record
        .authors
        .first()
        .map(|a| normalize_surname(a))
        .unwrap_or_default();
    Fingerprint(format!("title:{title}:{surname}"))
}

/// Merge raw records from all sources into canonical papers.
///
/// Groups are emitted in the order their first contributing record appeared
/// in the concatenated adapter output; records within a group keep insertion
/// order for the canonicalization fold.
#[must_use]
pub fn merge(records: Vec<RawRecord>) -> Vec<MergedPaper> {
    let mut order: Vec<Fingerprint> = Vec::new();
    let mut groups: HashMap<Fingerprint, Vec<RawRecord>> = HashMap::new();

    for record in records {
        let key = fingerprint(&record);
        let group = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            Vec::new()
        });
        group.push(record);
    }

    order
        .into_iter()
        .map(|key| {
            let group = groups.remove(&key).unwrap_or_default();
            fold_group(key, group)
        })
        .collect()
}

/// Fold one fingerprint group into a canonical paper.
fn fold_group(key: Fingerprint, group: Vec<RawRecord>) -> MergedPaper {
    debug_assert!(!group.is_empty(), "fingerprint group cannot be empty");

    // Longest non-empty title wins; earlier records win length ties.
    let canonical = group
        .iter()
        .enumerate()
        .filter(|(_, r)| !r.title.trim().is_empty())
        .max_by_key(|(idx, r)| (r.title.trim().len(), std::cmp::Reverse(*idx)))
        .map(|(idx, _)| idx)
        .unwrap_or(0);

    let title = {
        let trimmed = group[canonical].title.trim();
        if trimmed.is_empty() { "Untitled".to_string() } else { trimmed.to_string() }
    };
    // Prefer the canonical record's author list, then any non-empty one.
    let authors = if group[canonical].authors.is_empty() {
        group.iter().map(|r| &r.authors).find(|a| !a.is_empty()).cloned().unwrap_or_default()
    } else {
        group[canonical].authors.clone()
    };

    let published = group.iter().filter_map(|r| r.published).min();
    let doi = first_value(&group, |r| r.doi.as_deref());
    let arxiv_id =
        first_value(&group, |r| r.arxiv_id.as_deref()).map(|id| strip_arxiv_version(&id));
    let url = first_value(&group, |r| r.url.as_deref());
    let repo_url = first_value(&group, |r| r.repo_url.as_deref());

    let abstract_text = group
        .iter()
        .map(|r| r.abstract_text.trim())
        .max_by_key(|s| s.len())
        .unwrap_or_default()
        .to_string();

    let mut categories: Vec<String> = Vec::new();
    let mut sources: Vec<String> = Vec::new();
    for record in &group {
        for category in &record.categories {
            if !categories.contains(category) {
                categories.push(category.clone());
            }
        }
        if !sources.contains(&record.source) {
            sources.push(record.source.clone());
        }
    }

    MergedPaper {
        fingerprint: key,
        title,
        published,
        arxiv_id,
        doi,
        url,
        repo_url,
        authors,
        abstract_text,
        categories,
        sources,
    }
}

/// First non-blank value of `field` across the group, insertion order.
fn first_value<'g>(
    group: &'g [RawRecord],
    field: impl Fn(&'g RawRecord) -> Option<&'g str>,
) -> Option<String> {
    group
        .iter()
        .find_map(|r| non_blank(field(r)))
        .map(|s| s.trim().to_string())
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

/// Strip a trailing "vN" version suffix from an arXiv id.
fn strip_arxiv_version(id: &str) -> String {
    if let Some(idx) = id.rfind('v') {
        let suffix = &id[idx + 1..];
        if !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) {
            return id[..idx].to_lowercase();
        }
    }
    id.to_lowercase()
}

/// Lowercase, strip punctuation, collapse whitespace.
#[must_use]
pub fn normalize_text(s: &str) -> String {
    let cleaned: String = s
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized surname: last whitespace token of the author name.
fn normalize_surname(author: &str) -> String {
    normalize_text(author).rsplit(' ').next().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(source: &str, title: &str) -> RawRecord {
        RawRecord { source: source.to_string(), title: title.to_string(), ..RawRecord::default() }
    }

    #[test]
    fn test_fingerprint_priority_doi_over_arxiv() {
        let mut r = record("arxiv", "A Paper");
        r.doi = Some("10.1/XYZ".to_string());
        r.arxiv_id = Some("2401.00001v2".to_string());
        assert_eq!(fingerprint(&r).0, "doi:10.1/xyz");

        r.doi = None;
        assert_eq!(fingerprint(&r).0, "arxiv:2401.00001");
    }

    #[test]
    fn test_fingerprint_strips_arxiv_version() {
        let mut a = record("arxiv", "A");
        a.arxiv_id = Some("2401.00001v1".to_string());
        let mut b = record("trending", "A (different title)");
        b.arxiv_id = Some("2401.00001v3".to_string());
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_fingerprint_title_fallback_is_insensitive() {
        let mut a = record("arxiv", "Foo: A Method!");
        a.authors = vec!["Ada Lovelace".to_string()];
        let mut b = record("trending", "foo   a METHOD");
        b.authors = vec!["A. Lovelace".to_string()];
        assert_eq!(fingerprint(&a), fingerprint(&b));
        assert_eq!(fingerprint(&a).0, "title:foo a method:lovelace");
    }

    #[test]
    fn test_merge_same_arxiv_id_different_titles() {
        let mut a = record("arxiv", "Foo: A Method");
        a.arxiv_id = Some("2401.00001v1".to_string());
        let mut b = record("trending", "Foo: a method");
        b.arxiv_id = Some("2401.00001".to_string());
        b.repo_url = Some("https://github.com/foo/foo".to_string());

        let merged = merge(vec![a, b]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].arxiv_id.as_deref(), Some("2401.00001"));
        assert_eq!(merged[0].repo_url.as_deref(), Some("https://github.com/foo/foo"));
        assert_eq!(merged[0].sources, vec!["arxiv", "trending"]);
    }

    #[test]
    fn test_merge_distinct_fingerprints_stay_split() {
        let mut a = record("arxiv", "Alpha");
        a.arxiv_id = Some("2401.00001".to_string());
        let mut b = record("arxiv", "Beta");
        b.arxiv_id = Some("2401.00002".to_string());
        let mut c = record("arxiv", "Gamma");
        c.doi = Some("10.1/abc".to_string());

        assert_eq!(merge(vec![a, b, c]).len(), 3);
    }

    #[test]
    fn test_merge_preserves_first_seen_order() {
        let mut a = record("arxiv", "First");
        a.arxiv_id = Some("1".to_string());
        let mut b = record("arxiv", "Second");
        b.arxiv_id = Some("2".to_string());
        let mut a2 = record("trending", "First again");
        a2.arxiv_id = Some("1".to_string());

        let merged = merge(vec![a, b, a2]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].arxiv_id.as_deref(), Some("1"));
        assert_eq!(merged[1].arxiv_id.as_deref(), Some("2"));
    }

    #[test]
    fn test_canonical_title_and_date() {
        let early = Utc.with_ymd_and_hms(2026, 8, 20, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2026, 8, 24, 0, 0, 0).unwrap();

        let mut a = record("arxiv", "Foo");
        a.arxiv_id = Some("1".to_string());
        a.published = Some(late);
        let mut b = record("trending", "Foo: A Longer Canonical Title");
        b.arxiv_id = Some("1".to_string());
        b.published = Some(early);

        let merged = merge(vec![a, b]);
        assert_eq!(merged[0].title, "Foo: A Longer Canonical Title");
        assert_eq!(merged[0].published, Some(early));
    }

    #[test]
    fn test_merged_title_never_empty() {
        let mut a = record("arxiv", "   ");
        a.arxiv_id = Some("2401.00009".to_string());
        let merged = merge(vec![a]);
        assert_eq!(merged[0].title, "Untitled");
    }
}
