//! Paper records at each pipeline stage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One paper as reported by a single source, before any merging.
///
/// Immutable once fetched; owned by its source adapter until merge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRecord {
    /// Name of the source adapter that produced this record.
    pub source: String,

    /// arXiv identifier, possibly with a version suffix (e.g. "2401.00001v2").
    #[serde(default)]
    pub arxiv_id: Option<String>,

    /// Digital Object Identifier.
    #[serde(default)]
    pub doi: Option<String>,

    /// Landing page URL.
    #[serde(default)]
    pub url: Option<String>,

    /// Paper title as reported by the source.
    pub title: String,

    /// Author names in source order.
    #[serde(default)]
    pub authors: Vec<String>,

    /// Paper abstract.
    #[serde(default)]
    pub abstract_text: String,

    /// Publication or submission date.
    #[serde(default)]
    pub published: Option<DateTime<Utc>>,

    /// Code repository URL, if the source reports one.
    #[serde(default)]
    pub repo_url: Option<String>,

    /// Source-specific subject categories.
    #[serde(default)]
    pub categories: Vec<String>,
}

/// A normalized identity key for one logical paper.
///
/// Two records with equal fingerprints describe the same paper. Derivation
/// lives in [`crate::resolve`]; equality here is plain string equality, so
/// grouping is a hash lookup, never a pairwise comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(pub String);

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The canonical, deduplicated representation of one paper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedPaper {
    /// Identity fingerprint this paper was grouped under.
    pub fingerprint: Fingerprint,

    /// Canonical title (longest non-empty title among contributors).
    pub title: String,

    /// Canonical date (earliest non-null among contributors).
    #[serde(default)]
    pub published: Option<DateTime<Utc>>,

    /// arXiv id with version suffix stripped, if any contributor had one.
    #[serde(default)]
    pub arxiv_id: Option<String>,

    /// DOI, if any contributor had one.
    #[serde(default)]
    pub doi: Option<String>,

    /// Landing page URL.
    #[serde(default)]
    pub url: Option<String>,

    /// Code repository URL.
    #[serde(default)]
    pub repo_url: Option<String>,

    /// Author names from the contributor that supplied the canonical title.
    #[serde(default)]
    pub authors: Vec<String>,

    /// Longest abstract among contributors.
    #[serde(default)]
    pub abstract_text: String,

    /// Union of subject categories, first-seen order, deduplicated.
    #[serde(default)]
    pub categories: Vec<String>,

    /// Names of the sources that contributed records, for audit.
    pub sources: Vec<String>,
}

impl MergedPaper {
    /// Get the first author's name if available.
    #[must_use]
    pub fn first_author(&self) -> Option<&str> {
        self.authors.first().map(String::as_str)
    }
}

/// Secondary metrics attached to a merged paper.
///
/// Every field is always present: a failed or skipped lookup leaves the
/// default zero in place, so scoring never branches on missing data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalSet {
    /// Citation count from the citation graph provider.
    #[serde(default)]
    pub citations: u64,

    /// Star count of the associated code repository.
    #[serde(default)]
    pub repo_stars: u64,

    /// Reserved social-signal slot; always 0 for now.
    #[serde(default)]
    pub social_buzz: u64,
}

/// A merged paper with its signals attached, ready for scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedPaper {
    /// The merged paper.
    pub paper: MergedPaper,

    /// Signals gathered by the enrichment broker.
    pub signals: SignalSet,
}

/// A paper with its composite score and the component terms that produced it.
///
/// Immutable after creation; exists only to be sorted and handed downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredPaper {
    /// The merged paper.
    pub paper: MergedPaper,

    /// Signals the score was computed from.
    pub signals: SignalSet,

    /// Composite relevance score.
    pub score: f64,

    /// `ln(citations + 1)` component, pre-weight.
    pub citation_term: f64,

    /// Min-max normalized star count in [0, 1], pre-weight.
    pub normalized_stars: f64,

    /// Reserved social term, pre-weight; always 0 for now.
    pub social_buzz_term: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_record_default() {
        let record = RawRecord { source: "arxiv".to_string(), ..RawRecord::default() };
        assert!(record.arxiv_id.is_none());
        assert!(record.title.is_empty());
        assert!(record.authors.is_empty());
    }

    #[test]
    fn test_signal_set_defaults_to_zero() {
        let signals = SignalSet::default();
        assert_eq!(signals.citations, 0);
        assert_eq!(signals.repo_stars, 0);
        assert_eq!(signals.social_buzz, 0);
    }

    #[test]
    fn test_fingerprint_display_and_eq() {
        let a = Fingerprint("doi:10.1/xyz".to_string());
        let b = Fingerprint("doi:10.1/xyz".to_string());
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "doi:10.1/xyz");
    }

    #[test]
    fn test_scored_paper_serializes() {
        let paper = MergedPaper {
            fingerprint: Fingerprint("arxiv:2401.00001".to_string()),
            title: "Foo: A Method".to_string(),
            published: None,
            arxiv_id: Some("2401.00001".to_string()),
            doi: None,
            url: None,
            repo_url: None,
            authors: vec!["Ada Lovelace".to_string()],
            abstract_text: String::new(),
            categories: vec!["cs.AI".to_string()],
            sources: vec!["arxiv".to_string()],
        };
        let scored = ScoredPaper {
            paper,
            signals: SignalSet { citations: 100, ..SignalSet::default() },
            score: 2.31,
            citation_term: 101f64.ln(),
            normalized_stars: 0.0,
            social_buzz_term: 0.0,
        };

        let json = serde_json::to_value(&scored).unwrap();
        assert_eq!(json["signals"]["citations"], 100);
        assert_eq!(json["paper"]["title"], "Foo: A Method");
    }
}
