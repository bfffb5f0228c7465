//! Composite relevance scoring.
//!
//! Two passes: the first derives the batch-wide star range for min-max
//! normalization, the second computes
//! `score = w_c * ln(citations + 1) + w_s * normalized_stars + w_b * social_buzz`.
//! The log term compresses heavy-tailed citation distributions so a few
//! highly-cited outliers do not dominate the ranking. No randomness, no wall
//! clock: identical inputs score bit-for-bit identically.

use crate::config::Config;
use crate::models::{EnrichedPaper, ScoredPaper};

/// Score a batch of enriched papers.
#[must_use]
pub fn score(papers: Vec<EnrichedPaper>, config: &Config) -> Vec<ScoredPaper> {
    // Pass 1: batch-wide star range.
    let min_stars = papers.iter().map(|p| p.signals.repo_stars).min().unwrap_or(0);
    let max_stars = papers.iter().map(|p| p.signals.repo_stars).max().unwrap_or(0);
    let star_range = max_stars.saturating_sub(min_stars);

    // Pass 2: per-paper terms.
    papers
        .into_iter()
        .map(|EnrichedPaper { paper, signals }| {
            let citation_term = ((signals.citations + 1) as f64).ln();
            let normalized_stars = if star_range == 0 {
                // Degenerate batch (all equal): no signal, no divide-by-zero.
                0.0
            } else {
                (signals.repo_stars - min_stars) as f64 / star_range as f64
            };
            let social_buzz_term = signals.social_buzz as f64;

            let score = config.citation_weight * citation_term
                + config.stars_weight * normalized_stars
                + config.social_weight * social_buzz_term;

            ScoredPaper { paper, signals, score, citation_term, normalized_stars, social_buzz_term }
        })
        .collect()
}
