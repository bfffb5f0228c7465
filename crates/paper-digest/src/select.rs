//! Final selection: total-order sort and top-K truncation.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::models::ScoredPaper;

/// Sort descending by score and keep the top `k`.
///
/// Ties break deterministically: higher raw citation count, then more recent
/// publication date (undated papers sort last), then lexicographically
/// smaller canonical title. The comparator is a strict total order, so the
/// result is independent of input arrival order. `k = 0` yields an empty
/// result.
#[must_use]
pub fn select(mut papers: Vec<ScoredPaper>, k: usize) -> Vec<ScoredPaper> {
    papers.sort_by(rank_order);
    papers.truncate(k);
    papers
}

/// Strict total order over scored papers, best first.
fn rank_order(a: &ScoredPaper, b: &ScoredPaper) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.signals.citations.cmp(&a.signals.citations))
        .then_with(|| cmp_dates_recent_first(a.paper.published, b.paper.published))
        .then_with(|| a.paper.title.cmp(&b.paper.title))
}

fn cmp_dates_recent_first(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
