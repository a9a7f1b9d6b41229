use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::scoring::CompatibilityScore;

/// One entry in a ranked match list: the score plus the display metadata the
/// renderers need.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedMatch {
    pub score: CompatibilityScore,
    pub deadline: Option<DateTime<Utc>>,
    pub closing_soon: bool,
    pub reasons: Vec<String>,
}

/// Orders scored pairs best-first and applies the limit and score floor.
///
/// Ties on overall score break toward the nearer deadline; entries with no
/// deadline sort after dated ones. Equal scores with equal deadlines keep
/// their input order.
pub fn rank_matches(
    scored: Vec<(CompatibilityScore, Option<DateTime<Utc>>)>,
    limit: usize,
    min_score: f64,
    now: DateTime<Utc>,
    closing_window_days: i64,
) -> Vec<RankedMatch> {
    let mut entries: Vec<(CompatibilityScore, Option<DateTime<Utc>>)> = scored
        .into_iter()
        .filter(|(score, _)| score.overall >= min_score)
        .collect();
    entries.sort_by(|(a, a_deadline), (b, b_deadline)| {
        b.overall
            .total_cmp(&a.overall)
            .then_with(|| match (a_deadline, b_deadline) {
                (Some(a), Some(b)) => a.cmp(b),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            })
    });
    entries.truncate(limit);
    entries
        .into_iter()
        .map(|(score, deadline)| RankedMatch {
            closing_soon: is_closing_soon(deadline, now, closing_window_days),
            reasons: score.match_reasons(),
            score,
            deadline,
        })
        .collect()
}

/// An opportunity is closing soon when its deadline falls inside the window
/// and has not already passed.
pub fn is_closing_soon(
    deadline: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    window_days: i64,
) -> bool {
    match deadline {
        Some(deadline) => deadline >= now && deadline <= now + Duration::days(window_days),
        None => false,
    }
}
