use std::collections::BTreeMap;

use crate::analytics::{
    AnalyticsSnapshot, InteractionKind, OutcomeRecord, TimeWindow, TopFactor, TrendPoint,
};
use crate::scoring::FactorKind;

const TOP_FACTOR_LIMIT: usize = 5;

/// Folds a profile's historical outcome records into an analytics snapshot.
/// Pure over its inputs; window filtering is the store's job.
pub fn aggregate(
    profile_id: &str,
    window: TimeWindow,
    records: &[OutcomeRecord],
    good_match_threshold: f64,
) -> AnalyticsSnapshot {
    if records.is_empty() {
        return AnalyticsSnapshot::empty(profile_id, window);
    }

    let total_interactions = records.len() as u64;
    let applications_sent = records
        .iter()
        .filter(|r| r.interaction == InteractionKind::ApplicationSent)
        .count() as u64;
    let successful_matches = records
        .iter()
        .filter(|r| r.interaction == InteractionKind::MatchSucceeded)
        .count() as u64;

    let scored: Vec<f64> = records.iter().filter_map(|r| r.compatibility).collect();
    let avg_compatibility = if scored.is_empty() {
        0.0
    } else {
        scored.iter().sum::<f64>() / scored.len() as f64
    };

    AnalyticsSnapshot {
        profile_id: profile_id.to_string(),
        window,
        avg_compatibility,
        total_interactions,
        applications_sent,
        successful_matches,
        engagement_score: engagement_score(total_interactions, successful_matches),
        trends: daily_trends(records),
        top_factors: top_factors(records, good_match_threshold),
    }
}

/// Bounded blend of interaction volume and successful matches, never above
/// 100: volume contributes up to 60 points, matches up to 40.
pub fn engagement_score(total_interactions: u64, successful_matches: u64) -> f64 {
    let volume = (total_interactions as f64 * 2.0).min(60.0);
    let matches = (successful_matches as f64 * 10.0).min(40.0);
    volume + matches
}

fn daily_trends(records: &[OutcomeRecord]) -> Vec<TrendPoint> {
    let mut buckets: BTreeMap<chrono::NaiveDate, (f64, u64)> = BTreeMap::new();
    for record in records {
        let Some(compatibility) = record.compatibility else {
            continue;
        };
        let entry = buckets
            .entry(record.occurred_at.date_naive())
            .or_insert((0.0, 0));
        entry.0 += compatibility;
        entry.1 += 1;
    }
    buckets
        .into_iter()
        .map(|(date, (sum, count))| TrendPoint {
            date,
            avg_compatibility: sum / count as f64,
            total_calculations: count,
        })
        .collect()
}

/// Which factors most often drove matches at or above the good-match
/// threshold. Percentages are shares of all counted factor mentions.
fn top_factors(records: &[OutcomeRecord], good_match_threshold: f64) -> Vec<TopFactor> {
    let mut counts: BTreeMap<FactorKind, u64> = BTreeMap::new();
    for record in records {
        let good = record
            .compatibility
            .map(|c| c >= good_match_threshold)
            .unwrap_or(false);
        if !good {
            continue;
        }
        for factor in &record.matched_factors {
            *counts.entry(*factor).or_insert(0) += 1;
        }
    }
    let total: u64 = counts.values().sum();
    if total == 0 {
        return Vec::new();
    }
    let mut factors: Vec<TopFactor> = counts
        .into_iter()
        .map(|(factor, count)| TopFactor {
            factor,
            count,
            percentage: 100.0 * count as f64 / total as f64,
        })
        .collect();
    factors.sort_by(|a, b| b.count.cmp(&a.count).then(a.factor.cmp(&b.factor)));
    factors.truncate(TOP_FACTOR_LIMIT);
    factors
}
