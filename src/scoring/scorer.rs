use chrono::{DateTime, Utc};

use crate::config::EngineConfig;
use crate::scoring::factors::evaluate_all;
use crate::scoring::CompatibilityScore;
use crate::snapshot::{OpportunitySnapshot, ProfileSnapshot};

/// Scores one profile/opportunity pair. Pure: no I/O, no randomness, no
/// clock; identical inputs always produce identical output.
///
/// Weights are renormalized over the applicable factors only. With zero
/// applicable factors the overall score is 0: compatibility cannot be
/// asserted from no evidence.
pub fn score_pair(
    profile: &ProfileSnapshot,
    opportunity: &OpportunitySnapshot,
    config: &EngineConfig,
    computed_at: DateTime<Utc>,
) -> CompatibilityScore {
    let factors = evaluate_all(profile, opportunity, &config.scoring);

    let applicable_weight: f64 = factors
        .iter()
        .filter(|f| f.applicable)
        .map(|f| config.weights.weight_for(f.factor))
        .sum();

    let overall = if applicable_weight > 0.0 {
        let weighted: f64 = factors
            .iter()
            .filter(|f| f.applicable)
            .map(|f| f.score * config.weights.weight_for(f.factor) / applicable_weight)
            .sum();
        weighted.clamp(0.0, 100.0)
    } else {
        0.0
    };

    CompatibilityScore {
        profile_id: profile.id.clone(),
        opportunity_id: opportunity.id.clone(),
        overall,
        factors,
        computed_at,
    }
}
