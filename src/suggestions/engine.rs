use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tracing::warn;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::scoring::scorer::score_pair;
use crate::scoring::FactorKind;
use crate::snapshot::store::MarketplaceStore;
use crate::snapshot::{
    LocationConstraint, OpportunitySnapshot, ProfileField, ProfileSnapshot, TravelAvailability,
};
use crate::suggestions::{ImprovementSuggestion, InsightReport, SuggestionCategory};

/// Suggestions beyond the top gaps dilute attention; the potential score
/// only counts this many.
const POTENTIAL_TOP_N: usize = 3;

const FALLBACK_PORTFOLIO_URL: &str = "https://portfolio.example/preview";
const FALLBACK_HEIGHT_CM: f64 = 172.0;

/// Builds the insight report for one profile against the current open
/// opportunity pool.
///
/// Small pools are re-scored directly with each gap hypothetically filled;
/// large pools fall back to aggregate missing-field counts queried from the
/// store under a per-query timeout. A failed or timed-out count drops that
/// one suggestion rather than the whole report.
pub async fn build_insights(
    store: &dyn MarketplaceStore,
    profile: &ProfileSnapshot,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Result<InsightReport, EngineError> {
    let gaps: Vec<ProfileField> = ProfileField::ALL
        .into_iter()
        .filter(|field| profile.is_missing(*field))
        .filter(|field| applies_to_profile(*field, profile))
        .collect();

    let mut suggestions = if gaps.is_empty() {
        Vec::new()
    } else {
        let opportunities = store.open_opportunities().await?;
        if opportunities.len() <= config.suggestions.rescore_population_limit {
            rescore_suggestions(profile, &opportunities, &gaps, config, now)
        } else {
            aggregate_suggestions(store, &gaps, opportunities.len() as u64, config).await
        }
    };

    suggestions.retain(|s| s.impact > 0.0);
    suggestions.sort_by(|a, b| b.impact.total_cmp(&a.impact));

    let current_score = (profile.completion_percentage as f64 * 0.8).round();
    let potential_score = (current_score
        + suggestions
            .iter()
            .take(POTENTIAL_TOP_N)
            .map(|s| s.impact)
            .sum::<f64>())
    .min(100.0);

    Ok(InsightReport {
        profile_id: profile.id.clone(),
        current_score,
        potential_score,
        suggestions,
    })
}

/// Physical attributes only matter for talent-facing profiles, and skill
/// suggestions only for profiles offering work.
fn applies_to_profile(field: ProfileField, profile: &ProfileSnapshot) -> bool {
    match field {
        ProfileField::PhysicalAttributes => profile.has_capability("talent"),
        ProfileField::Skills => profile.has_capability("contributor"),
        _ => true,
    }
}

/// Exact path: re-score the profile against every open opportunity with the
/// gap hypothetically filled, and average the deltas.
fn rescore_suggestions(
    profile: &ProfileSnapshot,
    opportunities: &[OpportunitySnapshot],
    gaps: &[ProfileField],
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Vec<ImprovementSuggestion> {
    let total = opportunities.len() as f64;
    gaps.iter()
        .map(|&field| {
            let mut delta_sum = 0.0;
            let mut affected = 0u64;
            for opportunity in opportunities {
                let base = score_pair(profile, opportunity, config, now).overall;
                let filled = fill_gap(profile, field, opportunity);
                let improved = score_pair(&filled, opportunity, config, now).overall;
                let delta = improved - base;
                if delta > 0.0 {
                    affected += 1;
                    delta_sum += delta;
                }
            }
            let impact = if total > 0.0 { delta_sum / total } else { 0.0 };
            suggestion(field, impact, affected)
        })
        .collect()
}

/// Aggregate path: per-field missing counts from the store, queried
/// concurrently with a timeout each. Impact is approximated from the
/// factor's weight and the share of opportunities affected.
async fn aggregate_suggestions(
    store: &dyn MarketplaceStore,
    gaps: &[ProfileField],
    total_open: u64,
    config: &EngineConfig,
) -> Vec<ImprovementSuggestion> {
    let timeout = Duration::from_millis(config.suggestions.query_timeout_ms);
    let counts: Vec<(ProfileField, Result<u64, EngineError>)> = stream::iter(gaps.to_vec())
        .map(|field| async move {
            let result = match tokio::time::timeout(timeout, store.count_open_missing_field(field))
                .await
            {
                Ok(inner) => inner,
                Err(_) => Err(EngineError::DependencyTimeout(timeout)),
            };
            (field, result)
        })
        .buffer_unordered(config.suggestions.max_concurrent_queries)
        .collect()
        .await;

    counts
        .into_iter()
        .filter_map(|(field, result)| match result {
            Ok(affected) => {
                let weight = config.weights.weight_for(factor_for(field));
                let share = if total_open > 0 {
                    affected as f64 / total_open as f64
                } else {
                    0.0
                };
                Some(suggestion(field, weight * 100.0 * share, affected))
            }
            Err(err) => {
                warn!(field = %field, error = %err, "missing-field count failed, skipping suggestion");
                None
            }
        })
        .collect()
}

fn factor_for(field: ProfileField) -> FactorKind {
    match field {
        ProfileField::Location => FactorKind::Location,
        ProfileField::PortfolioUrl => FactorKind::Portfolio,
        ProfileField::TravelAvailability => FactorKind::Availability,
        ProfileField::PhysicalAttributes => FactorKind::Physical,
        ProfileField::Skills => FactorKind::Skills,
    }
}

fn suggestion(field: ProfileField, impact: f64, affected: u64) -> ImprovementSuggestion {
    ImprovementSuggestion {
        field,
        category: SuggestionCategory::for_field(field),
        action: action_for(field).to_string(),
        impact,
        affected_opportunities: affected,
        message: message_for(field, affected),
    }
}

fn action_for(field: ProfileField) -> &'static str {
    match field {
        ProfileField::Location => "add_location",
        ProfileField::PortfolioUrl => "add_portfolio",
        ProfileField::TravelAvailability => "set_travel_availability",
        ProfileField::PhysicalAttributes => "add_physical_attributes",
        ProfileField::Skills => "add_skills",
    }
}

fn message_for(field: ProfileField, affected: u64) -> String {
    match field {
        ProfileField::Location => {
            format!("Add your location to be considered for {affected} on-site opportunities")
        }
        ProfileField::PortfolioUrl => {
            format!("Link a portfolio to strengthen applications for {affected} opportunities")
        }
        ProfileField::TravelAvailability => {
            format!("Set your travel availability to qualify for {affected} on-site opportunities")
        }
        ProfileField::PhysicalAttributes => {
            format!("Complete your measurements to match {affected} casting requirements")
        }
        ProfileField::Skills => {
            format!("List your skills to improve matching across {affected} opportunities")
        }
    }
}

/// Best-case hypothetical fill of one gap, relative to the opportunity being
/// scored against.
fn fill_gap(
    profile: &ProfileSnapshot,
    field: ProfileField,
    opportunity: &OpportunitySnapshot,
) -> ProfileSnapshot {
    let mut filled = profile.clone();
    match field {
        ProfileField::Location => {
            if let Some(LocationConstraint::OnSite(location)) = &opportunity.location {
                filled.location = Some(location.clone());
            }
        }
        ProfileField::PortfolioUrl => {
            filled.portfolio_url = Some(FALLBACK_PORTFOLIO_URL.to_string());
        }
        ProfileField::TravelAvailability => {
            filled.travel = TravelAvailability::Available;
        }
        ProfileField::PhysicalAttributes => {
            if let Some(pref) = &opportunity.physical_preference {
                filled.physical.height_cm = pref
                    .height_range
                    .as_ref()
                    .and_then(|r| r.midpoint())
                    .or(Some(FALLBACK_HEIGHT_CM));
                filled.physical.body_type = pref.body_types.first().cloned();
            }
        }
        ProfileField::Skills => {
            filled
                .skills
                .extend(opportunity.required_skills.iter().cloned());
        }
    }
    filled
}
