use crate::config::ScoringConfig;
use crate::scoring::{FactorKind, FactorResult};
use crate::snapshot::{
    LocationConstraint, OpportunitySnapshot, ProfileSnapshot, TravelAvailability,
};

/// Runs every evaluator against the pair. Each evaluator is total: missing
/// data degrades the factor to inapplicable, never to an error.
pub fn evaluate_all(
    profile: &ProfileSnapshot,
    opportunity: &OpportunitySnapshot,
    scoring: &ScoringConfig,
) -> Vec<FactorResult> {
    vec![
        skill_match(profile, opportunity),
        location_match(profile, opportunity),
        experience_match(profile, scoring.experience_ceiling_years),
        availability_match(profile, opportunity),
        physical_match(profile, opportunity),
        portfolio_match(profile, opportunity),
    ]
}

/// An opportunity with no required skills is unconstrained: perfect match.
pub fn skill_match(profile: &ProfileSnapshot, opportunity: &OpportunitySnapshot) -> FactorResult {
    if opportunity.required_skills.is_empty() {
        return FactorResult::applicable(FactorKind::Skills, 100.0);
    }
    let matched: Vec<String> = opportunity
        .required_skills
        .intersection(&profile.skills)
        .cloned()
        .collect();
    let missing: Vec<String> = opportunity
        .required_skills
        .difference(&profile.skills)
        .cloned()
        .collect();
    let score = 100.0 * matched.len() as f64 / opportunity.required_skills.len() as f64;
    FactorResult::applicable(FactorKind::Skills, score)
        .with_matched(matched)
        .with_missing(missing)
}

pub fn location_match(
    profile: &ProfileSnapshot,
    opportunity: &OpportunitySnapshot,
) -> FactorResult {
    let constraint = match &opportunity.location {
        Some(constraint) => constraint,
        None => return FactorResult::inapplicable(FactorKind::Location),
    };
    // A remote opportunity matches from anywhere, profile location or not.
    let site = match constraint {
        LocationConstraint::Remote => {
            return FactorResult::applicable(FactorKind::Location, 100.0)
                .with_matched(["remote".to_string()]);
        }
        LocationConstraint::OnSite(site) => site,
    };
    let here = match &profile.location {
        Some(here) => here,
        None => return FactorResult::inapplicable(FactorKind::Location),
    };
    if here.same_city(site) {
        FactorResult::applicable(FactorKind::Location, 100.0)
            .with_matched([format!("same city: {}", site.city)])
    } else if here.same_country(site) {
        FactorResult::applicable(FactorKind::Location, 60.0)
            .with_matched([format!("same country: {}", site.country)])
    } else {
        FactorResult::applicable(FactorKind::Location, 20.0)
            .with_missing([format!("based in {}", site)])
    }
}

/// Saturating ramp: linear up to the ceiling, flat at 100 beyond it.
/// Seniority past the ceiling is never penalized.
pub fn experience_match(profile: &ProfileSnapshot, ceiling_years: f64) -> FactorResult {
    let years = match profile.years_experience {
        Some(years) => f64::from(years),
        None => return FactorResult::inapplicable(FactorKind::Experience),
    };
    let ceiling = ceiling_years.max(1.0);
    let score = (years / ceiling).min(1.0) * 100.0;
    FactorResult::applicable(FactorKind::Experience, score)
        .with_matched([format!("{years:.0} years experience")])
}

pub fn availability_match(
    profile: &ProfileSnapshot,
    opportunity: &OpportunitySnapshot,
) -> FactorResult {
    let needs_travel = match &opportunity.location {
        None | Some(LocationConstraint::Remote) => false,
        Some(LocationConstraint::OnSite(site)) => match &profile.location {
            Some(here) => !here.same_city(site),
            // Unknown origin, location-bound work: assume travel is required.
            None => true,
        },
    };
    if !needs_travel {
        return FactorResult::applicable(FactorKind::Availability, 100.0)
            .with_matched(["no travel required".to_string()]);
    }
    match profile.travel {
        TravelAvailability::Available => {
            FactorResult::applicable(FactorKind::Availability, 100.0)
                .with_matched(["available for travel".to_string()])
        }
        TravelAvailability::Unavailable => {
            FactorResult::applicable(FactorKind::Availability, 0.0)
                .with_missing(["travel required".to_string()])
        }
        TravelAvailability::Unknown => FactorResult::inapplicable(FactorKind::Availability),
    }
}

/// Applicable only when the opportunity declares a preference AND the profile
/// declares the corresponding attribute. Absence on either side is neutral.
pub fn physical_match(
    profile: &ProfileSnapshot,
    opportunity: &OpportunitySnapshot,
) -> FactorResult {
    let pref = match &opportunity.physical_preference {
        Some(pref) if !pref.is_empty() => pref,
        _ => return FactorResult::inapplicable(FactorKind::Physical),
    };

    let mut considered = 0u32;
    let mut passed = 0u32;
    let mut matched = Vec::new();
    let mut missing = Vec::new();

    if let (Some(range), Some(height)) = (&pref.height_range, profile.physical.height_cm) {
        considered += 1;
        if range.contains(height) {
            passed += 1;
            matched.push(format!("height {height:.0}cm"));
        } else {
            missing.push(format!("height {height:.0}cm outside preferred range"));
        }
    }
    if let (false, Some(body_type)) = (
        pref.body_types.is_empty(),
        profile.physical.body_type.as_deref(),
    ) {
        considered += 1;
        if pref
            .body_types
            .iter()
            .any(|b| b.eq_ignore_ascii_case(body_type))
        {
            passed += 1;
            matched.push(format!("body type {body_type}"));
        } else {
            missing.push(format!("body type {body_type} not preferred"));
        }
    }

    if considered == 0 {
        return FactorResult::inapplicable(FactorKind::Physical);
    }
    let score = 100.0 * f64::from(passed) / f64::from(considered);
    FactorResult::applicable(FactorKind::Physical, score)
        .with_matched(matched)
        .with_missing(missing)
}

pub fn portfolio_match(
    profile: &ProfileSnapshot,
    opportunity: &OpportunitySnapshot,
) -> FactorResult {
    if !opportunity.portfolio_required {
        return FactorResult::inapplicable(FactorKind::Portfolio);
    }
    if profile.portfolio_url.is_some() {
        FactorResult::applicable(FactorKind::Portfolio, 100.0)
            .with_matched(["portfolio linked".to_string()])
    } else {
        FactorResult::applicable(FactorKind::Portfolio, 0.0)
            .with_missing(["portfolio required".to_string()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{
        HeightRange, Location, OpportunityKind, PhysicalPreference,
    };

    fn profile() -> ProfileSnapshot {
        let mut profile = ProfileSnapshot::new("p1");
        profile.skills.insert("photography".to_string());
        profile.skills.insert("lighting".to_string());
        profile
    }

    fn opportunity() -> OpportunitySnapshot {
        OpportunitySnapshot::new("o1", OpportunityKind::GigRole)
    }

    #[test]
    fn empty_required_skills_is_perfect_match() {
        let result = skill_match(&profile(), &opportunity());
        assert!(result.applicable);
        assert_eq!(result.score, 100.0);
    }

    #[test]
    fn skill_score_is_intersection_ratio() {
        let mut opp = opportunity();
        for skill in ["photography", "lighting", "editing"] {
            opp.required_skills.insert(skill.to_string());
        }
        let result = skill_match(&profile(), &opp);
        assert!(result.applicable);
        assert!((result.score - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(result.matched.len(), 2);
        assert!(result.missing.contains("editing"));
    }

    #[test]
    fn skill_score_monotonic_in_profile_skills() {
        let mut opp = opportunity();
        for skill in ["photography", "lighting", "editing"] {
            opp.required_skills.insert(skill.to_string());
        }
        let base = skill_match(&profile(), &opp).score;

        let mut grown = profile();
        grown.skills.insert("editing".to_string());
        assert!(skill_match(&grown, &opp).score >= base);

        // Removing a required skill never lowers the score either.
        opp.required_skills.remove("editing");
        assert!(skill_match(&profile(), &opp).score >= base);
    }

    #[test]
    fn no_declared_skills_scores_zero_but_never_fails() {
        let mut opp = opportunity();
        opp.required_skills.insert("editing".to_string());
        let empty = ProfileSnapshot::new("p2");
        let result = skill_match(&empty, &opp);
        assert!(result.applicable);
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn location_inapplicable_without_data() {
        assert!(!location_match(&profile(), &opportunity()).applicable);

        let mut opp = opportunity();
        opp.location = Some(LocationConstraint::OnSite(Location::new("Berlin", "Germany")));
        // Profile has no location either.
        assert!(!location_match(&profile(), &opp).applicable);
    }

    #[test]
    fn remote_constraint_matches_from_anywhere() {
        let mut opp = opportunity();
        opp.location = Some(LocationConstraint::Remote);
        let result = location_match(&profile(), &opp);
        assert!(result.applicable);
        assert_eq!(result.score, 100.0);
    }

    #[test]
    fn location_tiers() {
        let mut opp = opportunity();
        opp.location = Some(LocationConstraint::OnSite(Location::new("Berlin", "Germany")));

        let mut here = profile();
        here.location = Some(Location::new("berlin", "germany"));
        assert_eq!(location_match(&here, &opp).score, 100.0);

        here.location = Some(Location::new("Munich", "Germany"));
        assert_eq!(location_match(&here, &opp).score, 60.0);

        here.location = Some(Location::new("Lisbon", "Portugal"));
        assert_eq!(location_match(&here, &opp).score, 20.0);
    }

    #[test]
    fn experience_ramp_saturates() {
        let mut p = profile();
        p.years_experience = Some(5);
        assert_eq!(experience_match(&p, 10.0).score, 50.0);

        p.years_experience = Some(25);
        assert_eq!(experience_match(&p, 10.0).score, 100.0);

        p.years_experience = None;
        assert!(!experience_match(&p, 10.0).applicable);
    }

    #[test]
    fn availability_resolution() {
        let mut opp = opportunity();
        opp.location = Some(LocationConstraint::OnSite(Location::new("Berlin", "Germany")));

        let mut p = profile();
        p.location = Some(Location::new("Lisbon", "Portugal"));

        // Unknown travel preference with travel required: inapplicable.
        assert!(!availability_match(&p, &opp).applicable);

        p.travel = TravelAvailability::Available;
        assert_eq!(availability_match(&p, &opp).score, 100.0);

        p.travel = TravelAvailability::Unavailable;
        assert_eq!(availability_match(&p, &opp).score, 0.0);

        // Same city: no travel needed regardless of preference.
        p.travel = TravelAvailability::Unknown;
        p.location = Some(Location::new("Berlin", "Germany"));
        let result = availability_match(&p, &opp);
        assert!(result.applicable);
        assert_eq!(result.score, 100.0);
    }

    #[test]
    fn remote_work_needs_no_travel() {
        let mut opp = opportunity();
        opp.location = Some(LocationConstraint::Remote);
        let result = availability_match(&profile(), &opp);
        assert!(result.applicable);
        assert_eq!(result.score, 100.0);
    }

    #[test]
    fn physical_neutral_when_either_side_silent() {
        assert!(!physical_match(&profile(), &opportunity()).applicable);

        let mut opp = opportunity();
        opp.physical_preference = Some(PhysicalPreference {
            height_range: Some(HeightRange {
                min_cm: Some(170.0),
                max_cm: Some(185.0),
            }),
            body_types: Vec::new(),
        });
        // Preference declared but profile silent: still neutral.
        assert!(!physical_match(&profile(), &opp).applicable);
    }

    #[test]
    fn physical_scores_declared_checks_only() {
        let mut opp = opportunity();
        opp.physical_preference = Some(PhysicalPreference {
            height_range: Some(HeightRange {
                min_cm: Some(170.0),
                max_cm: Some(185.0),
            }),
            body_types: vec!["athletic".to_string()],
        });

        let mut p = profile();
        p.physical.height_cm = Some(178.0);
        let result = physical_match(&p, &opp);
        assert!(result.applicable);
        assert_eq!(result.score, 100.0);

        p.physical.body_type = Some("slim".to_string());
        let result = physical_match(&p, &opp);
        assert_eq!(result.score, 50.0);
    }

    #[test]
    fn portfolio_only_counts_when_required() {
        assert!(!portfolio_match(&profile(), &opportunity()).applicable);

        let mut opp = opportunity();
        opp.portfolio_required = true;
        assert_eq!(portfolio_match(&profile(), &opp).score, 0.0);

        let mut p = profile();
        p.portfolio_url = Some("https://example.com/work".to_string());
        assert_eq!(portfolio_match(&p, &opp).score, 100.0);
    }
}
