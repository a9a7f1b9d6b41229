pub mod engine;

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::snapshot::ProfileField;

/// Coarse grouping for the UI; one category per profile field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionCategory {
    Location,
    Professional,
    Availability,
    Physical,
}

impl SuggestionCategory {
    pub fn for_field(field: ProfileField) -> Self {
        match field {
            ProfileField::Location => Self::Location,
            ProfileField::PortfolioUrl | ProfileField::Skills => Self::Professional,
            ProfileField::TravelAvailability => Self::Availability,
            ProfileField::PhysicalAttributes => Self::Physical,
        }
    }
}

impl Display for SuggestionCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Location => write!(f, "location"),
            Self::Professional => write!(f, "professional"),
            Self::Availability => write!(f, "availability"),
            Self::Physical => write!(f, "physical"),
        }
    }
}

/// One actionable gap in a profile, with its estimated payoff.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImprovementSuggestion {
    pub field: ProfileField,
    pub category: SuggestionCategory,
    /// Machine-friendly edit verb for UI deep links.
    pub action: String,
    /// Estimated average gain in overall score, in points, if the field
    /// were filled in.
    pub impact: f64,
    /// Open opportunities whose score would move.
    pub affected_opportunities: u64,
    pub message: String,
}

/// Full insight report for one profile: where it stands today and what
/// filling the top gaps could unlock.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InsightReport {
    pub profile_id: String,
    pub current_score: f64,
    pub potential_score: f64,
    pub suggestions: Vec<ImprovementSuggestion>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_field_maps_to_a_category() {
        assert_eq!(
            SuggestionCategory::for_field(ProfileField::Location),
            SuggestionCategory::Location
        );
        assert_eq!(
            SuggestionCategory::for_field(ProfileField::PortfolioUrl),
            SuggestionCategory::Professional
        );
        assert_eq!(
            SuggestionCategory::for_field(ProfileField::Skills),
            SuggestionCategory::Professional
        );
        assert_eq!(
            SuggestionCategory::for_field(ProfileField::TravelAvailability),
            SuggestionCategory::Availability
        );
        assert_eq!(
            SuggestionCategory::for_field(ProfileField::PhysicalAttributes),
            SuggestionCategory::Physical
        );
    }
}
