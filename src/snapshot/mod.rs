pub mod store;

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Location {
    pub city: String,
    pub country: String,
}

impl Location {
    pub fn new(city: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            country: country.into(),
        }
    }

    pub fn same_city(&self, other: &Location) -> bool {
        self.city.eq_ignore_ascii_case(&other.city) && self.same_country(other)
    }

    pub fn same_country(&self, other: &Location) -> bool {
        self.country.eq_ignore_ascii_case(&other.country)
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.city, self.country)
    }
}

/// Where an opportunity expects the work to happen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LocationConstraint {
    Remote,
    OnSite(Location),
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TravelAvailability {
    Available,
    Unavailable,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct HeightRange {
    pub min_cm: Option<f64>,
    pub max_cm: Option<f64>,
}

impl HeightRange {
    pub fn contains(&self, height_cm: f64) -> bool {
        if let Some(min) = self.min_cm {
            if height_cm < min {
                return false;
            }
        }
        if let Some(max) = self.max_cm {
            if height_cm > max {
                return false;
            }
        }
        true
    }

    /// A representative value inside the range, used by what-if fills.
    pub fn midpoint(&self) -> Option<f64> {
        match (self.min_cm, self.max_cm) {
            (Some(min), Some(max)) => Some((min + max) / 2.0),
            (Some(min), None) => Some(min),
            (None, Some(max)) => Some(max),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PhysicalAttributes {
    #[serde(default)]
    pub height_cm: Option<f64>,
    #[serde(default)]
    pub body_type: Option<String>,
}

impl PhysicalAttributes {
    pub fn is_empty(&self) -> bool {
        self.height_cm.is_none() && self.body_type.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PhysicalPreference {
    #[serde(default)]
    pub height_range: Option<HeightRange>,
    #[serde(default)]
    pub body_types: Vec<String>,
}

impl PhysicalPreference {
    pub fn is_empty(&self) -> bool {
        self.height_range.is_none() && self.body_types.is_empty()
    }
}

/// Immutable view of a professional's profile at scoring time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileSnapshot {
    pub id: String,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub skills: BTreeSet<String>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub years_experience: Option<u32>,
    #[serde(default)]
    pub travel: TravelAvailability,
    #[serde(default)]
    pub physical: PhysicalAttributes,
    #[serde(default)]
    pub portfolio_url: Option<String>,
    #[serde(default)]
    pub capabilities: BTreeSet<String>,
    #[serde(default)]
    pub completion_percentage: u8,
}

impl ProfileSnapshot {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: 0,
            skills: BTreeSet::new(),
            location: None,
            years_experience: None,
            travel: TravelAvailability::Unknown,
            physical: PhysicalAttributes::default(),
            portfolio_url: None,
            capabilities: BTreeSet::new(),
            completion_percentage: 0,
        }
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities
            .iter()
            .any(|c| c.eq_ignore_ascii_case(capability))
    }

    pub fn is_missing(&self, field: ProfileField) -> bool {
        match field {
            ProfileField::Location => self.location.is_none(),
            ProfileField::PortfolioUrl => self.portfolio_url.is_none(),
            ProfileField::TravelAvailability => self.travel == TravelAvailability::Unknown,
            ProfileField::PhysicalAttributes => self.physical.is_empty(),
            ProfileField::Skills => self.skills.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityKind {
    GigRole,
    CollaborationRole,
}

impl Display for OpportunityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GigRole => write!(f, "gig role"),
            Self::CollaborationRole => write!(f, "collaboration role"),
        }
    }
}

/// Immutable view of an open opportunity at scoring time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpportunitySnapshot {
    pub id: String,
    #[serde(default)]
    pub version: u64,
    pub kind: OpportunityKind,
    #[serde(default)]
    pub required_skills: BTreeSet<String>,
    #[serde(default)]
    pub location: Option<LocationConstraint>,
    #[serde(default)]
    pub paid: bool,
    #[serde(default)]
    pub physical_preference: Option<PhysicalPreference>,
    #[serde(default)]
    pub portfolio_required: bool,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
}

impl OpportunitySnapshot {
    pub fn new(id: impl Into<String>, kind: OpportunityKind) -> Self {
        Self {
            id: id.into(),
            version: 0,
            kind,
            required_skills: BTreeSet::new(),
            location: None,
            paid: false,
            physical_preference: None,
            portfolio_required: false,
            deadline: None,
        }
    }

    /// Whether this opportunity constrains the given profile dimension at all.
    /// Used for population counts behind improvement suggestions.
    pub fn constrains(&self, field: ProfileField) -> bool {
        match field {
            ProfileField::Location | ProfileField::TravelAvailability => {
                matches!(self.location, Some(LocationConstraint::OnSite(_)))
            }
            ProfileField::PortfolioUrl => self.portfolio_required,
            ProfileField::PhysicalAttributes => self
                .physical_preference
                .as_ref()
                .map(|p| !p.is_empty())
                .unwrap_or(false),
            ProfileField::Skills => !self.required_skills.is_empty(),
        }
    }
}

/// Profile dimensions the suggestion engine can recommend filling in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    Location,
    PortfolioUrl,
    TravelAvailability,
    PhysicalAttributes,
    Skills,
}

impl ProfileField {
    pub const ALL: [ProfileField; 5] = [
        ProfileField::Location,
        ProfileField::PortfolioUrl,
        ProfileField::TravelAvailability,
        ProfileField::PhysicalAttributes,
        ProfileField::Skills,
    ];
}

impl Display for ProfileField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Location => write!(f, "location"),
            Self::PortfolioUrl => write!(f, "portfolio_url"),
            Self::TravelAvailability => write!(f, "travel_availability"),
            Self::PhysicalAttributes => write!(f, "physical_attributes"),
            Self::Skills => write!(f, "skills"),
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown profile field: {0}")]
pub struct ProfileFieldParseError(pub String);

impl FromStr for ProfileField {
    type Err = ProfileFieldParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "location" | "city" => Ok(Self::Location),
            "portfolio_url" | "portfolio" => Ok(Self::PortfolioUrl),
            "travel_availability" | "travel" => Ok(Self::TravelAvailability),
            "physical_attributes" | "physical" => Ok(Self::PhysicalAttributes),
            "skills" | "equipment" => Ok(Self::Skills),
            _ => Err(ProfileFieldParseError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn height_range_bounds_are_inclusive() {
        let range = HeightRange {
            min_cm: Some(160.0),
            max_cm: Some(180.0),
        };
        assert!(range.contains(160.0));
        assert!(range.contains(180.0));
        assert!(!range.contains(159.9));
        assert!(!range.contains(180.1));
    }

    #[test]
    fn open_ended_height_range() {
        let range = HeightRange {
            min_cm: Some(170.0),
            max_cm: None,
        };
        assert!(range.contains(210.0));
        assert!(!range.contains(150.0));
    }

    #[test]
    fn profile_field_round_trips_through_str() {
        for field in ProfileField::ALL {
            let parsed = ProfileField::from_str(&field.to_string()).expect("parse failed");
            assert_eq!(parsed, field);
        }
        assert!(ProfileField::from_str("hair_color").is_err());
    }

    #[test]
    fn missing_fields_detected() {
        let profile = ProfileSnapshot::new("p1");
        for field in ProfileField::ALL {
            assert!(profile.is_missing(field), "{field} should be missing");
        }

        let mut filled = ProfileSnapshot::new("p2");
        filled.location = Some(Location::new("Lisbon", "Portugal"));
        filled.portfolio_url = Some("https://example.com/work".to_string());
        filled.travel = TravelAvailability::Available;
        filled.physical.height_cm = Some(178.0);
        filled.skills.insert("photography".to_string());
        for field in ProfileField::ALL {
            assert!(!filled.is_missing(field), "{field} should be present");
        }
    }

    #[test]
    fn constraint_detection_per_field() {
        let mut opp = OpportunitySnapshot::new("o1", OpportunityKind::GigRole);
        assert!(!opp.constrains(ProfileField::Location));
        assert!(!opp.constrains(ProfileField::Skills));

        opp.location = Some(LocationConstraint::Remote);
        assert!(!opp.constrains(ProfileField::Location));

        opp.location = Some(LocationConstraint::OnSite(Location::new("Berlin", "Germany")));
        assert!(opp.constrains(ProfileField::Location));
        assert!(opp.constrains(ProfileField::TravelAvailability));

        opp.required_skills.insert("editing".to_string());
        assert!(opp.constrains(ProfileField::Skills));

        opp.portfolio_required = true;
        assert!(opp.constrains(ProfileField::PortfolioUrl));
    }
}
