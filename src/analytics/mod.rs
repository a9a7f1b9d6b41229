pub mod aggregator;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scoring::FactorKind;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimeWindow {
    Week,
    Month,
    Quarter,
}

impl TimeWindow {
    pub fn days(&self) -> i64 {
        match self {
            Self::Week => 7,
            Self::Month => 30,
            Self::Quarter => 90,
        }
    }
}

impl Display for TimeWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Week => write!(f, "week"),
            Self::Month => write!(f, "month"),
            Self::Quarter => write!(f, "quarter"),
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown time window: {0}")]
pub struct TimeWindowParseError(pub String);

impl FromStr for TimeWindow {
    type Err = TimeWindowParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "week" | "7d" => Ok(Self::Week),
            "month" | "30d" => Ok(Self::Month),
            "quarter" | "90d" => Ok(Self::Quarter),
            _ => Err(TimeWindowParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    View,
    ApplicationSent,
    MatchSucceeded,
}

/// One historical scoring/application outcome, owned by the data store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutcomeRecord {
    pub profile_id: String,
    pub opportunity_id: String,
    pub interaction: InteractionKind,
    #[serde(default)]
    pub compatibility: Option<f64>,
    #[serde(default)]
    pub matched_factors: Vec<FactorKind>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub avg_compatibility: f64,
    pub total_calculations: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopFactor {
    pub factor: FactorKind,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EngagementLevel {
    Excellent,
    Good,
    Fair,
    NeedsImprovement,
}

impl EngagementLevel {
    pub fn for_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::Excellent
        } else if score >= 60.0 {
            Self::Good
        } else if score >= 40.0 {
            Self::Fair
        } else {
            Self::NeedsImprovement
        }
    }
}

impl Display for EngagementLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Excellent => write!(f, "excellent"),
            Self::Good => write!(f, "good"),
            Self::Fair => write!(f, "fair"),
            Self::NeedsImprovement => write!(f, "needs improvement"),
        }
    }
}

/// Time-bucketed roll-up of a profile's matchmaking history. Descriptive
/// display data, never prescriptive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyticsSnapshot {
    pub profile_id: String,
    pub window: TimeWindow,
    pub avg_compatibility: f64,
    pub total_interactions: u64,
    pub applications_sent: u64,
    pub successful_matches: u64,
    pub engagement_score: f64,
    pub trends: Vec<TrendPoint>,
    pub top_factors: Vec<TopFactor>,
}

impl AnalyticsSnapshot {
    pub fn empty(profile_id: impl Into<String>, window: TimeWindow) -> Self {
        Self {
            profile_id: profile_id.into(),
            window,
            avg_compatibility: 0.0,
            total_interactions: 0,
            applications_sent: 0,
            successful_matches: 0,
            engagement_score: 0.0,
            trends: Vec::new(),
            top_factors: Vec::new(),
        }
    }

    pub fn engagement_level(&self) -> EngagementLevel {
        EngagementLevel::for_score(self.engagement_score)
    }

    pub fn success_rate(&self) -> f64 {
        if self.applications_sent == 0 {
            return 0.0;
        }
        100.0 * self.successful_matches as f64 / self.applications_sent as f64
    }
}
