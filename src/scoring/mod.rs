pub mod cache;
pub mod factors;
pub mod scorer;

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One independent comparison dimension contributing to the overall score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum FactorKind {
    Skills,
    Location,
    Experience,
    Availability,
    Physical,
    Portfolio,
}

impl FactorKind {
    pub const ALL: [FactorKind; 6] = [
        FactorKind::Skills,
        FactorKind::Location,
        FactorKind::Experience,
        FactorKind::Availability,
        FactorKind::Physical,
        FactorKind::Portfolio,
    ];
}

impl Display for FactorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Skills => write!(f, "skills"),
            Self::Location => write!(f, "location"),
            Self::Experience => write!(f, "experience"),
            Self::Availability => write!(f, "availability"),
            Self::Physical => write!(f, "physical"),
            Self::Portfolio => write!(f, "portfolio"),
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown factor: {0}")]
pub struct FactorParseError(pub String);

impl FromStr for FactorKind {
    type Err = FactorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skills" | "skill" => Ok(Self::Skills),
            "location" => Ok(Self::Location),
            "experience" => Ok(Self::Experience),
            "availability" | "travel" => Ok(Self::Availability),
            "physical" => Ok(Self::Physical),
            "portfolio" => Ok(Self::Portfolio),
            _ => Err(FactorParseError(s.to_string())),
        }
    }
}

/// Output of a single factor evaluator. An inapplicable factor is removed
/// from the weighted denominator entirely, it is never a zero score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FactorResult {
    pub factor: FactorKind,
    pub score: f64,
    pub applicable: bool,
    pub matched: BTreeSet<String>,
    pub missing: BTreeSet<String>,
}

impl FactorResult {
    pub fn applicable(factor: FactorKind, score: f64) -> Self {
        Self {
            factor,
            score: score.clamp(0.0, 100.0),
            applicable: true,
            matched: BTreeSet::new(),
            missing: BTreeSet::new(),
        }
    }

    pub fn inapplicable(factor: FactorKind) -> Self {
        Self {
            factor,
            score: 0.0,
            applicable: false,
            matched: BTreeSet::new(),
            missing: BTreeSet::new(),
        }
    }

    pub fn with_matched(mut self, tags: impl IntoIterator<Item = String>) -> Self {
        self.matched.extend(tags);
        self
    }

    pub fn with_missing(mut self, tags: impl IntoIterator<Item = String>) -> Self {
        self.missing.extend(tags);
        self
    }
}

/// Overall match between one profile and one opportunity, with the
/// per-factor breakdown that explains it. Pure function of its inputs;
/// `computed_at` is attached by the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompatibilityScore {
    pub profile_id: String,
    pub opportunity_id: String,
    pub overall: f64,
    pub factors: Vec<FactorResult>,
    pub computed_at: DateTime<Utc>,
}

impl CompatibilityScore {
    pub fn factor(&self, kind: FactorKind) -> Option<&FactorResult> {
        self.factors.iter().find(|f| f.factor == kind)
    }

    pub fn applicable_count(&self) -> usize {
        self.factors.iter().filter(|f| f.applicable).count()
    }

    /// Human-readable highlights of what matched, in factor order.
    pub fn match_reasons(&self) -> Vec<String> {
        let mut reasons = Vec::new();
        for factor in &self.factors {
            if !factor.applicable || factor.matched.is_empty() {
                continue;
            }
            let tags = factor
                .matched
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ");
            reasons.push(format!("{}: {tags}", factor.factor));
        }
        reasons
    }
}
