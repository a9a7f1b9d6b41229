use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::{OutcomeRecord, TimeWindow};
use crate::error::EngineError;
use crate::snapshot::{OpportunitySnapshot, ProfileField, ProfileSnapshot};

/// Read-side marketplace access. The engine only ever sees immutable
/// snapshots; mutation and versioning stay with the owning system.
#[async_trait]
pub trait MarketplaceStore: Send + Sync {
    async fn profile(&self, id: &str) -> Result<ProfileSnapshot, EngineError>;

    async fn opportunity(&self, id: &str) -> Result<OpportunitySnapshot, EngineError>;

    /// All opportunities currently accepting applications.
    async fn open_opportunities(&self) -> Result<Vec<OpportunitySnapshot>, EngineError>;

    /// Profiles eligible to be ranked against an opportunity.
    async fn candidate_profiles(&self) -> Result<Vec<ProfileSnapshot>, EngineError>;

    /// How many open opportunities constrain a field the profile has not
    /// filled in. Backs the aggregate suggestion path for large populations.
    async fn count_open_missing_field(&self, field: ProfileField) -> Result<u64, EngineError>;

    /// Outcome records for one profile inside the trailing window, as of
    /// `now`.
    async fn historical_outcomes(
        &self,
        profile_id: &str,
        window: TimeWindow,
        now: DateTime<Utc>,
    ) -> Result<Vec<OutcomeRecord>, EngineError>;
}

/// On-disk dataset shape for the JSON-backed store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub profiles: Vec<ProfileSnapshot>,
    #[serde(default)]
    pub opportunities: Vec<OpportunitySnapshot>,
    #[serde(default)]
    pub outcomes: Vec<OutcomeRecord>,
}

/// In-memory store loaded from a single JSON file. Serves the CLI and the
/// demo server; production deployments implement [`MarketplaceStore`] over
/// their own storage.
pub struct JsonStore {
    dataset: Dataset,
}

impl JsonStore {
    pub fn new(dataset: Dataset) -> Self {
        Self { dataset }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed reading dataset: {}", path.display()))?;
        let dataset: Dataset = serde_json::from_str(&data)
            .with_context(|| format!("failed parsing dataset JSON: {}", path.display()))?;
        Ok(Self::new(dataset))
    }

    pub fn profile_count(&self) -> usize {
        self.dataset.profiles.len()
    }

    pub fn opportunity_count(&self) -> usize {
        self.dataset.opportunities.len()
    }
}

#[async_trait]
impl MarketplaceStore for JsonStore {
    async fn profile(&self, id: &str) -> Result<ProfileSnapshot, EngineError> {
        self.dataset
            .profiles
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| EngineError::ProfileNotFound(id.to_string()))
    }

    async fn opportunity(&self, id: &str) -> Result<OpportunitySnapshot, EngineError> {
        self.dataset
            .opportunities
            .iter()
            .find(|o| o.id == id)
            .cloned()
            .ok_or_else(|| EngineError::OpportunityNotFound(id.to_string()))
    }

    async fn open_opportunities(&self) -> Result<Vec<OpportunitySnapshot>, EngineError> {
        Ok(self.dataset.opportunities.clone())
    }

    async fn candidate_profiles(&self) -> Result<Vec<ProfileSnapshot>, EngineError> {
        Ok(self.dataset.profiles.clone())
    }

    async fn count_open_missing_field(&self, field: ProfileField) -> Result<u64, EngineError> {
        Ok(self
            .dataset
            .opportunities
            .iter()
            .filter(|o| o.constrains(field))
            .count() as u64)
    }

    async fn historical_outcomes(
        &self,
        profile_id: &str,
        window: TimeWindow,
        now: DateTime<Utc>,
    ) -> Result<Vec<OutcomeRecord>, EngineError> {
        let cutoff = now - Duration::days(window.days());
        Ok(self
            .dataset
            .outcomes
            .iter()
            .filter(|r| r.profile_id == profile_id && r.occurred_at >= cutoff)
            .cloned()
            .collect())
    }
}
