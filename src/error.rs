use std::time::Duration;

use thiserror::Error;

/// Engine-level failures. The pure scoring path never produces these;
/// missing optional snapshot data degrades a factor to inapplicable instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("profile not found: {0}")]
    ProfileNotFound(String),
    #[error("opportunity not found: {0}")]
    OpportunityNotFound(String),
    #[error("invalid engine configuration: {0}")]
    Config(String),
    #[error("dependency query exceeded {0:?}")]
    DependencyTimeout(Duration),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl EngineError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ProfileNotFound(_) | Self::OpportunityNotFound(_)
        )
    }
}
