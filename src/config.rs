use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::scoring::FactorKind;

/// Weight table must sum to 1 within this tolerance before renormalization.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub weights: WeightsConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub suggestions: SuggestionsConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_skills_weight")]
    pub skills: f64,
    #[serde(default = "default_location_weight")]
    pub location: f64,
    #[serde(default = "default_experience_weight")]
    pub experience: f64,
    #[serde(default = "default_availability_weight")]
    pub availability: f64,
    #[serde(default = "default_physical_weight")]
    pub physical: f64,
    #[serde(default = "default_portfolio_weight")]
    pub portfolio: f64,
}

impl WeightsConfig {
    pub fn weight_for(&self, factor: FactorKind) -> f64 {
        match factor {
            FactorKind::Skills => self.skills,
            FactorKind::Location => self.location,
            FactorKind::Experience => self.experience,
            FactorKind::Availability => self.availability,
            FactorKind::Physical => self.physical,
            FactorKind::Portfolio => self.portfolio,
        }
    }

    /// Fails fast at engine construction, never at request time.
    pub fn validate(&self) -> Result<(), EngineError> {
        for factor in FactorKind::ALL {
            let weight = self.weight_for(factor);
            if weight < 0.0 {
                return Err(EngineError::Config(format!(
                    "negative weight for {factor}: {weight}"
                )));
            }
        }
        let sum: f64 = FactorKind::ALL.iter().map(|f| self.weight_for(*f)).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(EngineError::Config(format!(
                "weights must sum to 1.0, got {sum}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_experience_ceiling")]
    pub experience_ceiling_years: f64,
    #[serde(default = "default_good_match_threshold")]
    pub good_match_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionsConfig {
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
    #[serde(default = "default_max_concurrent_queries")]
    pub max_concurrent_queries: usize,
    #[serde(default = "default_rescore_population_limit")]
    pub rescore_population_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default)]
    pub min_score: f64,
    #[serde(default = "default_closing_window_days")]
    pub closing_window_days: i64,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub min_score: Option<f64>,
    pub experience_ceiling_years: Option<f64>,
}

impl EngineConfig {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/crewmatch/config.toml")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        let parsed: Self = toml::from_str(&data)
            .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
        Ok(parsed)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(min_score) = overrides.min_score {
            self.ranking.min_score = min_score;
        }
        if let Some(ceiling) = overrides.experience_ceiling_years {
            self.scoring.experience_ceiling_years = ceiling;
        }
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    pub fn default_template() -> String {
        let template = r#"[weights]
skills = 0.35
location = 0.20
experience = 0.15
availability = 0.15
physical = 0.10
portfolio = 0.05

[scoring]
experience_ceiling_years = 10.0
good_match_threshold = 70.0

[suggestions]
query_timeout_ms = 2000
max_concurrent_queries = 4
rescore_population_limit = 200

[ranking]
max_concurrency = 32
min_score = 0.0
closing_window_days = 3
"#;
        template.to_string()
    }
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            skills: default_skills_weight(),
            location: default_location_weight(),
            experience: default_experience_weight(),
            availability: default_availability_weight(),
            physical: default_physical_weight(),
            portfolio: default_portfolio_weight(),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            experience_ceiling_years: default_experience_ceiling(),
            good_match_threshold: default_good_match_threshold(),
        }
    }
}

impl Default for SuggestionsConfig {
    fn default() -> Self {
        Self {
            query_timeout_ms: default_query_timeout_ms(),
            max_concurrent_queries: default_max_concurrent_queries(),
            rescore_population_limit: default_rescore_population_limit(),
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            min_score: 0.0,
            closing_window_days: default_closing_window_days(),
        }
    }
}

fn default_skills_weight() -> f64 {
    0.35
}

fn default_location_weight() -> f64 {
    0.20
}

fn default_experience_weight() -> f64 {
    0.15
}

fn default_availability_weight() -> f64 {
    0.15
}

fn default_physical_weight() -> f64 {
    0.10
}

fn default_portfolio_weight() -> f64 {
    0.05
}

fn default_experience_ceiling() -> f64 {
    10.0
}

fn default_good_match_threshold() -> f64 {
    70.0
}

fn default_query_timeout_ms() -> u64 {
    2000
}

fn default_max_concurrent_queries() -> usize {
    4
}

fn default_rescore_population_limit() -> usize {
    200
}

fn default_max_concurrency() -> usize {
    32
}

fn default_closing_window_days() -> i64 {
    3
}
