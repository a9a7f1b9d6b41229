use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::analytics::{aggregator, AnalyticsSnapshot, TimeWindow};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::ranking::{rank_matches, RankedMatch};
use crate::scoring::cache::{ScoreCache, ScoreKey};
use crate::scoring::scorer::score_pair;
use crate::scoring::CompatibilityScore;
use crate::snapshot::store::MarketplaceStore;
use crate::snapshot::{OpportunitySnapshot, ProfileSnapshot};
use crate::suggestions::{engine::build_insights, InsightReport};

/// Facade over scoring, ranking, suggestions and analytics. Holds the store
/// and optional score cache behind trait objects so callers choose their own
/// backends.
pub struct MatchEngine {
    store: Arc<dyn MarketplaceStore>,
    cache: Option<Arc<dyn ScoreCache>>,
    config: EngineConfig,
}

impl MatchEngine {
    /// Weight validation happens here, once; requests never see a partially
    /// configured engine.
    pub fn new(
        store: Arc<dyn MarketplaceStore>,
        cache: Option<Arc<dyn ScoreCache>>,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        config.weights.validate()?;
        Ok(Self {
            store,
            cache,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Scores one profile/opportunity pair, read-through cached on both
    /// snapshot versions.
    pub async fn score(
        &self,
        profile_id: &str,
        opportunity_id: &str,
        now: DateTime<Utc>,
    ) -> Result<CompatibilityScore, EngineError> {
        let profile = self.store.profile(profile_id).await?;
        let opportunity = self.store.opportunity(opportunity_id).await?;
        Ok(self.score_snapshots(&profile, &opportunity, now))
    }

    fn score_snapshots(
        &self,
        profile: &ProfileSnapshot,
        opportunity: &OpportunitySnapshot,
        now: DateTime<Utc>,
    ) -> CompatibilityScore {
        let key = ScoreKey::for_pair(profile, opportunity);
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&key) {
                debug!(profile = %profile.id, opportunity = %opportunity.id, "score cache hit");
                return hit;
            }
        }
        let score = score_pair(profile, opportunity, &self.config, now);
        if let Some(cache) = &self.cache {
            cache.put(key, score.clone());
        }
        score
    }

    /// Ranks all open opportunities for a profile, best match first.
    pub async fn rank_opportunities(
        &self,
        profile_id: &str,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<RankedMatch>, EngineError> {
        let profile = self.store.profile(profile_id).await?;
        let opportunities = self.store.open_opportunities().await?;
        let scored: Vec<(CompatibilityScore, Option<DateTime<Utc>>)> =
            stream::iter(opportunities)
                .map(|opportunity| {
                    let profile = &profile;
                    async move {
                        let deadline = opportunity.deadline;
                        (self.score_snapshots(profile, &opportunity, now), deadline)
                    }
                })
                .buffer_unordered(self.config.ranking.max_concurrency)
                .collect()
                .await;
        Ok(rank_matches(
            scored,
            limit,
            self.config.ranking.min_score,
            now,
            self.config.ranking.closing_window_days,
        ))
    }

    /// Ranks candidate profiles for one opportunity, best match first.
    pub async fn rank_profiles(
        &self,
        opportunity_id: &str,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<RankedMatch>, EngineError> {
        let opportunity = self.store.opportunity(opportunity_id).await?;
        let profiles = self.store.candidate_profiles().await?;
        let scored: Vec<(CompatibilityScore, Option<DateTime<Utc>>)> = stream::iter(profiles)
            .map(|profile| {
                let opportunity = &opportunity;
                async move {
                    (
                        self.score_snapshots(&profile, opportunity, now),
                        opportunity.deadline,
                    )
                }
            })
            .buffer_unordered(self.config.ranking.max_concurrency)
            .collect()
            .await;
        Ok(rank_matches(
            scored,
            limit,
            self.config.ranking.min_score,
            now,
            self.config.ranking.closing_window_days,
        ))
    }

    /// Improvement suggestions and score potential for one profile.
    pub async fn insights(
        &self,
        profile_id: &str,
        now: DateTime<Utc>,
    ) -> Result<InsightReport, EngineError> {
        let profile = self.store.profile(profile_id).await?;
        build_insights(self.store.as_ref(), &profile, &self.config, now).await
    }

    /// Analytics roll-up for one profile. A slow or failing history backend
    /// degrades to an empty snapshot; analytics never blocks the caller.
    pub async fn analytics(
        &self,
        profile_id: &str,
        window: TimeWindow,
        now: DateTime<Utc>,
    ) -> Result<AnalyticsSnapshot, EngineError> {
        let profile = self.store.profile(profile_id).await?;
        let timeout = Duration::from_millis(self.config.suggestions.query_timeout_ms);
        let records = match tokio::time::timeout(
            timeout,
            self.store.historical_outcomes(&profile.id, window, now),
        )
        .await
        {
            Ok(Ok(records)) => records,
            Ok(Err(err)) => {
                warn!(profile = %profile.id, error = %err, "outcome history unavailable");
                return Ok(AnalyticsSnapshot::empty(&profile.id, window));
            }
            Err(_) => {
                warn!(profile = %profile.id, ?timeout, "outcome history timed out");
                return Ok(AnalyticsSnapshot::empty(&profile.id, window));
            }
        };
        Ok(aggregator::aggregate(
            &profile.id,
            window,
            &records,
            self.config.scoring.good_match_threshold,
        ))
    }

    /// Drops all cached scores for a profile, for callers reacting to a
    /// profile edit ahead of the version bump propagating.
    pub fn invalidate_profile(&self, profile_id: &str) {
        if let Some(cache) = &self.cache {
            cache.invalidate_profile(profile_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{InteractionKind, OutcomeRecord};
    use crate::scoring::cache::MemoryScoreCache;
    use crate::snapshot::store::{Dataset, JsonStore};
    use crate::snapshot::{Location, LocationConstraint, OpportunityKind, ProfileField};
    use async_trait::async_trait;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 28, 12, 0, 0).unwrap()
    }

    fn dataset() -> Dataset {
        let mut profile = ProfileSnapshot::new("p1");
        profile.version = 3;
        profile.skills.insert("photography".to_string());
        profile.location = Some(Location::new("Lisbon", "Portugal"));

        let mut strong = OpportunitySnapshot::new("strong", OpportunityKind::GigRole);
        strong.required_skills.insert("photography".to_string());
        strong.location = Some(LocationConstraint::Remote);

        let mut weak = OpportunitySnapshot::new("weak", OpportunityKind::GigRole);
        weak.required_skills.insert("3d-modeling".to_string());
        weak.portfolio_required = true;

        Dataset {
            profiles: vec![profile],
            opportunities: vec![strong, weak],
            outcomes: vec![OutcomeRecord {
                profile_id: "p1".to_string(),
                opportunity_id: "strong".to_string(),
                interaction: InteractionKind::MatchSucceeded,
                compatibility: Some(88.0),
                matched_factors: vec![crate::scoring::FactorKind::Skills],
                occurred_at: Utc.with_ymd_and_hms(2026, 8, 27, 9, 0, 0).unwrap(),
            }],
        }
    }

    fn engine_with_cache() -> (MatchEngine, Arc<MemoryScoreCache>) {
        let cache = Arc::new(MemoryScoreCache::new());
        let engine = MatchEngine::new(
            Arc::new(JsonStore::new(dataset())),
            Some(cache.clone()),
            EngineConfig::default(),
        )
        .expect("engine");
        (engine, cache)
    }

    #[tokio::test]
    async fn score_propagates_not_found() {
        let (engine, _) = engine_with_cache();
        let err = engine.score("ghost", "strong", now()).await.unwrap_err();
        assert!(err.is_not_found());
        let err = engine.score("p1", "ghost", now()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn repeated_scores_hit_the_cache() {
        let (engine, cache) = engine_with_cache();
        let first = engine.score("p1", "strong", now()).await.unwrap();
        assert_eq!(cache.len(), 1);
        let second = engine.score("p1", "strong", now()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);

        engine.invalidate_profile("p1");
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn ranking_orders_best_first() {
        let (engine, _) = engine_with_cache();
        let ranked = engine.rank_opportunities("p1", 10, now()).await.unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].score.opportunity_id, "strong");
        assert!(ranked[0].score.overall > ranked[1].score.overall);
        assert!(!ranked[0].reasons.is_empty());
    }

    #[tokio::test]
    async fn rank_profiles_scores_candidates_against_opportunity() {
        let (engine, _) = engine_with_cache();
        let ranked = engine.rank_profiles("strong", 10, now()).await.unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].score.profile_id, "p1");
    }

    #[tokio::test]
    async fn rejects_invalid_weights_at_construction() {
        let mut config = EngineConfig::default();
        config.weights.skills = 0.9;
        let result = MatchEngine::new(Arc::new(JsonStore::new(dataset())), None, config);
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[tokio::test]
    async fn analytics_rolls_up_history() {
        let (engine, _) = engine_with_cache();
        let snapshot = engine
            .analytics("p1", TimeWindow::Week, now())
            .await
            .unwrap();
        assert_eq!(snapshot.total_interactions, 1);
        assert_eq!(snapshot.successful_matches, 1);
        assert_eq!(snapshot.avg_compatibility, 88.0);
    }

    struct SlowHistoryStore {
        inner: JsonStore,
    }

    #[async_trait]
    impl MarketplaceStore for SlowHistoryStore {
        async fn profile(&self, id: &str) -> Result<ProfileSnapshot, EngineError> {
            self.inner.profile(id).await
        }

        async fn opportunity(&self, id: &str) -> Result<OpportunitySnapshot, EngineError> {
            self.inner.opportunity(id).await
        }

        async fn open_opportunities(&self) -> Result<Vec<OpportunitySnapshot>, EngineError> {
            self.inner.open_opportunities().await
        }

        async fn candidate_profiles(&self) -> Result<Vec<ProfileSnapshot>, EngineError> {
            self.inner.candidate_profiles().await
        }

        async fn count_open_missing_field(
            &self,
            field: ProfileField,
        ) -> Result<u64, EngineError> {
            self.inner.count_open_missing_field(field).await
        }

        async fn historical_outcomes(
            &self,
            _profile_id: &str,
            _window: TimeWindow,
            _now: DateTime<Utc>,
        ) -> Result<Vec<OutcomeRecord>, EngineError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Vec::new())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn analytics_degrades_when_history_is_slow() {
        let store = SlowHistoryStore {
            inner: JsonStore::new(dataset()),
        };
        let engine =
            MatchEngine::new(Arc::new(store), None, EngineConfig::default()).expect("engine");
        let snapshot = engine
            .analytics("p1", TimeWindow::Month, now())
            .await
            .unwrap();
        assert_eq!(snapshot.total_interactions, 0);
        assert_eq!(snapshot.engagement_score, 0.0);
    }
}
