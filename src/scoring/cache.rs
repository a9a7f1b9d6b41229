use std::collections::HashMap;
use std::sync::RwLock;

use crate::scoring::CompatibilityScore;
use crate::snapshot::{OpportunitySnapshot, ProfileSnapshot};

/// Versioned cache key: a score is only reusable while both snapshots are
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScoreKey {
    pub profile_id: String,
    pub opportunity_id: String,
    pub profile_version: u64,
    pub opportunity_version: u64,
}

impl ScoreKey {
    pub fn for_pair(profile: &ProfileSnapshot, opportunity: &OpportunitySnapshot) -> Self {
        Self {
            profile_id: profile.id.clone(),
            opportunity_id: opportunity.id.clone(),
            profile_version: profile.version,
            opportunity_version: opportunity.version,
        }
    }
}

/// Injected cache seam, so the scorer stays testable in isolation. Writes
/// are idempotent: recomputing and overwriting with an identical value is
/// always safe.
pub trait ScoreCache: Send + Sync {
    fn get(&self, key: &ScoreKey) -> Option<CompatibilityScore>;
    fn put(&self, key: ScoreKey, score: CompatibilityScore);
    fn invalidate_profile(&self, profile_id: &str);
}

#[derive(Default)]
pub struct MemoryScoreCache {
    entries: RwLock<HashMap<ScoreKey, CompatibilityScore>>,
}

impl MemoryScoreCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("score cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ScoreCache for MemoryScoreCache {
    fn get(&self, key: &ScoreKey) -> Option<CompatibilityScore> {
        self.entries
            .read()
            .expect("score cache lock poisoned")
            .get(key)
            .cloned()
    }

    fn put(&self, key: ScoreKey, score: CompatibilityScore) {
        self.entries
            .write()
            .expect("score cache lock poisoned")
            .insert(key, score);
    }

    fn invalidate_profile(&self, profile_id: &str) {
        self.entries
            .write()
            .expect("score cache lock poisoned")
            .retain(|key, _| key.profile_id != profile_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn score(profile_id: &str, opportunity_id: &str) -> CompatibilityScore {
        CompatibilityScore {
            profile_id: profile_id.to_string(),
            opportunity_id: opportunity_id.to_string(),
            overall: 80.0,
            factors: Vec::new(),
            computed_at: Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap(),
        }
    }

    fn key(profile_id: &str, opportunity_id: &str, pv: u64, ov: u64) -> ScoreKey {
        ScoreKey {
            profile_id: profile_id.to_string(),
            opportunity_id: opportunity_id.to_string(),
            profile_version: pv,
            opportunity_version: ov,
        }
    }

    #[test]
    fn version_bump_misses() {
        let cache = MemoryScoreCache::new();
        cache.put(key("p1", "o1", 1, 1), score("p1", "o1"));
        assert!(cache.get(&key("p1", "o1", 1, 1)).is_some());
        assert!(cache.get(&key("p1", "o1", 2, 1)).is_none());
        assert!(cache.get(&key("p1", "o1", 1, 2)).is_none());
    }

    #[test]
    fn invalidate_drops_all_profile_entries() {
        let cache = MemoryScoreCache::new();
        cache.put(key("p1", "o1", 1, 1), score("p1", "o1"));
        cache.put(key("p1", "o2", 1, 1), score("p1", "o2"));
        cache.put(key("p2", "o1", 1, 1), score("p2", "o1"));
        cache.invalidate_profile("p1");
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&key("p2", "o1", 1, 1)).is_some());
    }

    #[test]
    fn overwrite_is_idempotent() {
        let cache = MemoryScoreCache::new();
        cache.put(key("p1", "o1", 1, 1), score("p1", "o1"));
        cache.put(key("p1", "o1", 1, 1), score("p1", "o1"));
        assert_eq!(cache.len(), 1);
    }
}
