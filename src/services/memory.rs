use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::{Mutex, RwLock};

use crate::models::{CanonicalPair, Coordinate, LikeDecision, Match, MatchInsert, UserId, UserProfile, Verdict};
use crate::services::store::{DecisionStore, MatchStore, ProfileStore, StoreError};

/// Process-local store backing all three storage traits.
///
/// Used for development runs and tests. The match map is the uniqueness
/// constraint: inserts go through a single lock and the map entry API, so a
/// pair can never receive two rows.
#[derive(Debug, Default)]
pub struct MemoryStore {
    profiles: RwLock<BTreeMap<UserId, UserProfile>>,
    decisions: RwLock<HashMap<(UserId, UserId), LikeDecision>>,
    matches: Mutex<HashMap<CanonicalPair, Match>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with profiles
    pub fn with_profiles<I>(profiles: I) -> Self
    where
        I: IntoIterator<Item = UserProfile>,
    {
        let profiles = profiles.into_iter().map(|p| (p.id, p)).collect();
        Self {
            profiles: RwLock::new(profiles),
            ..Self::default()
        }
    }

    /// Soft-deactivate a user. Returns false if the user is unknown.
    pub async fn deactivate(&self, user_id: UserId) -> bool {
        match self.profiles.write().await.get_mut(&user_id) {
            Some(profile) => {
                profile.is_active = false;
                true
            }
            None => false,
        }
    }

    /// Number of stored match rows
    pub async fn match_count(&self) -> usize {
        self.matches.lock().await.len()
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn get_profile(&self, user_id: UserId) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.profiles.read().await.get(&user_id).cloned())
    }

    async fn active_profiles(&self) -> Result<Vec<UserProfile>, StoreError> {
        Ok(self
            .profiles
            .read()
            .await
            .values()
            .filter(|p| p.is_active)
            .cloned()
            .collect())
    }

    async fn update_location(
        &self,
        user_id: UserId,
        location: Option<Coordinate>,
    ) -> Result<bool, StoreError> {
        let mut profiles = self.profiles.write().await;
        match profiles.get_mut(&user_id) {
            Some(profile) => {
                profile.location = location;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_online_status(&self, user_id: UserId, online: bool) -> Result<bool, StoreError> {
        let mut profiles = self.profiles.write().await;
        match profiles.get_mut(&user_id) {
            Some(profile) => {
                let now = Utc::now();
                profile.is_online = online;
                profile.last_seen = Some(now);
                profile.last_active = Some(now);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl DecisionStore for MemoryStore {
    async fn upsert_decision(&self, decision: &LikeDecision) -> Result<Option<Verdict>, StoreError> {
        if decision.actor_id == decision.target_id {
            return Err(StoreError::Constraint(format!(
                "decision actor and target are both {}",
                decision.actor_id
            )));
        }

        let previous = self
            .decisions
            .write()
            .await
            .insert((decision.actor_id, decision.target_id), decision.clone());

        Ok(previous.map(|d| d.verdict))
    }

    async fn get_decision(
        &self,
        actor_id: UserId,
        target_id: UserId,
    ) -> Result<Option<LikeDecision>, StoreError> {
        Ok(self.decisions.read().await.get(&(actor_id, target_id)).cloned())
    }

    async fn decisions_by(&self, actor_id: UserId) -> Result<Vec<LikeDecision>, StoreError> {
        Ok(self
            .decisions
            .read()
            .await
            .values()
            .filter(|d| d.actor_id == actor_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl MatchStore for MemoryStore {
    async fn insert_match(&self, candidate: Match) -> Result<MatchInsert, StoreError> {
        if candidate.user_a >= candidate.user_b {
            return Err(StoreError::Constraint(format!(
                "match pair ({}, {}) is not canonical",
                candidate.user_a, candidate.user_b
            )));
        }

        let mut matches = self.matches.lock().await;
        match matches.entry(candidate.pair()) {
            std::collections::hash_map::Entry::Occupied(existing) => {
                Ok(MatchInsert::Existing(existing.get().clone()))
            }
            std::collections::hash_map::Entry::Vacant(slot) => {
                Ok(MatchInsert::Created(slot.insert(candidate).clone()))
            }
        }
    }

    async fn find_match(&self, pair: CanonicalPair) -> Result<Option<Match>, StoreError> {
        Ok(self.matches.lock().await.get(&pair).cloned())
    }

    async fn matches_for(&self, user_id: UserId) -> Result<Vec<Match>, StoreError> {
        let mut found: Vec<Match> = self
            .matches
            .lock()
            .await
            .values()
            .filter(|m| m.pair().contains(user_id))
            .cloned()
            .collect();
        found.sort_by_key(|m| m.matched_at);
        Ok(found)
    }
}
