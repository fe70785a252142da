use async_trait::async_trait;
use thiserror::Error;

use crate::models::{CanonicalPair, Coordinate, LikeDecision, Match, MatchInsert, UserId, UserProfile, Verdict};

/// Errors raised by any persistence or profile backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    Api(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Constraint violated: {0}")]
    Constraint(String),
}

/// Read access to profiles plus the two writes the matching core performs
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Look up a profile by id, active or not
    async fn get_profile(&self, user_id: UserId) -> Result<Option<UserProfile>, StoreError>;

    /// Snapshot of every active profile, the candidate population
    async fn active_profiles(&self) -> Result<Vec<UserProfile>, StoreError>;

    /// Set or clear a user's location. Returns false if the user is unknown.
    async fn update_location(
        &self,
        user_id: UserId,
        location: Option<Coordinate>,
    ) -> Result<bool, StoreError>;

    /// Set the online flag and stamp last_seen/last_active.
    /// Returns false if the user is unknown.
    async fn update_online_status(&self, user_id: UserId, online: bool) -> Result<bool, StoreError>;
}

/// Durable like/pass decisions, one row per ordered pair
#[async_trait]
pub trait DecisionStore: Send + Sync {
    /// Insert or overwrite the decision for (actor, target).
    /// Returns the verdict that was replaced, if any.
    async fn upsert_decision(&self, decision: &LikeDecision) -> Result<Option<Verdict>, StoreError>;

    async fn get_decision(
        &self,
        actor_id: UserId,
        target_id: UserId,
    ) -> Result<Option<LikeDecision>, StoreError>;

    /// All decisions made by `actor_id`
    async fn decisions_by(&self, actor_id: UserId) -> Result<Vec<LikeDecision>, StoreError>;
}

/// Durable match rows, unique per canonical pair
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Insert `candidate` unless its pair already has a match, in which case
    /// the stored row comes back as `MatchInsert::Existing`.
    async fn insert_match(&self, candidate: Match) -> Result<MatchInsert, StoreError>;

    async fn find_match(&self, pair: CanonicalPair) -> Result<Option<Match>, StoreError>;

    /// Every match `user_id` is part of, oldest first
    async fn matches_for(&self, user_id: UserId) -> Result<Vec<Match>, StoreError>;
}

#[async_trait]
impl<T: ProfileStore + ?Sized> ProfileStore for std::sync::Arc<T> {
    async fn get_profile(&self, user_id: UserId) -> Result<Option<UserProfile>, StoreError> {
        (**self).get_profile(user_id).await
    }

    async fn active_profiles(&self) -> Result<Vec<UserProfile>, StoreError> {
        (**self).active_profiles().await
    }

    async fn update_location(
        &self,
        user_id: UserId,
        location: Option<Coordinate>,
    ) -> Result<bool, StoreError> {
        (**self).update_location(user_id, location).await
    }

    async fn update_online_status(&self, user_id: UserId, online: bool) -> Result<bool, StoreError> {
        (**self).update_online_status(user_id, online).await
    }
}
