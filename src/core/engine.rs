use std::collections::HashSet;
use std::sync::Arc;

use crate::core::{candidates::CandidateFilter, error::MatchError, ledger::LikeLedger};
use crate::models::{
    CanonicalPair, Candidate, Coordinate, LikeOutcome, Match, MatchInsert, PassOutcome, UserId,
    UserProfile, Verdict,
};
use crate::services::{DecisionStore, MatchStore, ProfileStore};

/// Where an unordered pair of users stands.
///
/// `Matched` is terminal: later passes leave the match in place.
#[derive(Debug, Clone, PartialEq)]
pub enum PairState {
    NoInteraction,
    /// Exactly one side currently likes the other
    OneSidedLike { liker: UserId },
    /// Both sides like each other but the match row is not written yet,
    /// e.g. the insert failed after the second like committed. The next like
    /// from either side creates it.
    MutualLike,
    Matched(Match),
}

/// Turns reciprocal likes into matches and serves candidate discovery.
///
/// Every operation takes the acting user's id explicitly; the engine trusts
/// it and performs no authentication.
#[derive(Clone)]
pub struct MatchEngine {
    profiles: Arc<dyn ProfileStore>,
    ledger: LikeLedger,
    matches: Arc<dyn MatchStore>,
    filter: CandidateFilter,
}

impl MatchEngine {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        decisions: Arc<dyn DecisionStore>,
        matches: Arc<dyn MatchStore>,
        filter: CandidateFilter,
    ) -> Self {
        Self {
            profiles,
            ledger: LikeLedger::new(decisions),
            matches,
            filter,
        }
    }

    pub fn ledger(&self) -> &LikeLedger {
        &self.ledger
    }

    pub fn filter(&self) -> &CandidateFilter {
        &self.filter
    }

    /// Record that `actor_id` likes `target_id`.
    ///
    /// Reports `matched` with the match id whenever the pair is matched after
    /// this call, including when an earlier call already created the match.
    pub async fn like_user(&self, actor_id: UserId, target_id: UserId) -> Result<LikeOutcome, MatchError> {
        let pair = self.validate_pair(actor_id, target_id).await?;

        let recorded = self.ledger.record(actor_id, target_id, Verdict::Like).await?;

        if let Some(existing) = self.matches.find_match(pair).await? {
            return Ok(LikeOutcome::matched(existing.id));
        }

        if !recorded.reciprocal {
            tracing::info!("User {} liked {} (no match yet)", actor_id, target_id);
            return Ok(LikeOutcome::pending());
        }

        let created = self.create_match(pair).await?;
        Ok(LikeOutcome::matched(created.id))
    }

    /// Record that `actor_id` passes on `target_id`
    pub async fn pass_user(&self, actor_id: UserId, target_id: UserId) -> Result<PassOutcome, MatchError> {
        self.validate_pair(actor_id, target_id).await?;

        self.ledger.record(actor_id, target_id, Verdict::Pass).await?;

        tracing::info!("User {} passed on {}", actor_id, target_id);
        Ok(PassOutcome { ok: true })
    }

    /// Create the match for `pair`, or return the one that already exists.
    ///
    /// The store's uniqueness guard decides races; losing one is not an
    /// error.
    pub async fn create_match(&self, pair: CanonicalPair) -> Result<Match, MatchError> {
        match self.matches.insert_match(Match::for_pair(pair)).await? {
            MatchInsert::Created(created) => {
                tracing::info!(
                    "Match {} created for users {} and {}",
                    created.id,
                    created.user_a,
                    created.user_b
                );
                Ok(created)
            }
            MatchInsert::Existing(existing) => {
                tracing::debug!(
                    "Match for users {} and {} already exists ({}), skipping",
                    existing.user_a,
                    existing.user_b,
                    existing.id
                );
                Ok(existing)
            }
        }
    }

    /// Up to `limit` profiles `user_id` has not yet decided on or matched with
    pub async fn potential_matches(&self, user_id: UserId, limit: usize) -> Result<Vec<Candidate>, MatchError> {
        let user = self.require_profile(user_id).await?;

        let mut excluded: HashSet<UserId> = self.ledger.decided_ids(user_id).await?;
        excluded.extend(
            self.matches
                .matches_for(user_id)
                .await?
                .iter()
                .filter_map(|m| m.partner_of(user_id)),
        );

        let population = self.profiles.active_profiles().await?;
        let population_size = population.len();

        let candidates: Vec<Candidate> = self
            .filter
            .find_candidates(&user, population, &excluded)
            .take(limit)
            .collect();

        tracing::info!(
            "Returning {} candidates for user {} (population {}, excluded {})",
            candidates.len(),
            user_id,
            population_size,
            excluded.len()
        );

        Ok(candidates)
    }

    /// Every match `user_id` belongs to
    pub async fn matches_for(&self, user_id: UserId) -> Result<Vec<Match>, MatchError> {
        self.require_profile(user_id).await?;
        Ok(self.matches.matches_for(user_id).await?)
    }

    /// Current state of the unordered pair {a, b}. Read-only.
    pub async fn pair_state(&self, a: UserId, b: UserId) -> Result<PairState, MatchError> {
        let pair = CanonicalPair::new(a, b).ok_or(MatchError::InvalidActor(a))?;

        if let Some(existing) = self.matches.find_match(pair).await? {
            return Ok(PairState::Matched(existing));
        }

        let a_likes = self.ledger.has_liked(a, b).await?;
        let b_likes = self.ledger.has_liked(b, a).await?;

        Ok(match (a_likes, b_likes) {
            (true, false) => PairState::OneSidedLike { liker: a },
            (false, true) => PairState::OneSidedLike { liker: b },
            (true, true) => PairState::MutualLike,
            (false, false) => PairState::NoInteraction,
        })
    }

    /// Set or clear the user's location
    pub async fn update_location(&self, user_id: UserId, location: Option<Coordinate>) -> Result<(), MatchError> {
        if !self.profiles.update_location(user_id, location).await? {
            return Err(MatchError::NotFound(user_id));
        }
        tracing::debug!("Updated location for user {}", user_id);
        Ok(())
    }

    /// Flip the user's online flag and stamp their activity
    pub async fn update_online_status(&self, user_id: UserId, online: bool) -> Result<(), MatchError> {
        if !self.profiles.update_online_status(user_id, online).await? {
            return Err(MatchError::NotFound(user_id));
        }
        tracing::debug!("User {} is now {}", user_id, if online { "online" } else { "offline" });
        Ok(())
    }

    async fn validate_pair(&self, actor_id: UserId, target_id: UserId) -> Result<CanonicalPair, MatchError> {
        let pair = CanonicalPair::new(actor_id, target_id).ok_or(MatchError::InvalidActor(actor_id))?;

        self.require_profile(actor_id).await?;
        let target = self.require_profile(target_id).await?;
        if !target.is_active {
            return Err(MatchError::NotFound(target_id));
        }

        Ok(pair)
    }

    async fn require_profile(&self, user_id: UserId) -> Result<UserProfile, MatchError> {
        self.profiles
            .get_profile(user_id)
            .await?
            .ok_or(MatchError::NotFound(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MemoryStore;
    use std::collections::BTreeSet;

    fn profile(id: UserId, age: u8, gender: &str, looking_for: &str) -> UserProfile {
        UserProfile {
            id,
            name: format!("User {}", id),
            age,
            gender: gender.to_string(),
            looking_for: looking_for.to_string(),
            location: None,
            is_active: true,
            is_online: false,
            last_seen: None,
            last_active: None,
            bio: None,
            interests: BTreeSet::new(),
        }
    }

    fn engine(store: Arc<MemoryStore>) -> MatchEngine {
        MatchEngine::new(store.clone(), store.clone(), store, CandidateFilter::default())
    }

    fn seeded() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::with_profiles(vec![
            profile(1, 25, "Female", "Male"),
            profile(2, 27, "Male", "Female"),
            profile(3, 26, "Male", "Female"),
        ]))
    }

    #[tokio::test]
    async fn test_pair_state_transitions() {
        let engine = engine(seeded());

        assert_eq!(engine.pair_state(1, 2).await.unwrap(), PairState::NoInteraction);

        engine.like_user(1, 2).await.unwrap();
        assert_eq!(engine.pair_state(2, 1).await.unwrap(), PairState::OneSidedLike { liker: 1 });

        engine.like_user(2, 1).await.unwrap();
        assert!(matches!(engine.pair_state(1, 2).await.unwrap(), PairState::Matched(_)));
    }

    #[tokio::test]
    async fn test_mutual_like_without_row_is_completed_by_next_like() {
        let store = seeded();
        let engine = engine(store.clone());

        // Both decisions committed but no match row, as after a failed insert
        engine.ledger().record(1, 2, Verdict::Like).await.unwrap();
        engine.ledger().record(2, 1, Verdict::Like).await.unwrap();

        assert_eq!(engine.pair_state(1, 2).await.unwrap(), PairState::MutualLike);
        assert_eq!(engine.pair_state(2, 1).await.unwrap(), PairState::MutualLike);
        assert_eq!(store.match_count().await, 0);

        let outcome = engine.like_user(1, 2).await.unwrap();
        assert!(outcome.matched);
        assert_eq!(store.match_count().await, 1);
        assert!(matches!(engine.pair_state(1, 2).await.unwrap(), PairState::Matched(_)));
    }

    #[tokio::test]
    async fn test_matched_is_terminal() {
        let store = seeded();
        let engine = engine(store.clone());

        engine.like_user(1, 2).await.unwrap();
        let matched = engine.like_user(2, 1).await.unwrap();

        engine.pass_user(2, 1).await.unwrap();
        assert!(matches!(engine.pair_state(1, 2).await.unwrap(), PairState::Matched(_)));

        // Liking again still reports the original match
        let again = engine.like_user(1, 2).await.unwrap();
        assert_eq!(again, matched);
        assert_eq!(store.match_count().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_target_is_not_found() {
        let engine = engine(seeded());
        let result = engine.like_user(1, 99).await;
        assert!(matches!(result, Err(MatchError::NotFound(99))));
        assert!(engine.ledger().decided_ids(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deactivated_target_is_not_found() {
        let store = seeded();
        store.deactivate(2).await;
        let engine = engine(store);

        assert!(matches!(engine.pass_user(1, 2).await, Err(MatchError::NotFound(2))));
    }

    #[tokio::test]
    async fn test_self_pass_is_invalid() {
        let engine = engine(seeded());
        let result = engine.pass_user(3, 3).await;
        assert!(matches!(result, Err(MatchError::InvalidActor(3))));
        assert!(result.unwrap_err().is_rejected_input());
    }

    #[tokio::test]
    async fn test_matched_users_leave_candidates() {
        let engine = engine(seeded());

        engine.like_user(1, 2).await.unwrap();
        engine.like_user(2, 1).await.unwrap();

        let ids: Vec<UserId> = engine
            .potential_matches(1, 10)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.profile.id)
            .collect();
        assert_eq!(ids, vec![3]);
    }

    #[tokio::test]
    async fn test_location_update_for_unknown_user() {
        let engine = engine(seeded());
        let result = engine.update_location(42, Some(Coordinate::new(0.0, 0.0))).await;
        assert!(matches!(result, Err(MatchError::NotFound(42))));
    }
}
