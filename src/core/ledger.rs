use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;

use crate::core::error::MatchError;
use crate::models::{LikeDecision, UserId, Verdict};
use crate::services::DecisionStore;

/// Outcome of recording a decision
#[derive(Debug, Clone, PartialEq)]
pub struct RecordResult {
    /// The decision as committed
    pub decision: LikeDecision,
    /// Verdict this write replaced, if the pair had one
    pub previous: Option<Verdict>,
    /// The committed verdict is Like and the target already likes the actor
    pub reciprocal: bool,
}

impl RecordResult {
    /// True when this write is what completed the mutual like. Re-recording
    /// an existing Like reports reciprocity but is not new.
    pub fn is_new_reciprocity(&self) -> bool {
        self.reciprocal && self.previous != Some(Verdict::Like)
    }
}

/// Directed like/pass decisions, one per ordered (actor, target) pair.
///
/// A later decision overwrites an earlier one. Writes to the same pair are
/// serialized by the store; different pairs never contend.
#[derive(Clone)]
pub struct LikeLedger {
    store: Arc<dyn DecisionStore>,
}

impl LikeLedger {
    pub fn new(store: Arc<dyn DecisionStore>) -> Self {
        Self { store }
    }

    /// Persist `verdict` for (actor, target), replacing any earlier decision
    pub async fn record(
        &self,
        actor_id: UserId,
        target_id: UserId,
        verdict: Verdict,
    ) -> Result<RecordResult, MatchError> {
        if actor_id == target_id {
            return Err(MatchError::InvalidActor(actor_id));
        }

        let decision = LikeDecision {
            actor_id,
            target_id,
            verdict,
            decided_at: Utc::now(),
        };

        let previous = self.store.upsert_decision(&decision).await?;

        // Checked after our write commits, so of two racing reciprocal likes
        // at least the later one sees the other
        let reciprocal = verdict == Verdict::Like && self.has_liked(target_id, actor_id).await?;

        tracing::debug!(
            "Ledger: {} -> {} {:?} (previous {:?}, reciprocal {})",
            actor_id,
            target_id,
            verdict,
            previous,
            reciprocal
        );

        Ok(RecordResult {
            decision,
            previous,
            reciprocal,
        })
    }

    pub async fn decision(
        &self,
        actor_id: UserId,
        target_id: UserId,
    ) -> Result<Option<LikeDecision>, MatchError> {
        Ok(self.store.get_decision(actor_id, target_id).await?)
    }

    pub async fn has_liked(&self, actor_id: UserId, target_id: UserId) -> Result<bool, MatchError> {
        Ok(self
            .decision(actor_id, target_id)
            .await?
            .map_or(false, |d| d.verdict == Verdict::Like))
    }

    pub async fn liked_ids(&self, actor_id: UserId) -> Result<HashSet<UserId>, MatchError> {
        self.ids_with(actor_id, Some(Verdict::Like)).await
    }

    pub async fn passed_ids(&self, actor_id: UserId) -> Result<HashSet<UserId>, MatchError> {
        self.ids_with(actor_id, Some(Verdict::Pass)).await
    }

    /// Everyone `actor_id` has liked or passed
    pub async fn decided_ids(&self, actor_id: UserId) -> Result<HashSet<UserId>, MatchError> {
        self.ids_with(actor_id, None).await
    }

    async fn ids_with(
        &self,
        actor_id: UserId,
        verdict: Option<Verdict>,
    ) -> Result<HashSet<UserId>, MatchError> {
        Ok(self
            .store
            .decisions_by(actor_id)
            .await?
            .into_iter()
            .filter(|d| verdict.map_or(true, |v| d.verdict == v))
            .map(|d| d.target_id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MemoryStore;

    fn ledger() -> LikeLedger {
        LikeLedger::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_self_like_is_invalid() {
        let ledger = ledger();
        let result = ledger.record(4, 4, Verdict::Like).await;
        assert!(matches!(result, Err(MatchError::InvalidActor(4))));
        assert!(ledger.decided_ids(4).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pass_then_like_overwrites() {
        let ledger = ledger();
        ledger.record(1, 2, Verdict::Pass).await.unwrap();
        let result = ledger.record(1, 2, Verdict::Like).await.unwrap();

        assert_eq!(result.previous, Some(Verdict::Pass));
        assert!(ledger.has_liked(1, 2).await.unwrap());
        assert!(ledger.passed_ids(1).await.unwrap().is_empty());
        assert_eq!(ledger.liked_ids(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reciprocity_is_reported_once() {
        let ledger = ledger();
        let first = ledger.record(1, 2, Verdict::Like).await.unwrap();
        assert!(!first.reciprocal);

        let second = ledger.record(2, 1, Verdict::Like).await.unwrap();
        assert!(second.reciprocal);
        assert!(second.is_new_reciprocity());

        let repeat = ledger.record(2, 1, Verdict::Like).await.unwrap();
        assert!(repeat.reciprocal);
        assert!(!repeat.is_new_reciprocity());
    }

    #[tokio::test]
    async fn test_pass_is_never_reciprocal() {
        let ledger = ledger();
        ledger.record(1, 2, Verdict::Like).await.unwrap();
        let result = ledger.record(2, 1, Verdict::Pass).await.unwrap();
        assert!(!result.reciprocal);
    }

    #[tokio::test]
    async fn test_decided_ids_is_union() {
        let ledger = ledger();
        ledger.record(1, 2, Verdict::Like).await.unwrap();
        ledger.record(1, 3, Verdict::Pass).await.unwrap();
        ledger.record(5, 1, Verdict::Like).await.unwrap();

        let decided = ledger.decided_ids(1).await.unwrap();
        let expected: HashSet<UserId> = [2, 3].into_iter().collect();
        assert_eq!(decided, expected);
    }
}
