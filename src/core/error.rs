use thiserror::Error;

use crate::models::UserId;
use crate::services::StoreError;

/// Errors surfaced by the matching core
#[derive(Debug, Error)]
pub enum MatchError {
    /// A user tried to like or pass on themself
    #[error("User {0} cannot act on themself")]
    InvalidActor(UserId),

    /// The referenced user does not exist or has been deactivated
    #[error("User {0} not found")]
    NotFound(UserId),

    /// Storage failed; nothing was retried
    #[error("Persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

impl MatchError {
    /// Rejected input, as opposed to an infrastructure failure
    pub fn is_rejected_input(&self) -> bool {
        matches!(self, MatchError::InvalidActor(_) | MatchError::NotFound(_))
    }
}
