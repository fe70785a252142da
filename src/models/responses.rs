use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::models::domain::{Candidate, Match};

/// Outcome of a like
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikeOutcome {
    pub matched: bool,
    #[serde(rename = "matchId", skip_serializing_if = "Option::is_none")]
    pub match_id: Option<Uuid>,
}

impl LikeOutcome {
    pub fn pending() -> Self {
        Self { matched: false, match_id: None }
    }

    pub fn matched(match_id: Uuid) -> Self {
        Self { matched: true, match_id: Some(match_id) }
    }
}

/// Outcome of a pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassOutcome {
    pub ok: bool,
}

/// Response for the potential matches endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PotentialMatchesResponse {
    pub candidates: Vec<Candidate>,
    pub count: usize,
}

/// Response for the matches endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchesResponse {
    pub matches: Vec<Match>,
    pub count: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
