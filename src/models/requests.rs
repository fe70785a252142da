use serde::{Deserialize, Serialize};
use validator::Validate;

/// Query string for the potential matches endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PotentialMatchesQuery {
    #[validate(range(min = 1))]
    pub limit: Option<u16>,
}

/// Request to set or clear the caller's location.
/// Both coordinates must be present, or both absent to clear.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateLocationRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
}

/// Request to flip the caller's online flag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePresenceRequest {
    #[serde(default = "default_online")]
    pub online: bool,
}

fn default_online() -> bool {
    true
}
