use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Stable numeric user identifier. Its natural ordering is the canonical
/// ordering used for match pairs.
pub type UserId = i64;

/// A point on the globe, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// User profile attributes needed for matching
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub age: u8,
    pub gender: String,
    #[serde(rename = "lookingFor")]
    pub looking_for: String,
    #[serde(default)]
    pub location: Option<Coordinate>,
    #[serde(rename = "isActive", default = "default_true")]
    pub is_active: bool,
    #[serde(rename = "isOnline", default)]
    pub is_online: bool,
    #[serde(rename = "lastSeen", default)]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(rename = "lastActive", default)]
    pub last_active: Option<DateTime<Utc>>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub interests: BTreeSet<String>,
}

fn default_true() -> bool { true }

impl UserProfile {
    /// Interests this profile has in common with `other`, in sorted order
    pub fn shared_interests(&self, other: &UserProfile) -> Vec<String> {
        self.interests.intersection(&other.interests).cloned().collect()
    }
}

/// Outcome of one user evaluating another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "verdict", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Like,
    Pass,
}

/// The latest decision `actor_id` made about `target_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikeDecision {
    #[serde(rename = "actorId")]
    pub actor_id: UserId,
    #[serde(rename = "targetId")]
    pub target_id: UserId,
    pub verdict: Verdict,
    #[serde(rename = "decidedAt")]
    pub decided_at: DateTime<Utc>,
}

/// Unordered pair of distinct users, stored as (low, high)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalPair {
    low: UserId,
    high: UserId,
}

impl CanonicalPair {
    /// Returns `None` when both ids are the same user
    pub fn new(a: UserId, b: UserId) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self { low: a, high: b }),
            std::cmp::Ordering::Greater => Some(Self { low: b, high: a }),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn low(&self) -> UserId {
        self.low
    }

    pub fn high(&self) -> UserId {
        self.high
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.low == user_id || self.high == user_id
    }
}

/// A mutual match. `user_a < user_b` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: Uuid,
    #[serde(rename = "userA")]
    pub user_a: UserId,
    #[serde(rename = "userB")]
    pub user_b: UserId,
    #[serde(rename = "matchedAt")]
    pub matched_at: DateTime<Utc>,
}

impl Match {
    /// Build a fresh match record for `pair`, stamped now
    pub fn for_pair(pair: CanonicalPair) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_a: pair.low(),
            user_b: pair.high(),
            matched_at: Utc::now(),
        }
    }

    pub fn pair(&self) -> CanonicalPair {
        CanonicalPair { low: self.user_a, high: self.user_b }
    }

    /// The other member of the match, if `user_id` belongs to it
    pub fn partner_of(&self, user_id: UserId) -> Option<UserId> {
        if user_id == self.user_a {
            Some(self.user_b)
        } else if user_id == self.user_b {
            Some(self.user_a)
        } else {
            None
        }
    }
}

/// Result of a guarded match insert
#[derive(Debug, Clone, PartialEq)]
pub enum MatchInsert {
    Created(Match),
    /// The pair was already matched; the stored row is returned untouched
    Existing(Match),
}

impl MatchInsert {
    pub fn into_match(self) -> Match {
        match self {
            MatchInsert::Created(m) | MatchInsert::Existing(m) => m,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, MatchInsert::Created(_))
    }
}

/// A profile eligible to be shown to another user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(flatten)]
    pub profile: UserProfile,
    #[serde(rename = "distanceKm")]
    pub distance_km: Option<f64>,
    #[serde(rename = "sharedInterests")]
    pub shared_interests: Vec<String>,
}

/// Geospatial bounding box
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}
