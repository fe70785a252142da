// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    BoundingBox, CanonicalPair, Candidate, Coordinate, LikeDecision, Match, MatchInsert, UserId,
    UserProfile, Verdict,
};
pub use requests::{PotentialMatchesQuery, UpdateLocationRequest, UpdatePresenceRequest};
pub use responses::{
    ErrorResponse, HealthResponse, LikeOutcome, MatchesResponse, PassOutcome,
    PotentialMatchesResponse,
};
