// Core matching exports
pub mod candidates;
pub mod distance;
pub mod engine;
pub mod error;
pub mod filters;
pub mod ledger;

pub use candidates::CandidateFilter;
pub use distance::{calculate_bounding_box, distance_km, haversine_distance, is_within_bounding_box, known_distance_km};
pub use engine::{MatchEngine, PairState};
pub use error::MatchError;
pub use filters::{matches_demographics, matches_reciprocal_preference, within_age_window};
pub use ledger::{LikeLedger, RecordResult};
