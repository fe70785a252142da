//! Spark Match - matching engine for the Spark dating app
//!
//! Records like/pass decisions, turns reciprocal likes into exactly one
//! canonical match per pair, and filters the candidate population each user
//! gets to evaluate next.

pub mod auth;
pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{CandidateFilter, LikeLedger, MatchEngine, MatchError, distance::{distance_km, haversine_distance}};
pub use models::{Candidate, Coordinate, LikeOutcome, Match, PassOutcome, UserId, UserProfile, Verdict};
