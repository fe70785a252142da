use std::collections::HashSet;

use crate::core::{
    distance::{known_distance_km, within_radius},
    filters::{matches_demographics, DEFAULT_AGE_WINDOW},
};
use crate::models::{Candidate, UserId, UserProfile};

/// Decides which profiles a user gets to evaluate next.
///
/// # Rules
/// 1. never the user themself
/// 2. reciprocal gender preference
/// 3. age within the configured window, inclusive
/// 4. not in the exclusion set (already decided on, or already matched)
/// 5. active profiles only
/// 6. within `max_distance_km` when configured and both locations are
///    known; an unknown distance never excludes
///
/// Output follows population order. No ranking is applied.
#[derive(Debug, Clone, Copy)]
pub struct CandidateFilter {
    age_window: u8,
    max_distance_km: Option<f64>,
}

impl CandidateFilter {
    pub fn new(age_window: u8, max_distance_km: Option<f64>) -> Self {
        Self { age_window, max_distance_km }
    }

    pub fn age_window(&self) -> u8 {
        self.age_window
    }

    pub fn max_distance_km(&self) -> Option<f64> {
        self.max_distance_km
    }

    /// Whether `candidate` should be shown to `user`
    pub fn is_candidate(
        &self,
        user: &UserProfile,
        candidate: &UserProfile,
        excluded: &HashSet<UserId>,
    ) -> bool {
        if excluded.contains(&candidate.id) {
            return false;
        }

        if !matches_demographics(user, candidate, self.age_window) {
            return false;
        }

        match (self.max_distance_km, &user.location, &candidate.location) {
            (Some(radius), Some(center), Some(point)) => within_radius(center, point, radius),
            _ => true,
        }
    }

    /// Lazily filter `population` down to the candidates for `user`.
    ///
    /// The sequence reflects the snapshot it was handed; call again to see
    /// changes made since.
    pub fn find_candidates<'a, I>(
        &'a self,
        user: &'a UserProfile,
        population: I,
        excluded: &'a HashSet<UserId>,
    ) -> impl Iterator<Item = Candidate> + 'a
    where
        I: IntoIterator<Item = UserProfile>,
        I::IntoIter: 'a,
    {
        population
            .into_iter()
            .filter(move |profile| self.is_candidate(user, profile, excluded))
            .map(move |profile| {
                let distance_km = known_distance_km(user.location.as_ref(), profile.location.as_ref());
                let shared_interests = user.shared_interests(&profile);
                Candidate {
                    profile,
                    distance_km,
                    shared_interests,
                }
            })
    }
}

impl Default for CandidateFilter {
    fn default() -> Self {
        Self::new(DEFAULT_AGE_WINDOW, None)
    }
}
