use crate::models::UserProfile;

/// Default half-width of the age window, in years
pub const DEFAULT_AGE_WINDOW: u8 = 5;

/// Both sides must want each other: the candidate is what the user is
/// looking for, and the user is what the candidate is looking for.
///
/// Values compare exactly; a preference such as "Everyone" only matches a
/// profile whose gender is literally "Everyone".
#[inline]
pub fn matches_reciprocal_preference(user: &UserProfile, candidate: &UserProfile) -> bool {
    candidate.gender == user.looking_for && candidate.looking_for == user.gender
}

/// Inclusive age window `[user_age - window, user_age + window]`
#[inline]
pub fn within_age_window(user_age: u8, candidate_age: u8, window: u8) -> bool {
    let min = user_age.saturating_sub(window);
    let max = user_age.saturating_add(window);
    candidate_age >= min && candidate_age <= max
}

/// Demographic eligibility of `candidate` for `user`, ignoring exclusions
/// and distance.
#[inline]
pub fn matches_demographics(user: &UserProfile, candidate: &UserProfile, age_window: u8) -> bool {
    // Soft-deactivated users are never shown
    if !candidate.is_active {
        return false;
    }

    if candidate.id == user.id {
        return false;
    }

    if !matches_reciprocal_preference(user, candidate) {
        return false;
    }

    within_age_window(user.age, candidate.age, age_window)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn create_test_profile(id: i64, age: u8, gender: &str, looking_for: &str) -> UserProfile {
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

    #[test]
    fn test_reciprocal_match() {
        let user = create_test_profile(1, 30, "Male", "Female");
        let candidate = create_test_profile(2, 28, "Female", "Male");
        assert!(matches_demographics(&user, &candidate, DEFAULT_AGE_WINDOW));
    }

    #[test]
    fn test_one_sided_preference_rejected() {
        let user = create_test_profile(1, 30, "Male", "Female");
        let candidate = create_test_profile(2, 28, "Female", "Female");
        assert!(!matches_demographics(&user, &candidate, DEFAULT_AGE_WINDOW));
    }

    #[test]
    fn test_everyone_is_not_a_wildcard() {
        let user = create_test_profile(1, 30, "Male", "Female");
        let candidate = create_test_profile(2, 28, "Female", "Everyone");
        assert!(!matches_reciprocal_preference(&user, &candidate));
    }

    #[test]
    fn test_age_boundary() {
        assert!(within_age_window(30, 25, 5));
        assert!(within_age_window(30, 35, 5));
        assert!(!within_age_window(30, 36, 5));
        assert!(!within_age_window(30, 24, 5));
    }

    #[test]
    fn test_age_window_saturates() {
        assert!(within_age_window(2, 0, 5));
        assert!(within_age_window(253, 255, 5));
    }

    #[test]
    fn test_self_rejected() {
        let user = create_test_profile(1, 30, "Female", "Female");
        assert!(!matches_demographics(&user, &user, DEFAULT_AGE_WINDOW));
    }

    #[test]
    fn test_inactive_user_filtered() {
        let user = create_test_profile(1, 30, "Male", "Female");
        let mut candidate = create_test_profile(2, 28, "Female", "Male");
        candidate.is_active = false;
        assert!(!matches_demographics(&user, &candidate, DEFAULT_AGE_WINDOW));
    }
}
