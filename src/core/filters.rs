use crate::models::Profile;

/// Default minimum readiness score for a profile to be shown to others
pub const DEFAULT_MIN_READINESS: u8 = 4;

/// Default number of candidates returned per request
pub const DEFAULT_CANDIDATE_LIMIT: usize = 20;

/// Check if a profile may be shown to `viewer_id` while browsing
///
/// Eligibility only, no ranking: never the viewer themselves, and only
/// profiles with a readiness score of at least `min_readiness`.
#[inline]
pub fn is_eligible_candidate(profile: &Profile, viewer_id: &str, min_readiness: u8) -> bool {
    if profile.id == viewer_id {
        return false;
    }

    match profile.readiness_score {
        Some(score) => score >= min_readiness,
        None => false,
    }
}

/// Apply [`is_eligible_candidate`] and the result cap to a batch of profiles
pub fn eligible_candidates(
    profiles: Vec<Profile>,
    viewer_id: &str,
    min_readiness: u8,
    limit: usize,
) -> Vec<Profile> {
    profiles
        .into_iter()
        .filter(|p| is_eligible_candidate(p, viewer_id, min_readiness))
        .take(limit)
        .collect()
}
