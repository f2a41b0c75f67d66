use newsranker_common::Referer;

/// Reference score of an article given the referers pointing at it.
///
/// The follower sum is an integer up until the single multiply/divide.
pub fn reference_score(twitter_users: f64, reference_weight: f64, referers: &[Referer]) -> f64 {
    let total_followers: i64 = referers.iter().map(|r| r.follower_count).sum();
    total_followers as f64 * reference_weight / twitter_users
}
