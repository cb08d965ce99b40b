//! Lookalike scoring of an observed hostname against the whitelist.
//!
//! This is a heuristic, not a security boundary: only literal substring
//! containment is scored, so lookalikes built from homoglyphs or
//! hyphenation tricks ("paypa1.com", "pay-pal.com") produce false
//! negatives. Known limitation.

use crate::whitelist::Whitelist;

/// Minimum score for a candidate to count as a lookalike.
const SCORE_THRESHOLD: f64 = 0.5;

/// Returns the best-matching trusted host that `hostname` looks like.
///
/// For every trusted host that is a strict substring of `hostname` (contained
/// but not equal), the score is `trusted.len() / hostname.len()`; the
/// maximum-scoring candidate wins if its score exceeds 0.5. Ties resolve to
/// the lexicographically smallest trusted host, since the whitelist iterates
/// in sorted order and only a strictly greater score replaces the candidate.
pub fn find_lookalike<'a>(hostname: &str, whitelist: &'a Whitelist) -> Option<&'a str> {
    if hostname.is_empty() {
        return None;
    }

    let mut best: Option<&str> = None;
    let mut best_score = 0.0f64;

    for trusted in whitelist.hosts() {
        if hostname != trusted && hostname.contains(trusted) {
            let score = trusted.len() as f64 / hostname.len() as f64;
            if score > best_score {
                best_score = score;
                best = Some(trusted);
            }
        }
    }

    if best_score > SCORE_THRESHOLD {
        best
    } else {
        None
    }
}
