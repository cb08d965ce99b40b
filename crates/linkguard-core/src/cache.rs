//! In-memory verdict cache with a fixed time-to-live.
//!
//! Keys are the literal URL string, not a normalized form: two URLs that
//! differ only by trailing slash or query order are cached independently.
//! This is a deliberate simplification, not an optimization target.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::verdict::Verdict;

/// Default time-to-live for cached verdicts.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// One cached verdict. Entries are never mutated, only replaced or expired.
#[derive(Debug, Clone)]
struct CacheEntry {
    verdict: Verdict,
    created_at: Instant,
}

/// URL -> most recent verdict, with lazy expiry on read.
#[derive(Debug)]
pub struct VerdictCache {
    entries: HashMap<String, CacheEntry>,
    ttl: Duration,
}

impl Default for VerdictCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl VerdictCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    /// Returns the cached verdict for `url` if present and still fresh.
    /// An entry at or past the TTL behaves as a miss and is evicted.
    pub fn get(&mut self, url: &str) -> Option<&Verdict> {
        let stale = match self.entries.get(url) {
            Some(entry) => entry.created_at.elapsed() >= self.ttl,
            None => return None,
        };
        if stale {
            self.entries.remove(url);
            tracing::debug!(url, "evicted stale cache entry");
            return None;
        }
        self.entries.get(url).map(|e| &e.verdict)
    }

    /// Stores a verdict for `url`, replacing any previous entry whole.
    pub fn put(&mut self, url: &str, verdict: Verdict) {
        self.entries.insert(
            url.to_string(),
            CacheEntry {
                verdict,
                created_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
