//! DNS response cache with TTL-based expiration.

use std::time::{Duration, Instant};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::dns::Message;

/// Cached TTLs are clamped into this range: the floor keeps an entry's
/// expiry strictly after its insertion even for TTL 0 answers, the cap
/// bounds staleness.
const MIN_TTL: Duration = Duration::from_secs(1);
const MAX_TTL: Duration = Duration::from_secs(86_400);

struct CacheEntry {
    message: Message,
    expires_at: Instant,
}

/// Shared positive response cache keyed by normalized question name.
///
/// All handler tasks go through one reader-writer lock; `get` hands back a
/// clone so no caller ever holds the lock across I/O.
pub struct ResponseCache {
    entries: RwLock<FxHashMap<String, CacheEntry>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(FxHashMap::default()),
        }
    }

    /// Look up a live entry. An expired entry is removed and reported as a
    /// miss.
    pub fn get(&self, name: &str) -> Option<Message> {
        self.get_at(name, Instant::now())
    }

    /// Store a message under `name`. The expiry comes from the first
    /// answer's TTL; messages without answers are not cached.
    pub fn set(&self, name: &str, message: Message) {
        self.set_at(name, message, Instant::now())
    }

    /// Remove one entry unconditionally.
    pub fn delete(&self, name: &str) {
        self.entries.write().remove(name);
    }

    /// Drop every entry.
    pub fn invalidate(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn get_at(&self, name: &str, now: Instant) -> Option<Message> {
        {
            let entries = self.entries.read();
            match entries.get(name) {
                Some(entry) if now < entry.expires_at => return Some(entry.message.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        // Expired: removal needs the write lock.
        self.entries.write().remove(name);
        None
    }

    fn set_at(&self, name: &str, message: Message, now: Instant) {
        let Some(first) = message.answers.first() else {
            return;
        };
        let ttl = Duration::from_secs(u64::from(first.ttl)).clamp(MIN_TTL, MAX_TTL);
        self.entries.write().insert(
            name.to_string(),
            CacheEntry {
                message,
                expires_at: now + ttl,
            },
        );
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}
