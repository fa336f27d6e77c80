// src/core/response_cache.rs — Time-boxed memoization of oracle responses

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::util::truncate_chars;

/// Characters of content that feed the key fingerprint. Distinct inputs
/// sharing this prefix (and the same discriminators) collide; a collision
/// only returns a cached response for a call that would otherwise have
/// been made fresh.
pub const KEY_CONTENT_PREFIX: usize = 500;

const SELF_REFINE_MAX_AGE: Duration = Duration::from_secs(30 * 60);
const PROGRESSIVE_MAX_AGE: Duration = Duration::from_secs(45 * 60);
const DYNAMIC_ANALYSIS_MAX_AGE: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    created_at: Instant,
}

/// Process-scoped response cache. Entries expire by age and are evicted
/// lazily on read; nothing is ever edited in place.
#[derive(Debug)]
pub struct ResponseCache {
    entries: HashMap<String, CacheEntry>,
    max_age: Duration,
    enabled: bool,
}

impl ResponseCache {
    pub fn new(max_age: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            max_age,
            enabled: true,
        }
    }

    pub fn for_self_refine() -> Self {
        Self::new(SELF_REFINE_MAX_AGE)
    }

    pub fn for_progressive() -> Self {
        Self::new(PROGRESSIVE_MAX_AGE)
    }

    pub fn for_dynamic_analysis() -> Self {
        Self::new(DYNAMIC_ANALYSIS_MAX_AGE)
    }

    /// A disabled cache never hits and never stores.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Toggle in place; entries already stored are kept but not served.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Build a bounded key from the operation kind, a few context
    /// discriminators and a fingerprint of the content prefix.
    pub fn make_key(kind: &str, content: &str, context: &[&str]) -> String {
        let prefix = truncate_chars(content, KEY_CONTENT_PREFIX);
        let digest = Sha256::digest(prefix.as_bytes());

        let mut key = String::from(kind);
        for discriminator in context {
            key.push(':');
            key.push_str(discriminator);
        }
        key.push(':');
        key.push_str(&hex::encode(&digest[..16]));
        key
    }

    /// Look up a fresh entry. Expired entries are evicted and read as absent.
    pub fn get(&mut self, key: &str) -> Option<String> {
        if !self.enabled {
            return None;
        }

        let expired = match self.entries.get(key) {
            Some(entry) if entry.created_at.elapsed() < self.max_age => {
                tracing::debug!(key, "Response cache hit");
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            tracing::debug!(key, "Response cache entry expired");
            self.entries.remove(key);
        }
        None
    }

    /// Store (or replace) a value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        if !self.enabled {
            return;
        }
        self.entries.insert(
            key.into(),
            CacheEntry {
                value: value.into(),
                created_at: Instant::now(),
            },
        );
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&mut self) -> usize {
        let max_age = self.max_age;
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.created_at.elapsed() < max_age);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::for_self_refine()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_get() {
        let mut cache = ResponseCache::for_progressive();
        let key = ResponseCache::make_key("critique", "some prompt", &["1"]);
        assert_eq!(cache.get(&key), None);
        cache.set(key.clone(), "cached body");
        assert_eq!(cache.get(&key).as_deref(), Some("cached body"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_set_replaces_existing() {
        let mut cache = ResponseCache::default();
        cache.set("k", "first");
        cache.set("k", "second");
        assert_eq!(cache.get("k").as_deref(), Some("second"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_expired_entry_evicted_on_read() {
        let mut cache = ResponseCache::new(Duration::ZERO);
        cache.set("k", "v");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_purge_expired() {
        let mut cache = ResponseCache::new(Duration::ZERO);
        cache.set("a", "1");
        cache.set("b", "2");
        assert_eq!(cache.purge_expired(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_disabled_cache_never_stores() {
        let mut cache = ResponseCache::default().with_enabled(false);
        cache.set("k", "v");
        assert!(cache.is_empty());
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_presets_max_age() {
        assert_eq!(
            ResponseCache::for_self_refine().max_age(),
            Duration::from_secs(1800)
        );
        assert_eq!(
            ResponseCache::for_progressive().max_age(),
            Duration::from_secs(2700)
        );
        assert_eq!(
            ResponseCache::for_dynamic_analysis().max_age(),
            Duration::from_secs(3600)
        );
    }

    // ─── make_key ───────────────────────────────────────────────

    #[test]
    fn test_key_includes_kind_and_context() {
        let key = ResponseCache::make_key("improve", "text", &["2", "enhancement"]);
        assert!(key.starts_with("improve:2:enhancement:"));
    }

    #[test]
    fn test_key_is_content_sensitive() {
        let a = ResponseCache::make_key("critique", "prompt one", &[]);
        let b = ResponseCache::make_key("critique", "prompt two", &[]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_is_context_sensitive() {
        let a = ResponseCache::make_key("critique", "same", &["1"]);
        let b = ResponseCache::make_key("critique", "same", &["2"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_bounded_for_long_content() {
        let long = "x".repeat(50_000);
        let key = ResponseCache::make_key("layer", &long, &["structure_clarity"]);
        assert!(key.len() < 100);
    }

    #[test]
    fn test_key_shared_prefix_collides() {
        let base = "y".repeat(KEY_CONTENT_PREFIX);
        let a = ResponseCache::make_key("critique", &format!("{base}tail-a"), &[]);
        let b = ResponseCache::make_key("critique", &format!("{base}tail-b"), &[]);
        assert_eq!(a, b);
    }
}
