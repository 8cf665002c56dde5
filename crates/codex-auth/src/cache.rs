//! Single-slot credential cache
//!
//! One live entry at a time, owned exclusively by the resolver. A hit
//! requires both the TTL and the source file's mtime to still match: the
//! codex CLI rewrites the file out-of-band on refresh/login, and TTL alone
//! would keep serving the pre-rewrite token for up to the full window.

use crate::credential::ResolvedCredential;

#[derive(Debug)]
struct CacheEntry {
    expires_at: u64,
    source_mtime: Option<u64>,
    result: ResolvedCredential,
}

/// The resolver's cache slot.
#[derive(Debug, Default)]
pub struct CredentialCache {
    entry: Option<CacheEntry>,
}

impl CredentialCache {
    /// Return the cached credential if it is still fresh for the file's
    /// current mtime. `None` for `current_mtime` (file gone) is always a
    /// miss.
    pub fn get(&self, current_mtime: Option<u64>, now: u64) -> Option<&ResolvedCredential> {
        let entry = self.entry.as_ref()?;
        let current = current_mtime?;
        if entry.source_mtime != Some(current) {
            return None;
        }
        if now >= entry.expires_at {
            return None;
        }
        Some(&entry.result)
    }

    /// Replace the slot with a freshly resolved credential.
    pub fn put(&mut self, result: ResolvedCredential, source_mtime: Option<u64>, expires_at: u64) {
        self.entry = Some(CacheEntry {
            expires_at,
            source_mtime,
            result,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::AuthKind;
    use common::Secret;
    use std::path::PathBuf;

    fn credential(token: &str) -> ResolvedCredential {
        ResolvedCredential {
            kind: AuthKind::OAuth,
            access_token: Secret::new(token.to_string()),
            refresh_token: Some(Secret::new("rt".to_string())),
            path: PathBuf::from("/tmp/auth.json"),
            last_refresh: None,
        }
    }

    #[test]
    fn hit_requires_matching_mtime_and_live_ttl() {
        let mut cache = CredentialCache::default();
        cache.put(credential("at"), Some(100), 1_000);

        let hit = cache.get(Some(100), 500).unwrap();
        assert_eq!(hit.access_token.expose(), "at");
    }

    #[test]
    fn expired_ttl_is_a_miss() {
        let mut cache = CredentialCache::default();
        cache.put(credential("at"), Some(100), 1_000);
        assert!(cache.get(Some(100), 1_000).is_none());
        assert!(cache.get(Some(100), 2_000).is_none());
    }

    #[test]
    fn changed_mtime_is_a_miss_even_within_ttl() {
        let mut cache = CredentialCache::default();
        cache.put(credential("at"), Some(100), 1_000);
        assert!(cache.get(Some(101), 500).is_none());
    }

    #[test]
    fn missing_file_is_always_a_miss() {
        let mut cache = CredentialCache::default();
        cache.put(credential("at"), Some(100), 1_000);
        assert!(cache.get(None, 500).is_none());
    }

    #[test]
    fn empty_cache_misses() {
        let cache = CredentialCache::default();
        assert!(cache.get(Some(100), 0).is_none());
    }

    #[test]
    fn put_replaces_previous_entry() {
        let mut cache = CredentialCache::default();
        cache.put(credential("old"), Some(100), 1_000);
        cache.put(credential("new"), Some(200), 2_000);

        assert!(cache.get(Some(100), 500).is_none());
        let hit = cache.get(Some(200), 500).unwrap();
        assert_eq!(hit.access_token.expose(), "new");
    }
}
