//! Persistence: a small key-value interface with sled and in-memory backends, and the
//! per-user profile adapter built on top of it.
//!
//! Profile reads and writes never fail the caller. A broken store degrades the session
//! to in-memory only and the failure is logged.

use dashmap::DashMap;
use sled::Db;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::RioResult;
use crate::shared::UserState;

const DEFAULT_PROFILE_PATH: &str = "./data/rio_profiles";

/// Key prefix for per-user snapshots: `iniciativa_diplomat_user_{username}`.
pub const USER_KEY_PREFIX: &str = "iniciativa_diplomat_user_";

/// Key holding the username of the last logged-in user.
pub const CURRENT_USER_KEY: &str = "iniciativa_diplomat_current_user";

/// Synchronous string-keyed byte store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> RioResult<Option<Vec<u8>>>;
    fn set(&self, key: &str, value: &[u8]) -> RioResult<()>;
    fn remove(&self, key: &str) -> RioResult<()>;
    fn keys_with_prefix(&self, prefix: &str) -> RioResult<Vec<String>>;
}

/// Sled-backed store. One DB directory, default tree.
pub struct SledStore {
    db: Db,
}

impl SledStore {
    /// Opens or creates the store at `./data/rio_profiles`.
    pub fn new() -> RioResult<Self> {
        Self::open_path(DEFAULT_PROFILE_PATH)
    }

    /// Opens or creates the store at the given path.
    pub fn open_path<P: AsRef<Path>>(path: P) -> RioResult<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }
}

impl KeyValueStore for SledStore {
    fn get(&self, key: &str) -> RioResult<Option<Vec<u8>>> {
        Ok(self.db.get(key.as_bytes())?.map(|iv| iv.to_vec()))
    }

    fn set(&self, key: &str, value: &[u8]) -> RioResult<()> {
        self.db.insert(key.as_bytes(), value)?;
        self.db.flush()?;
        Ok(())
    }

    fn remove(&self, key: &str) -> RioResult<()> {
        self.db.remove(key.as_bytes())?;
        self.db.flush()?;
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> RioResult<Vec<String>> {
        let mut keys = Vec::new();
        for entry in self.db.scan_prefix(prefix.as_bytes()) {
            let (k, _) = entry?;
            keys.push(String::from_utf8_lossy(&k).into_owned());
        }
        Ok(keys)
    }
}

/// Process-local store. Used for tests and as the fallback when no directory is writable.
#[derive(Default, Clone)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> RioResult<Option<Vec<u8>>> {
        Ok(self.entries.get(key).map(|v| v.clone()))
    }

    fn set(&self, key: &str, value: &[u8]) -> RioResult<()> {
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> RioResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> RioResult<Vec<String>> {
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|e| e.key().starts_with(prefix))
            .map(|e| e.key().clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}

/// Per-username snapshots plus the "current user" pointer.
#[derive(Clone)]
pub struct ProfileStore {
    kv: Arc<dyn KeyValueStore>,
}

impl ProfileStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Profile store over a fresh [`MemoryStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    fn user_key(username: &str) -> String {
        format!("{}{}", USER_KEY_PREFIX, username)
    }

    /// Stored snapshot for `username`. `None` when absent, unreadable or corrupt.
    pub fn load(&self, username: &str) -> Option<UserState> {
        let bytes = match self.kv.get(&Self::user_key(username)) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!(username = %username, error = %e, "profile load failed; continuing in memory");
                return None;
            }
        };
        match UserState::from_bytes(&bytes) {
            Some(state) => Some(state),
            None => {
                warn!(username = %username, "stored profile is corrupt; ignoring it");
                None
            }
        }
    }

    /// Write-through save. Returns false when the snapshot could not be persisted.
    pub fn save(&self, username: &str, state: &UserState) -> bool {
        match self.kv.set(&Self::user_key(username), &state.to_bytes()) {
            Ok(()) => {
                debug!(username = %username, level = state.level, xp = state.xp, "profile saved");
                true
            }
            Err(e) => {
                warn!(username = %username, error = %e, "profile save failed; progress kept in memory only");
                false
            }
        }
    }

    pub fn current_user(&self) -> Option<String> {
        match self.kv.get(CURRENT_USER_KEY) {
            Ok(Some(bytes)) => String::from_utf8(bytes).ok().filter(|s| !s.is_empty()),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "could not read current user pointer");
                None
            }
        }
    }

    pub fn set_current_user(&self, username: &str) {
        if let Err(e) = self.kv.set(CURRENT_USER_KEY, username.as_bytes()) {
            warn!(username = %username, error = %e, "could not write current user pointer");
        }
    }

    pub fn clear_current_user(&self) {
        if let Err(e) = self.kv.remove(CURRENT_USER_KEY) {
            warn!(error = %e, "could not clear current user pointer");
        }
    }

    /// Usernames with a stored snapshot.
    pub fn usernames(&self) -> Vec<String> {
        match self.kv.keys_with_prefix(USER_KEY_PREFIX) {
            Ok(keys) => keys
                .into_iter()
                .filter_map(|k| k.strip_prefix(USER_KEY_PREFIX).map(str::to_string))
                .collect(),
            Err(e) => {
                warn!(error = %e, "could not list stored profiles");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RioError;

    /// Store whose every operation fails, like a browser with storage disabled.
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> RioResult<Option<Vec<u8>>> {
            Err(RioError::Storage("disabled".into()))
        }
        fn set(&self, _key: &str, _value: &[u8]) -> RioResult<()> {
            Err(RioError::Storage("quota exceeded".into()))
        }
        fn remove(&self, _key: &str) -> RioResult<()> {
            Err(RioError::Storage("disabled".into()))
        }
        fn keys_with_prefix(&self, _prefix: &str) -> RioResult<Vec<String>> {
            Err(RioError::Storage("disabled".into()))
        }
    }

    #[test]
    fn test_memory_round_trip() {
        let profiles = ProfileStore::in_memory();
        assert!(profiles.load("ana").is_none());

        let state = UserState::new("ana");
        assert!(profiles.save("ana", &state));
        assert_eq!(profiles.load("ana"), Some(state));
        assert_eq!(profiles.usernames(), vec!["ana".to_string()]);
    }

    #[test]
    fn test_current_user_pointer() {
        let profiles = ProfileStore::in_memory();
        assert_eq!(profiles.current_user(), None);
        profiles.set_current_user("ana");
        assert_eq!(profiles.current_user().as_deref(), Some("ana"));
        profiles.clear_current_user();
        assert_eq!(profiles.current_user(), None);
    }

    #[test]
    fn test_pointer_is_not_listed_as_profile() {
        let profiles = ProfileStore::in_memory();
        profiles.set_current_user("ana");
        assert!(profiles.usernames().is_empty());
    }

    #[test]
    fn test_broken_store_degrades_silently() {
        let profiles = ProfileStore::new(Arc::new(BrokenStore));
        assert!(!profiles.save("ana", &UserState::new("ana")));
        assert!(profiles.load("ana").is_none());
        assert!(profiles.current_user().is_none());
        profiles.set_current_user("ana");
        assert!(profiles.usernames().is_empty());
    }

    #[test]
    fn test_corrupt_snapshot_reads_as_missing() {
        let kv = MemoryStore::new();
        kv.set(&format!("{}ana", USER_KEY_PREFIX), b"{not json").unwrap();
        let profiles = ProfileStore::new(Arc::new(kv));
        assert!(profiles.load("ana").is_none());
    }
}
