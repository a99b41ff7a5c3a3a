//! Session store for login state and stored credentials
//!
//! Manages a single JSON file with two mappings: pending OAuth states keyed
//! by state value, and credentials keyed by caller token. All writes use
//! atomic temp-file + rename to prevent corruption on crash. A tokio Mutex
//! serializes mutations, so concurrent login and callback requests cannot
//! interleave read-modify-write cycles and lose updates.
//!
//! The store file is the single source of truth. On first run a missing file
//! is created with empty mappings; a corrupt file is a startup error.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// A stored credential: the token pair from the exchange plus the Discord
/// user id, associated with the caller token that initiated the login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credential {
    pub user_id: String,
    pub access_token: String,
    pub refresh_token: String,
}

/// The persisted document. `states` entries are transient (removed on use);
/// `tokens` entries live until overwritten by a later login.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    states: HashMap<String, String>,
    tokens: HashMap<String, Credential>,
}

/// Thread-safe session file manager.
///
/// The Mutex serializes all access. Each mutation updates the in-memory
/// document and persists it before releasing the lock, which gives
/// read-your-writes and single-writer-at-a-time semantics per key.
pub struct SessionStore {
    path: PathBuf,
    state: Mutex<StoreDocument>,
}

impl SessionStore {
    /// Load the session store from the given file path.
    ///
    /// If the file doesn't exist, creates it with empty `states` and
    /// `tokens` mappings so later loads skip the cold-start path.
    pub async fn load(path: PathBuf) -> Result<Self> {
        let doc = if path.exists() {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| Error::Io(format!("reading store file: {e}")))?;
            let doc: StoreDocument = serde_json::from_str(&contents)
                .map_err(|e| Error::StoreParse(format!("parsing store file: {e}")))?;
            info!(
                path = %path.display(),
                states = doc.states.len(),
                tokens = doc.tokens.len(),
                "loaded session store"
            );
            doc
        } else {
            info!(path = %path.display(), "store file not found, creating empty store");
            let doc = StoreDocument::default();
            write_atomic(&path, &doc).await?;
            doc
        };

        Ok(Self {
            path,
            state: Mutex::new(doc),
        })
    }

    /// Record a pending state for a caller token and persist.
    pub async fn insert_state(&self, state: String, caller_token: String) -> Result<()> {
        let mut doc = self.state.lock().await;
        doc.states.insert(state.clone(), caller_token);
        debug!(state, "recorded pending state");
        write_atomic(&self.path, &doc).await
    }

    /// Consume a pending state, returning the caller token it was bound to.
    ///
    /// The state is removed and the removal persisted before this returns,
    /// so a state stays single-use even when later callback steps fail.
    /// Returns `Ok(None)` when the state is unknown.
    pub async fn take_state(&self, state: &str) -> Result<Option<String>> {
        let mut doc = self.state.lock().await;
        let caller_token = doc.states.remove(state);
        if caller_token.is_some() {
            debug!(state, "consumed state");
            write_atomic(&self.path, &doc).await?;
        }
        Ok(caller_token)
    }

    /// Whether a state is currently pending.
    pub async fn contains_state(&self, state: &str) -> bool {
        let doc = self.state.lock().await;
        doc.states.contains_key(state)
    }

    /// Store a credential under a caller token and persist.
    /// A later login with the same caller token overwrites the earlier record.
    pub async fn insert_credential(
        &self,
        caller_token: String,
        credential: Credential,
    ) -> Result<()> {
        let mut doc = self.state.lock().await;
        doc.tokens.insert(caller_token, credential);
        write_atomic(&self.path, &doc).await
    }

    /// Get a clone of the credential stored for a caller token.
    pub async fn credential(&self, caller_token: &str) -> Option<Credential> {
        let doc = self.state.lock().await;
        doc.tokens.get(caller_token).cloned()
    }

    /// Number of pending states.
    pub async fn pending_states(&self) -> usize {
        let doc = self.state.lock().await;
        doc.states.len()
    }

    /// Number of stored credentials.
    pub async fn stored_credentials(&self) -> usize {
        let doc = self.state.lock().await;
        doc.tokens.len()
    }
}

/// Write the store document to a file atomically.
///
/// Writes to a temporary file in the same directory, then renames it over
/// the target. This prevents corruption if the process crashes mid-write.
/// Sets file permissions to 0600 (owner read/write only) since the file
/// contains OAuth tokens.
async fn write_atomic(path: &Path, doc: &StoreDocument) -> Result<()> {
    let json = serde_json::to_string_pretty(doc)
        .map_err(|e| Error::StoreParse(format!("serializing store: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Io("store path has no parent directory".into()))?;

    let tmp_path = dir.join(format!(".store.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Error::Io(format!("writing temp store file: {e}")))?;

    // Set 0600 permissions (unix only)
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::Io(format!("setting store file permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Io(format!("renaming temp store file: {e}")))?;

    debug!(path = %path.display(), "persisted session store");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_credential(suffix: &str) -> Credential {
        Credential {
            user_id: format!("uid_{suffix}"),
            access_token: format!("at_{suffix}"),
            refresh_token: format!("rt_{suffix}"),
        }
    }

    #[tokio::test]
    async fn cold_start_creates_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");

        assert!(!path.exists());
        let store = SessionStore::load(path.clone()).await.unwrap();
        assert_eq!(store.pending_states().await, 0);
        assert_eq!(store.stored_credentials().await, 0);
        assert!(path.exists());

        // The file must contain the full empty document, not just `{}`
        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert!(parsed["states"].as_object().unwrap().is_empty());
        assert!(parsed["tokens"].as_object().unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        tokio::fs::write(&path, "not json {{{{").await.unwrap();

        let result = SessionStore::load(path).await;
        assert!(matches!(result, Err(Error::StoreParse(_))));
    }

    #[tokio::test]
    async fn roundtrip_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");

        let store = SessionStore::load(path.clone()).await.unwrap();
        store
            .insert_state("a1b2c3d4e5f607".into(), "caller-1".into())
            .await
            .unwrap();
        store
            .insert_credential("caller-2".into(), test_credential("2"))
            .await
            .unwrap();

        // Load into a new store instance
        let store2 = SessionStore::load(path).await.unwrap();
        assert!(store2.contains_state("a1b2c3d4e5f607").await);
        let cred = store2.credential("caller-2").await.unwrap();
        assert_eq!(cred, test_credential("2"));
    }

    #[tokio::test]
    async fn take_state_is_single_use() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");

        let store = SessionStore::load(path.clone()).await.unwrap();
        store
            .insert_state("deadbeef001122".into(), "caller-x".into())
            .await
            .unwrap();

        let first = store.take_state("deadbeef001122").await.unwrap();
        assert_eq!(first.as_deref(), Some("caller-x"));

        let second = store.take_state("deadbeef001122").await.unwrap();
        assert!(second.is_none(), "a consumed state must stay gone");

        // The removal must already be on disk
        let store2 = SessionStore::load(path).await.unwrap();
        assert!(!store2.contains_state("deadbeef001122").await);
    }

    #[tokio::test]
    async fn take_unknown_state_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");

        let store = SessionStore::load(path).await.unwrap();
        let taken = store.take_state("00000000000000").await.unwrap();
        assert!(taken.is_none());
    }

    #[tokio::test]
    async fn later_credential_overwrites_earlier() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");

        let store = SessionStore::load(path).await.unwrap();
        store
            .insert_credential("caller-1".into(), test_credential("old"))
            .await
            .unwrap();
        store
            .insert_credential("caller-1".into(), test_credential("new"))
            .await
            .unwrap();

        assert_eq!(store.stored_credentials().await, 1);
        let cred = store.credential("caller-1").await.unwrap();
        assert_eq!(cred.access_token, "at_new");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn file_permissions_are_0600() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");

        let store = SessionStore::load(path.clone()).await.unwrap();
        store
            .insert_state("cafebabe000000".into(), "caller".into())
            .await
            .unwrap();

        let metadata = tokio::fs::metadata(&path).await.unwrap();
        let mode = metadata.permissions().mode() & 0o777;
        assert_eq!(mode, 0o600, "store file must be 0600, got {mode:o}");
    }

    #[tokio::test]
    async fn write_failure_surfaces_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("gone");
        tokio::fs::create_dir(&sub).await.unwrap();
        let path = sub.join("data.json");

        let store = SessionStore::load(path).await.unwrap();
        // With the parent directory gone the temp file can't be written
        tokio::fs::remove_dir_all(&sub).await.unwrap();

        let result = store
            .insert_state("a1b2c3d4e5f607".into(), "caller".into())
            .await;
        assert!(matches!(result, Err(Error::Io(_))));

        let result = store
            .insert_credential("caller".into(), test_credential("x"))
            .await;
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn concurrent_writes_dont_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        let store = std::sync::Arc::new(SessionStore::load(path.clone()).await.unwrap());

        let mut handles = vec![];
        for i in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .insert_state(format!("{i:014x}"), format!("caller-{i}"))
                    .await
                    .unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(store.pending_states().await, 10);

        // File must still be a valid document with all entries
        let store2 = SessionStore::load(path).await.unwrap();
        assert_eq!(store2.pending_states().await, 10);
    }
}
