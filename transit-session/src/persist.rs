use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tracing::{debug, warn};
use transit_config::AuthConfig;

use crate::error::SessionError;
use crate::store::{SessionIdentity, SessionProvider, SessionSnapshot};

/// Durable string storage for session keys, the browser-storage equivalent.
pub trait KeyStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError>;
    fn set(&self, key: &str, value: &str) -> Result<(), SessionError>;
    fn remove(&self, key: &str) -> Result<(), SessionError>;
}

/// Key store that lives only as long as the process
#[derive(Debug, Default)]
pub struct MemoryKeyStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyStore for MemoryKeyStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.entries().remove(key);
        Ok(())
    }
}

/// Key store persisted as a JSON object in a single file.
#[derive(Debug)]
pub struct FileKeyStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileKeyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Open the file named by [`AuthConfig::session_file_path`].
    pub fn from_config(config: &AuthConfig) -> Result<Self, SessionError> {
        config
            .session_file_path()
            .map(Self::new)
            .ok_or(SessionError::NoLocation)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<BTreeMap<String, String>, SessionError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write(&self, entries: &BTreeMap<String, String>) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }

    fn update(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, String>) -> bool,
    ) -> Result<(), SessionError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.read()?;
        if f(&mut entries) {
            self.write(&entries)?;
        }
        Ok(())
    }
}

impl KeyStore for FileKeyStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.read()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.update(|entries| entries.remove(key).is_some())
    }
}

/// A session whose token and identity survive restarts.
///
/// Clearing it empties the in-memory session and deletes every configured
/// persisted key, so a stale identity cannot be read back.
pub struct PersistentSession {
    session: Arc<dyn SessionProvider>,
    store: Arc<dyn KeyStore>,
    token_key: String,
    identity_key: String,
    keys: Vec<String>,
}

impl PersistentSession {
    pub fn new(
        session: Arc<dyn SessionProvider>,
        store: Arc<dyn KeyStore>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            session,
            store,
            token_key: config.token_key.clone(),
            identity_key: config.identity_key.clone(),
            keys: config.all_persisted_keys(),
        }
    }

    /// Store a freshly issued token (and optional profile) and make it current.
    pub fn login(
        &self,
        token: &str,
        identity: Option<SessionIdentity>,
    ) -> Result<(), SessionError> {
        self.store.set(&self.token_key, token)?;
        match &identity {
            Some(identity) => self
                .store
                .set(&self.identity_key, &serde_json::to_string(identity)?)?,
            None => self.store.remove(&self.identity_key)?,
        }

        self.session.replace(SessionSnapshot {
            token: Some(Arc::from(token)),
            identity: identity.map(Arc::new),
        });
        debug!("session started");
        Ok(())
    }

    /// Load the persisted token and identity into the session.
    pub fn restore(&self) -> Result<SessionSnapshot, SessionError> {
        let token = self.store.get(&self.token_key)?;
        let identity = match self.store.get(&self.identity_key)? {
            Some(raw) => Some(serde_json::from_str::<SessionIdentity>(&raw)?),
            None => None,
        };

        let snapshot = SessionSnapshot {
            token: token.map(Arc::from),
            identity: identity.map(Arc::new),
        };
        self.session.replace(snapshot.clone());
        Ok(snapshot)
    }

    /// Clear the session and remove every persisted key.
    ///
    /// The in-memory session is cleared first. Every key removal is attempted
    /// even if an earlier one fails; the first failure is returned.
    pub fn try_clear(&self) -> Result<(), SessionError> {
        self.session.clear();

        let mut first_error = None;
        for key in &self.keys {
            if let Err(e) = self.store.remove(key) {
                warn!(key = key.as_str(), error = %e, "failed to remove persisted session key");
                first_error.get_or_insert(e);
            }
        }
        debug!(keys = self.keys.len(), "session cleared");
        first_error.map_or(Ok(()), Err)
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn store(&self) -> &Arc<dyn KeyStore> {
        &self.store
    }
}

impl SessionProvider for PersistentSession {
    fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    fn replace(&self, snapshot: SessionSnapshot) {
        self.session.replace(snapshot)
    }

    fn modify(&self, f: &mut dyn FnMut(&mut SessionSnapshot)) {
        self.session.modify(f)
    }

    fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.session.subscribe()
    }

    fn clear(&self) {
        // failures are already logged per key
        let _ = self.try_clear();
    }
}
