//! Tab-scoped persisted key/value state.
//!
//! `SessionStorage` is the raw backend; `SessionStore` gives typed access to
//! the four keys the client uses.

use chat_core::local::{
    AUTH_TOKEN_KEY, LAST_ACTIVITY_KEY, SESSION_ID_KEY, SESSION_SCOPED_KEYS, TICKET_ID_KEY,
};
use chat_core::{Error, LocalSessionState, Result, SessionId, TicketId};
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Raw string key/value storage.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Storage that lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.entries.write().clear();
        Ok(())
    }
}

/// Storage persisted as a JSON object.
///
/// Every write replaces the file through a temp file and a rename, so a
/// crash leaves either the old or the new contents.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open `path`, starting empty when it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                Error::internal(format!("corrupt storage file {}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(Error::internal(format!(
                    "failed to read storage file {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        debug!(path = %path.display(), keys = entries.len(), "Opened storage file");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let io_err = |e: std::io::Error| {
            Error::internal(format!("failed to write storage file {}: {}", self.path.display(), e))
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let tmp = self.path.with_extension("tmp");
        let content = serde_json::to_vec_pretty(entries)?;
        {
            let mut file = fs::File::create(&tmp).map_err(io_err)?;
            file.write_all(&content).map_err(io_err)?;
            file.sync_all().map_err(io_err)?;
        }
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let mut entries = self.entries.lock();
        let mut next = entries.clone();
        f(&mut next);
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|entries| {
            entries.remove(key);
        })
    }

    fn clear(&self) -> Result<()> {
        self.update(|entries| entries.clear())
    }
}

/// Typed view over the persisted local state.
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn SessionStorage>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn SessionStorage>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    pub fn auth_token(&self) -> Option<String> {
        self.backend.get(AUTH_TOKEN_KEY)
    }

    pub fn set_auth_token(&self, token: &str) -> Result<()> {
        self.backend.set(AUTH_TOKEN_KEY, token)
    }

    /// Last activity, or `None` when absent or unreadable.
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        let raw = self.backend.get(LAST_ACTIVITY_KEY)?;
        match raw.parse::<i64>() {
            Ok(millis) => Utc.timestamp_millis_opt(millis).single(),
            Err(_) => {
                warn!(value = %raw, "Ignoring unreadable lastActivity");
                None
            }
        }
    }

    pub fn set_last_activity(&self, at: DateTime<Utc>) -> Result<()> {
        self.backend
            .set(LAST_ACTIVITY_KEY, &at.timestamp_millis().to_string())
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.backend
            .get(SESSION_ID_KEY)
            .filter(|s| !s.is_empty())
            .map(SessionId::new)
    }

    pub fn set_session_id(&self, id: &SessionId) -> Result<()> {
        self.backend.set(SESSION_ID_KEY, id.as_str())
    }

    pub fn remove_session_id(&self) -> Result<()> {
        self.backend.remove(SESSION_ID_KEY)
    }

    pub fn ticket_id(&self) -> Option<TicketId> {
        self.backend
            .get(TICKET_ID_KEY)
            .filter(|s| !s.is_empty())
            .map(TicketId::new)
    }

    pub fn set_ticket_id(&self, id: &TicketId) -> Result<()> {
        self.backend.set(TICKET_ID_KEY, id.as_str())
    }

    /// Forget the current session and its ticket; the login survives.
    pub fn clear_session_keys(&self) -> Result<()> {
        for key in SESSION_SCOPED_KEYS {
            self.backend.remove(key)?;
        }
        Ok(())
    }

    /// Forget everything.
    pub fn clear(&self) -> Result<()> {
        self.backend.clear()
    }

    pub fn snapshot(&self) -> LocalSessionState {
        LocalSessionState {
            session_id: self.session_id(),
            ticket_id: self.ticket_id(),
            last_activity: self.last_activity(),
            auth_token: self.auth_token(),
        }
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("session_id", &self.session_id())
            .field("has_token", &self.auth_token().is_some())
            .finish()
    }
}
