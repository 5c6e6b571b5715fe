use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::Role;

// ─── Session ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user_name: String,
    pub role: Role,
    pub message: Option<String>,
    pub logged_in_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_name: &str, role: Role, message: Option<String>, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            user_name: user_name.to_string(),
            role,
            message,
            logged_in_at: now,
            expires_at: now + lifetime,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Where the current session lives between runs.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn default_location() -> Result<Self> {
        let path = dirs::cache_dir()
            .map(|d| d.join("kind-hearts").join("session.json"))
            .ok_or_else(|| anyhow!("Could not determine cache directory"))?;
        Ok(Self::at(path))
    }

    /// A missing, unreadable or expired session loads as `None`. Expired
    /// sessions are removed from disk.
    pub fn load(&self) -> Option<Session> {
        let contents = std::fs::read_to_string(&self.path).ok()?;
        let session: Session = match serde_json::from_str(&contents) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable session file");
                return None;
            }
        };
        if session.is_expired(Utc::now()) {
            tracing::info!(user = %session.user_name, "session expired");
            self.clear();
            return None;
        }
        Some(session)
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    pub fn clear(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(error = %e, "could not remove session file"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn store() -> (tempfile::TempDir, SessionStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path().join("nested").join("session.json"));
        (dir, store)
    }

    #[test]
    fn round_trips_through_disk() {
        let (_dir, store) = store();
        assert!(store.load().is_none());

        let session = Session::new("emily", Role::Student, Some("hi".into()), Duration::hours(12));
        store.save(&session).unwrap();
        assert_eq!(store.load(), Some(session));
    }

    #[test]
    fn expired_session_is_dropped_and_deleted() {
        let (_dir, store) = store();
        let session = Session::new("emily", Role::Teacher, None, Duration::seconds(-1));
        store.save(&session).unwrap();

        assert!(store.load().is_none());
        assert!(!store.path.exists());
    }

    #[test]
    fn clear_is_idempotent() {
        let (_dir, store) = store();
        store
            .save(&Session::new("a", Role::Student, None, Duration::hours(1)))
            .unwrap();
        store.clear();
        store.clear();
        assert!(store.load().is_none());
    }

    #[test]
    fn garbage_file_loads_as_none() {
        let (_dir, store) = store();
        std::fs::create_dir_all(store.path.parent().unwrap()).unwrap();
        std::fs::write(&store.path, "{ not json").unwrap();
        assert!(store.load().is_none());
    }
}
