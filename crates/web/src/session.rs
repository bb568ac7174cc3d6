//! Server-side sessions keyed by an opaque cookie token.
//!
//! Lookups refresh the last-access time, so every read is a write for
//! locking purposes — the store takes a single mutex around all operations.
//! Idle sessions are evicted by [`SessionStore::sweep_expired`].

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime};

use thiserror::Error;
use tracing::debug;

pub const SESSION_ID_LEN: usize = 63;
pub const DEFAULT_SESSION_CAPACITY: usize = 1024;
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(3600);

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("session store is full (capacity {capacity})")]
    CapacityExceeded { capacity: usize },

    #[error("session not found")]
    NotFound,
}

/// One session record. `data` is an opaque payload the application manages,
/// conventionally a JSON document.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    user_id: String,
    created_at: SystemTime,
    last_access: Instant,
    data: String,
    authenticated: bool,
}

impl Session {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn authenticated(&self) -> bool {
        self.authenticated
    }
}

/// Keyed session store with bounded capacity and idle expiry.
#[derive(Debug)]
pub struct SessionStore {
    inner: Mutex<HashMap<String, Session>>,
    capacity: usize,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_settings(DEFAULT_SESSION_CAPACITY, DEFAULT_IDLE_TIMEOUT)
    }

    pub fn with_settings(capacity: usize, idle_timeout: Duration) -> Self {
        Self { inner: Mutex::new(HashMap::new()), capacity, idle_timeout }
    }

    /// Creates a session, returning its id. A session created with a user id
    /// starts out authenticated.
    pub fn create(&self, user_id: Option<&str>) -> Result<String, SessionError> {
        let mut sessions = self.locked();
        if sessions.len() >= self.capacity {
            return Err(SessionError::CapacityExceeded { capacity: self.capacity });
        }

        let id = crate::security::random_token(SESSION_ID_LEN);
        let session = Session {
            id: id.clone(),
            user_id: user_id.unwrap_or_default().to_string(),
            created_at: SystemTime::now(),
            last_access: Instant::now(),
            data: String::new(),
            authenticated: user_id.is_some(),
        };
        debug!(user_id = session.user_id, "session created");
        sessions.insert(id.clone(), session);
        Ok(id)
    }

    /// Looks up a session, refreshing its last-access time.
    pub fn get(&self, session_id: &str) -> Option<Session> {
        let mut sessions = self.locked();
        let session = sessions.get_mut(session_id)?;
        session.last_access = Instant::now();
        Some(session.clone())
    }

    /// Replaces the session payload, refreshing its last-access time.
    pub fn update(&self, session_id: &str, data: &str) -> Result<(), SessionError> {
        let mut sessions = self.locked();
        let session = sessions.get_mut(session_id).ok_or(SessionError::NotFound)?;
        session.data = data.to_string();
        session.last_access = Instant::now();
        Ok(())
    }

    pub fn destroy(&self, session_id: &str) -> Result<(), SessionError> {
        let mut sessions = self.locked();
        match sessions.remove(session_id) {
            Some(_) => {
                debug!("session destroyed");
                Ok(())
            }
            None => Err(SessionError::NotFound),
        }
    }

    /// Evicts sessions idle longer than the configured timeout, returning
    /// the number removed.
    pub fn sweep_expired(&self) -> usize {
        let mut sessions = self.locked();
        let before = sessions.len();
        let idle_timeout = self.idle_timeout;
        sessions.retain(|_, session| session.last_access.elapsed() <= idle_timeout);
        let swept = before - sessions.len();
        if swept > 0 {
            debug!(swept, "expired sessions removed");
        }
        swept
    }

    pub fn len(&self) -> usize {
        self.locked().len()
    }

    pub fn is_empty(&self) -> bool {
        self.locked().is_empty()
    }

    fn locked(&self) -> std::sync::MutexGuard<'_, HashMap<String, Session>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
