//! Single-user login and the session gate in front of the tracker routes.

mod router;

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::config::AuthConfig;

pub use router::{auth_router, protect, require_session, LoginRequest, SESSION_COOKIE};

/// The one username/password pair the tracker accepts.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn verify(&self, username: &str, password: &str) -> bool {
        // Evaluate both comparisons so timing does not reveal which one failed.
        let username_ok = constant_time_eq(self.username.as_bytes(), username.as_bytes());
        let password_ok = constant_time_eq(self.password.as_bytes(), password.as_bytes());
        username_ok & password_ok
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

fn constant_time_eq(expected: &[u8], candidate: &[u8]) -> bool {
    if expected.len() != candidate.len() {
        return false;
    }
    expected
        .iter()
        .zip(candidate)
        .fold(0u8, |acc, (left, right)| acc | (left ^ right))
        == 0
}

/// Server-side session tokens with a fixed lifetime.
#[derive(Debug)]
pub struct SessionStore {
    ttl: Duration,
    sessions: Mutex<HashMap<String, Instant>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Creates a new session and returns its token.
    pub fn issue(&self) -> String {
        let token = Uuid::new_v4().simple().to_string();
        let now = Instant::now();
        let mut sessions = self.lock();
        sessions.retain(|_, expires_at| *expires_at > now);
        sessions.insert(token.clone(), now + self.ttl);
        token
    }

    /// True when the token names a live session. Expired tokens are dropped.
    pub fn is_valid(&self, token: &str) -> bool {
        let mut sessions = self.lock();
        match sessions.get(token) {
            Some(expires_at) if *expires_at > Instant::now() => true,
            Some(_) => {
                sessions.remove(token);
                false
            }
            None => false,
        }
    }

    pub fn revoke(&self, token: &str) -> bool {
        self.lock().remove(token).is_some()
    }

    pub fn active(&self) -> usize {
        let now = Instant::now();
        self.lock()
            .values()
            .filter(|expires_at| **expires_at > now)
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Instant>> {
        // The map holds no invariants a panicking holder could break.
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Shared state for the login routes and the session middleware.
#[derive(Debug)]
pub struct AuthState {
    pub credentials: Credentials,
    pub sessions: SessionStore,
}

impl AuthState {
    pub fn new(credentials: Credentials, session_ttl: Duration) -> Self {
        Self {
            credentials,
            sessions: SessionStore::new(session_ttl),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            Credentials::new(config.username.clone(), config.password.clone()),
            config.session_ttl,
        )
    }
}
