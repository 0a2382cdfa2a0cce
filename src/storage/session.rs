use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Usuario;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to access session file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse session: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Session store lock poisoned")]
    Poisoned,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub usuario: Usuario,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// An `expires_in_seconds` too large to represent leaves the session
    /// without a local expiry.
    pub fn new(token: String, usuario: Usuario, expires_in_seconds: Option<i64>) -> Self {
        let expires_at = expires_in_seconds.and_then(|s| {
            let at = TimeDelta::try_seconds(s).and_then(|delta| Utc::now().checked_add_signed(delta));
            if at.is_none() {
                tracing::warn!("Ignoring out-of-range session expiry: {}s", s);
            }
            at
        });

        Self {
            token,
            usuario,
            expires_at,
        }
    }

    /// Sessions without an expiry never time out locally.
    pub fn is_valid(&self) -> bool {
        !self.token.is_empty() && self.expires_at.is_none_or(|at| at > Utc::now())
    }
}

/// Where the logged-in user and token live between calls.
pub trait SessionStore: Send + Sync {
    fn get(&self) -> Result<Option<Session>, SessionError>;
    fn set(&self, session: &Session) -> Result<(), SessionError>;
    fn clear(&self) -> Result<(), SessionError>;
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> Result<Option<Session>, SessionError> {
        let guard = self.session.lock().map_err(|_| SessionError::Poisoned)?;
        Ok(guard.clone())
    }

    fn set(&self, session: &Session) -> Result<(), SessionError> {
        let mut guard = self.session.lock().map_err(|_| SessionError::Poisoned)?;
        *guard = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        let mut guard = self.session.lock().map_err(|_| SessionError::Poisoned)?;
        *guard = None;
        Ok(())
    }
}

pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self) -> Result<Option<Session>, SessionError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        let session: Session = serde_json::from_str(&content)?;
        Ok(Some(session))
    }

    fn set(&self, session: &Session) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
