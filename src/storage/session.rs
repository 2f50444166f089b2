//! Persistence of the admin session.
//!
//! The session is a small JSON object on disk with two entries: a boolean
//! login flag and the admin user object. Both must be present and valid for
//! the session to count; anything else is treated as signed out.

use std::{fs, io, path::PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize as _;
use serde_json::{Map, Value, json};

use crate::domain::{AdminUser, Session};

const LOGGED_IN_KEY: &str = "admin_logged_in";
const USER_KEY: &str = "admin_user";
const SIGNED_IN_AT_KEY: &str = "admin_signed_in_at";

/// Errors accessing the session file.
#[derive(Debug, thiserror::Error)]
#[error("failed to access session file {path}")]
pub struct SessionError {
    path: PathBuf,
    #[source]
    source: io::Error,
}

/// Reads and writes the admin session file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// A store backed by the file at `path`.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Records a signed-in session.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, session: &Session) -> Result<(), SessionError> {
        let mut entries = self.read()?;
        entries.insert(LOGGED_IN_KEY.to_string(), Value::Bool(true));
        entries.insert(USER_KEY.to_string(), json!(session.user));
        entries.insert(
            SIGNED_IN_AT_KEY.to_string(),
            Value::String(session.started_at.to_rfc3339()),
        );
        self.write(&entries)
    }

    /// The current session, if there is a valid one.
    ///
    /// # Errors
    ///
    /// Returns an error only if the file exists but cannot be read.
    pub fn current(&self) -> Result<Option<Session>, SessionError> {
        let entries = self.read()?;

        if entries.get(LOGGED_IN_KEY) != Some(&Value::Bool(true)) {
            return Ok(None);
        }
        let Some(user) = entries.get(USER_KEY) else {
            return Ok(None);
        };
        let user = match AdminUser::deserialize(user) {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!("ignoring malformed admin session: {e}");
                return Ok(None);
            }
        };
        let started_at = entries
            .get(SIGNED_IN_AT_KEY)
            .and_then(Value::as_str)
            .and_then(|value| DateTime::parse_from_rfc3339(value).ok())
            .map_or_else(Utc::now, |value| value.with_timezone(&Utc));

        Ok(Some(Session { user, started_at }))
    }

    /// Signs out, removing the session entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn clear(&self) -> Result<(), SessionError> {
        let mut entries = self.read()?;
        let before = entries.len();
        entries.remove(LOGGED_IN_KEY);
        entries.remove(USER_KEY);
        entries.remove(SIGNED_IN_AT_KEY);
        if entries.len() == before {
            return Ok(());
        }
        self.write(&entries)
    }

    fn read(&self) -> Result<Map<String, Value>, SessionError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("session file is corrupt, starting over: {e}");
                Map::new()
            })),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Map::new()),
            Err(source) => Err(self.error(source)),
        }
    }

    fn write(&self, entries: &Map<String, Value>) -> Result<(), SessionError> {
        let content = serde_json::to_vec_pretty(entries)
            .map_err(|e| self.error(io::Error::other(e)))?;
        super::write_file(&self.path, &content).map_err(|e| self.error(e))
    }

    fn error(&self, source: io::Error) -> SessionError {
        SessionError {
            path: self.path.clone(),
            source,
        }
    }
}
