//! Admin authentication.
//!
//! Authentication sits behind the [`Authenticator`] trait so that the
//! single configured admin account can later be replaced by a real identity
//! provider without touching the callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A username and password pair as entered at the login prompt.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Username.
    pub username: String,
    /// Password, in clear text for the lifetime of the login attempt only.
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The signed-in administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Contact address.
    pub email: String,
}

/// An authenticated admin session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Who is signed in.
    pub user: AdminUser,
    /// When the session started.
    pub started_at: DateTime<Utc>,
}

/// Errors from an authentication attempt.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    /// Username or password did not match.
    #[error("Invalid username or password")]
    InvalidCredentials,
    /// No admin account has been configured.
    #[error("no admin account is configured; run `gift init --admin <username>` first")]
    NotConfigured,
}

/// Something that can turn credentials into a session.
pub trait Authenticator {
    /// Checks the credentials.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] if the credentials are rejected.
    fn authenticate(&self, credentials: &Credentials) -> Result<Session, AuthError>;
}

/// Computes the stored digest for a username and password.
///
/// The username is mixed in so that two accounts sharing a password do not
/// share a digest.
#[must_use]
pub fn password_digest(username: &str, password: &str) -> String {
    let hash = Sha256::digest(format!("{username}:{password}").as_bytes());
    format!("{hash:x}")
}

/// Authenticates a single account against a SHA-256 digest.
#[derive(Debug, Clone)]
pub struct DigestAuthenticator {
    username: String,
    password_sha256: String,
    user: AdminUser,
}

impl DigestAuthenticator {
    /// Creates an authenticator for one account.
    #[must_use]
    pub fn new(username: String, password_sha256: String, user: AdminUser) -> Self {
        Self {
            username,
            password_sha256: password_sha256.to_ascii_lowercase(),
            user,
        }
    }
}

impl Authenticator for DigestAuthenticator {
    fn authenticate(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        if self.password_sha256.is_empty() {
            return Err(AuthError::NotConfigured);
        }
        let digest = password_digest(&credentials.username, &credentials.password);
        if credentials.username == self.username && digest == self.password_sha256 {
            tracing::info!(user = %self.user.name, "admin signed in");
            Ok(Session {
                user: self.user.clone(),
                started_at: Utc::now(),
            })
        } else {
            tracing::warn!(username = %credentials.username, "rejected admin sign-in");
            Err(AuthError::InvalidCredentials)
        }
    }
}
