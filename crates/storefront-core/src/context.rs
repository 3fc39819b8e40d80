//! Request-scoped identity.

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

use crate::error::StoreError;

/// Unique id attached to every request, UUID v7 so ids sort by time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generates a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Why the authenticated user could not be read from a request.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// No authentication stage ran, or it did not attach a user.
    #[error("no authenticated user on request")]
    Missing,

    /// The verified subject is not a user UUID.
    #[error("subject '{subject}' is not a valid user id")]
    Malformed {
        /// Subject as returned by the identity provider.
        subject: String,
        /// Parse failure.
        #[source]
        source: uuid::Error,
    },
}

impl From<IdentityError> for StoreError {
    fn from(err: IdentityError) -> Self {
        StoreError::unauthorized(err.to_string())
    }
}

/// The user verified by the authentication stage.
///
/// The subject is kept as issued; [`AuthenticatedUser::user_id`] parses it
/// on demand so each caller decides how to treat a non-UUID subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    subject: String,
}

impl AuthenticatedUser {
    /// Wraps a verified subject.
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }

    /// Returns the raw subject.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Parses the subject as a user UUID.
    pub fn user_id(&self) -> Result<Uuid, IdentityError> {
        Uuid::parse_str(&self.subject).map_err(|source| IdentityError::Malformed {
            subject: self.subject.clone(),
            source,
        })
    }
}
