//! Error taxonomy shared by the controller, collaborators and handlers.
//!
//! Every [`StoreError`] belongs to an [`ErrorKind`] with a default HTTP
//! status:
//!
//! | Kind | Status |
//! |---|---|
//! | `Decode` | 400 |
//! | `Validation` | 400 |
//! | `Unauthorized` | 401 |
//! | `NotFound` | 404 |
//! | `MethodNotAllowed` | 405 |
//! | `AlreadyExists` | 409 |
//! | `Internal` | 500 |
//!
//! Client-facing text comes from [`StoreError::public_message`], which
//! never leaks the detail of an internal failure.

use std::collections::BTreeMap;
use std::fmt;

use http::StatusCode;
use serde::Serialize;
use thiserror::Error;

use crate::model::OrderStatus;

/// Result alias using [`StoreError`].
pub type StoreResult<T> = Result<T, StoreError>;

/// Marker sent to clients in place of internal error detail.
pub const INTERNAL_ERROR_MESSAGE: &str = "internal error";

/// Classification of a [`StoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Request body could not be decoded.
    Decode,
    /// A domain rule rejected the input.
    Validation,
    /// Missing or invalid credential.
    Unauthorized,
    /// The addressed entity does not exist.
    NotFound,
    /// The method is not accepted on this path.
    MethodNotAllowed,
    /// A uniqueness constraint was violated.
    AlreadyExists,
    /// Anything else.
    Internal,
}

impl ErrorKind {
    /// Returns the HTTP status for this kind.
    #[must_use]
    pub const fn status_code(self) -> StatusCode {
        match self {
            Self::Decode | Self::Validation => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::AlreadyExists => StatusCode::CONFLICT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Errors produced while serving a catalog or order request.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Malformed request body.
    #[error("invalid request body: {message}")]
    Decode {
        /// Decoder message.
        message: String,
    },

    /// Domain validation failed.
    #[error("validation failed: {field_errors}")]
    Validation {
        /// Messages per offending field.
        field_errors: FieldErrors,
    },

    /// Path identifier that does not parse.
    #[error("invalid {resource} id '{value}'")]
    InvalidId {
        /// Entity type, e.g. `order`.
        resource: &'static str,
        /// Raw path text.
        value: String,
    },

    /// Credential missing, rejected or unusable.
    #[error("unauthorized: {message}")]
    Unauthorized {
        /// What was wrong with the credential.
        message: String,
    },

    /// Entity absent.
    #[error("{resource} '{id}' not found")]
    NotFound {
        /// Entity type, e.g. `category`.
        resource: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// Method rejected on a known path.
    #[error("method not allowed")]
    MethodNotAllowed,

    /// Uniqueness conflict.
    #[error("{resource} '{id}' already exists")]
    AlreadyExists {
        /// Entity type.
        resource: &'static str,
        /// Conflicting identifier.
        id: String,
    },

    /// Order state machine violation.
    #[error("order cannot move from {from} to {to}")]
    InvalidTransition {
        /// Current state.
        from: OrderStatus,
        /// Requested state.
        to: OrderStatus,
    },

    /// Unclassified failure. Only logged, never shown to clients.
    #[error("internal error: {message}")]
    Internal {
        /// Detail for logs.
        message: String,
        /// Underlying cause.
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl StoreError {
    /// Creates a decode error from any displayable decoder failure.
    pub fn decode(err: impl fmt::Display) -> Self {
        Self::Decode {
            message: err.to_string(),
        }
    }

    /// Creates a validation error. An empty set still counts as a failure.
    #[must_use]
    pub fn validation(field_errors: FieldErrors) -> Self {
        Self::Validation { field_errors }
    }

    /// Creates an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a not-found error.
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Creates an already-exists error.
    pub fn already_exists(resource: &'static str, id: impl ToString) -> Self {
        Self::AlreadyExists {
            resource,
            id: id.to_string(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error wrapping a cause.
    pub fn internal_with_source(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates an [`InvalidId`](Self::InvalidId) error.
    pub fn invalid_id(resource: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidId {
            resource,
            value: value.into(),
        }
    }

    /// Returns the classification.
    ///
    /// State machine violations are not a client-actionable kind of their
    /// own and classify as internal.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Decode { .. } | Self::InvalidId { .. } => ErrorKind::Decode,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::MethodNotAllowed => ErrorKind::MethodNotAllowed,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::InvalidTransition { .. } | Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Returns the default HTTP status.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.kind().status_code()
    }

    /// Returns text that is safe to send to a client.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Internal => INTERNAL_ERROR_MESSAGE.to_string(),
            _ => self.to_string(),
        }
    }

    /// Returns true for a not-found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Validation messages keyed by field path, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a message for `field`.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the messages recorded for `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    /// Converts to `Err(StoreError::Validation)` if anything was recorded.
    pub fn into_result(self) -> StoreResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(StoreError::validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.fields {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}
