//! Server error types.

use std::net::SocketAddr;

use thiserror::Error;

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listen address does not parse.
    #[error(transparent)]
    Config(#[from] storefront_config::ConfigError),

    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: SocketAddr,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Other socket failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
