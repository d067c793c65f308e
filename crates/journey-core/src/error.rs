//! Error types for Journey Core
//!
//! Three failure classes reach the user:
//! - Configuration absent (no gateway credentials)
//! - Gateway read/write failures, surfaced verbatim
//! - Required-field validation, checked before any gateway call

use crate::gateway::Collection;

/// Persistence gateway errors
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Transport-level failure (connection, timeout, TLS)
    #[error("request failed: {0}")]
    Transport(String),

    /// The store rejected the request
    #[error("{message}")]
    Rejected {
        /// HTTP-like status, when the backend has one
        status: Option<u16>,
        /// Error text as reported by the store
        message: String,
    },

    /// Unique constraint violated
    #[error("duplicate key value violates unique constraint on {collection}")]
    Conflict { collection: Collection },

    /// Foreign key points at a missing row
    #[error("{collection}.{column} references missing row {value}")]
    ForeignKey {
        collection: Collection,
        column: &'static str,
        value: String,
    },

    /// No row with that id
    #[error("no {collection} row with id {id}")]
    NotFound { collection: Collection, id: String },

    /// Collection does not accept writes
    #[error("{0} is read-only")]
    ReadOnly(Collection),

    /// A returned row could not be decoded into its typed shape
    #[error("malformed {collection} row: {message}")]
    Decode {
        collection: Collection,
        message: String,
    },
}

impl GatewayError {
    /// Decode failure for a collection
    #[inline]
    pub fn decode(collection: Collection, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            collection,
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Journey operation errors
#[derive(Debug, thiserror::Error)]
pub enum JourneyError {
    /// Gateway credentials are missing; nothing was written
    #[error("persistence gateway is not configured")]
    NotConfigured,

    /// Required field was empty
    #[error("{field} is required")]
    Validation { field: &'static str },

    /// Gateway call failed
    #[error("{operation} failed: {source}")]
    Gateway {
        /// Operation label shown to the user
        operation: &'static str,
        #[source]
        source: GatewayError,
    },

    /// Target entity is not in the current tree
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    /// Editor action without an open editor
    #[error("no editor is open")]
    NoActiveEditor,
}

impl JourneyError {
    /// Wrap a gateway error with the operation label
    #[inline]
    pub fn gateway(operation: &'static str, source: GatewayError) -> Self {
        Self::Gateway { operation, source }
    }

    /// Check if error is a required-field rejection
    #[inline]
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Check if error comes from missing configuration
    #[inline]
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::NotConfigured)
    }

    /// Check if error was raised by the gateway
    #[inline]
    #[must_use]
    pub fn is_gateway(&self) -> bool {
        matches!(self, Self::Gateway { .. })
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// File is not valid TOML for the config shape
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Gateway URL is not a valid base URL
    #[error("invalid gateway url {url}: {message}")]
    InvalidUrl { url: String, message: String },
}
