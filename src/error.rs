//! Error types for the HA configuration registry
//!
//! Provides structured error types for configuration loading, key-path
//! lookups, the distributed KV client, node resolution, and logging setup.

use std::sync::Arc;
use thiserror::Error;

/// Unified error type for the registry and node directory
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // Config Source Errors
    // =========================================================================
    #[error("Failed to load config index {index} from {url}: {reason}")]
    ConfigLoad {
        index: String,
        url: String,
        reason: String,
    },

    #[error("Unsupported config source URL: {url}")]
    UnsupportedScheme { url: String },

    #[error("Config index already loaded: {index}")]
    IndexAlreadyLoaded { index: String },

    #[error("Config index not loaded: {index}")]
    IndexNotLoaded { index: String },

    #[error("Config key not found: {index}/{key}")]
    KeyNotFound { index: String, key: String },

    #[error("Invalid value for config key {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Invalid KV endpoint: {0}")]
    InvalidEndpoint(String),

    // =========================================================================
    // KV Store Errors
    // =========================================================================
    #[error("KV key not found: {key}")]
    KvKeyNotFound { key: String },

    #[error("KV request error: {0}")]
    KvRequest(#[from] reqwest::Error),

    #[error("KV request failed with status {status}: {body}")]
    KvResponse { status: u16, body: String },

    #[error("KV value decode error: {0}")]
    KvDecode(String),

    /// Failure of a coalesced KV request, shared by every waiting caller
    #[error(transparent)]
    Shared(Arc<Error>),

    // =========================================================================
    // Node Directory Errors
    // =========================================================================
    #[error("node_id {node_id} is not valid")]
    InvalidNode { node_id: String },

    // =========================================================================
    // Logging Errors
    // =========================================================================
    #[error("Logging initialization failed: {0}")]
    Logging(String),

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if this error means the requested key, index or path is absent
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::KeyNotFound { .. } | Error::IndexNotLoaded { .. } | Error::KvKeyNotFound { .. } => {
                true
            }
            Error::Shared(inner) => inner.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error is transient
    ///
    /// Callers own the retry policy; nothing in this crate retries.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::KvRequest(_) => true,
            Error::KvResponse { status, .. } => *status >= 500,
            Error::Shared(inner) => inner.is_transient(),
            _ => false,
        }
    }
}

/// Result type alias for the registry
pub type Result<T> = std::result::Result<T, Error>;
