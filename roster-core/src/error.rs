//! Error types for roster registries.
//!
//! A single `thiserror` hierarchy shared by the authoritative registries,
//! the caching decorator and the CLI.

use thiserror::Error;

use crate::types::NodeList;

/// Result type alias using `RegistryError`.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Main error type for all registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    // ═══════════════════════════════════════════════════════════════════════════
    // NODE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Node is not registered.
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// Node identifier failed validation.
    #[error("Invalid node id: {0}")]
    InvalidNodeId(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // DELEGATE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The authoritative registry could not be reached or refused the call.
    #[error("Registry unavailable: {0}")]
    Unavailable(String),

    /// A snapshot refresh failed; `stale` is the last-known-good listing.
    #[error("Snapshot refresh failed (serving {} cached nodes): {source}", .stale.len())]
    RefreshFailed {
        /// Snapshot that was current when the refresh failed.
        stale: NodeList,
        /// Error reported by the authoritative registry.
        #[source]
        source: Box<RegistryError>,
    },

    // ═══════════════════════════════════════════════════════════════════════════
    // CONFIGURATION & I/O ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// File I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Internal invariant violation (should never happen).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl RegistryError {
    /// Returns true if this error is recoverable (can retry).
    pub fn is_recoverable(&self) -> bool {
        match self {
            RegistryError::Unavailable(_) => true,
            RegistryError::RefreshFailed { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }

    /// Returns true if the node does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::NodeNotFound(_))
    }

    /// Returns the last-known-good snapshot carried by a failed refresh.
    pub fn stale_nodes(&self) -> Option<&NodeList> {
        match self {
            RegistryError::RefreshFailed { stale, .. } => Some(stale),
            _ => None,
        }
    }

    /// Consumes the error, yielding the stale snapshot if there is one.
    pub fn into_stale_nodes(self) -> Option<NodeList> {
        match self {
            RegistryError::RefreshFailed { stale, .. } => Some(stale),
            _ => None,
        }
    }
}
