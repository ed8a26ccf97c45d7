//! Node error types.

use strongbox_common::{ErrorReport, VaultError};
use thiserror::Error;

/// Errors that can occur while handling a request on the node.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Node is not in the running state.
    #[error("Node not accepting requests")]
    NotAccepting,

    /// The ledger rejected the call.
    #[error(transparent)]
    Vault(#[from] VaultError),

    /// A repeated request whose original attempt was rejected.
    #[error("Request previously rejected: {}", .0.message)]
    Replayed(ErrorReport),

    /// Ledger task failed to complete.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl NodeError {
    /// Get error code for protocol messages.
    pub fn error_code(&self) -> &str {
        match self {
            NodeError::NotAccepting => "NODE_NOT_ACCEPTING",
            NodeError::Vault(e) => e.error_code(),
            NodeError::Replayed(report) => &report.code,
            NodeError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            NodeError::NotAccepting => true,
            NodeError::Vault(e) => e.is_retryable(),
            NodeError::Replayed(_) | NodeError::Internal(_) => false,
        }
    }

    /// Render as a wire-friendly report.
    pub fn report(&self) -> ErrorReport {
        match self {
            NodeError::Replayed(report) => report.clone(),
            other => ErrorReport::new(other.error_code(), other.to_string()),
        }
    }
}

/// Result type for node operations.
pub type NodeResult<T> = Result<T, NodeError>;
