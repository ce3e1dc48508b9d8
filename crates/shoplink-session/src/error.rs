//! # Session Error Types
//!
//! Errors raised by the session lifecycle and the reconciliation applier.

use shoplink_api::ApiError;
use shoplink_core::CoreError;
use thiserror::Error;

use crate::state::SessionState;

/// Result type alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// A failed session operation.
#[derive(Debug, Error)]
pub enum SessionError {
    // =========================================================================
    // Lifecycle Errors
    // =========================================================================
    /// No session exists under the given id. Raised both for unknown ids
    /// and for ids another actor already completed or cancelled.
    #[error("No active shop session for id {0}")]
    NotFound(uuid::Uuid),

    /// The session exists but is in the wrong state for the operation.
    #[error("Session is {actual:?}, operation requires {required:?}")]
    WrongState {
        required: SessionState,
        actual: SessionState,
    },

    /// The player's live inventory no longer matches the snapshot taken
    /// at session start. Applying the purchase would clobber items the
    /// player picked up or moved in the meantime.
    #[error("Inventory changed since the session started; purchase not applied")]
    InventoryChanged,

    // =========================================================================
    // Reconciliation Errors
    // =========================================================================
    /// The server-computed inventory does not fit the live container.
    #[error("Cannot apply purchased inventory: {reason}")]
    ApplyFailed { reason: String },

    // =========================================================================
    // Wrapped Errors
    // =========================================================================
    /// A marketplace call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Invalid inventory data.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl SessionError {
    /// True if retrying the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SessionError::Api(e) => e.is_retryable(),
            SessionError::InventoryChanged => false,
            SessionError::NotFound(_) => false,
            SessionError::WrongState { .. } => false,
            SessionError::ApplyFailed { .. } => false,
            SessionError::Core(_) => false,
        }
    }
}
