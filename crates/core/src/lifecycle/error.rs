//! Transition error types.

use thiserror::Error;

/// Errors raised by a status machine.
///
/// All of them are detected before the record is touched, so a failed
/// transition always leaves status and timestamps unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The target status is not a legal successor of the current one.
    #[error("Invalid {subject} status transition from {from} to {to}")]
    InvalidTransition {
        /// What kind of record the machine governs (e.g. "invoice").
        subject: &'static str,
        /// The current status.
        from: String,
        /// The attempted target status.
        to: String,
    },

    /// The target status can only be reached through a dedicated action.
    #[error("{subject} status {to} can only be reached through its dedicated action")]
    ActionRequired {
        /// What kind of record the machine governs.
        subject: &'static str,
        /// The attempted target status.
        to: String,
    },

    /// Voiding requires a non-empty reason.
    #[error("Void reason is required")]
    MissingVoidReason,
}

impl TransitionError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::ActionRequired { .. } => "ACTION_REQUIRED",
            Self::MissingVoidReason => "VOID_REASON_REQUIRED",
        }
    }
}
