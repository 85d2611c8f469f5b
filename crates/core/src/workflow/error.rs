//! Workflow error types.

use tally_shared::AppError;
use thiserror::Error;

use super::ports::StoreError;
use crate::document::DocumentError;
use crate::ledger::LedgerError;

/// Errors raised while orchestrating documents, the ledger and the stores.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// Ledger validation or posting failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Document rule or status transition failed.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Document not found for this tenant.
    #[error("{kind} {id} not found")]
    DocumentNotFound {
        /// Kind of document.
        kind: &'static str,
        /// Document identifier.
        id: String,
    },

    /// The document has no linked transaction where one is required.
    #[error("{kind} {id} has no linked transaction")]
    MissingTransactionLink {
        /// Kind of document.
        kind: &'static str,
        /// Document identifier.
        id: String,
    },
}

impl WorkflowError {
    /// Create a document-not-found error.
    pub fn document_not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::DocumentNotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Ledger(e) => e.error_code(),
            Self::Document(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
            Self::DocumentNotFound { .. } => "DOCUMENT_NOT_FOUND",
            Self::MissingTransactionLink { .. } => "MISSING_TRANSACTION_LINK",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Ledger(e) => e.http_status_code(),
            Self::Document(e) => e.http_status_code(),
            Self::Store(e) => e.http_status_code(),
            Self::DocumentNotFound { .. } => 404,
            Self::MissingTransactionLink { .. } => 500,
        }
    }

    /// Returns true for failures after validation passed (see
    /// [`LedgerError::is_fatal`]); store failures always count.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Ledger(e) => e.is_fatal(),
            Self::Store(_) | Self::MissingTransactionLink { .. } => true,
            Self::Document(_) | Self::DocumentNotFound { .. } => false,
        }
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        let message = format!("{}: {err}", err.error_code());
        match err {
            WorkflowError::Store(_) => AppError::Storage(message),
            _ => AppError::from_status(err.http_status_code(), message),
        }
    }
}

#[cfg(test)]
mod tests {
    use tally_shared::types::InvoiceId;

    use super::*;

    #[test]
    fn test_wrapped_codes_pass_through() {
        let err: WorkflowError = LedgerError::MissingVoidReason.into();
        assert_eq!(err.error_code(), LedgerError::MissingVoidReason.error_code());
        assert!(!err.is_fatal());

        let err: WorkflowError = DocumentError::EmptyReceipt.into();
        assert_eq!(err.error_code(), "EMPTY_RECEIPT");
        assert_eq!(err.http_status_code(), 400);
    }

    #[test]
    fn test_document_not_found() {
        let id = InvoiceId::new();
        let err = WorkflowError::document_not_found("invoice", id);
        assert_eq!(err.http_status_code(), 404);
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn test_store_errors_are_fatal() {
        let err: WorkflowError = StoreError::Unavailable("disk".to_string()).into();
        assert!(err.is_fatal());
        assert_eq!(err.http_status_code(), 503);
    }

    #[test]
    fn test_into_app_error() {
        let app: AppError = WorkflowError::Store(StoreError::Unavailable("down".into())).into();
        assert!(matches!(app, AppError::Storage(_)));

        let app: AppError = WorkflowError::document_not_found("estimate", "e-1").into();
        assert_eq!(app.status_code(), 404);
    }
}
