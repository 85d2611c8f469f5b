//! Ledger error types for validation and state errors.
//!
//! Validation errors are raised before any balance is touched and are fully
//! recoverable. Mutation-phase errors (see [`LedgerError::is_fatal`]) abort
//! the operation with no partial application.

use rust_decimal::Decimal;
use tally_shared::AppError;
use tally_shared::types::{AccountId, TransactionId};
use thiserror::Error;

use super::account::AccountType;
use super::balance::NormalBalance;
use super::entry::EntryType;
use super::types::TransactionType;
use crate::lifecycle::TransitionError;

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Transaction must have at least 2 entries.
    #[error("Transaction must have at least 2 entries, got {count}")]
    InsufficientEntries {
        /// Number of entries supplied.
        count: usize,
    },

    /// Entry amount cannot be zero.
    #[error("Entry amount for account {account_id} cannot be zero")]
    ZeroAmount {
        /// The offending entry's account.
        account_id: AccountId,
    },

    /// Entry amount cannot be negative.
    #[error("Entry amount {amount} for account {account_id} cannot be negative")]
    NegativeAmount {
        /// The offending entry's account.
        account_id: AccountId,
        /// The amount supplied.
        amount: Decimal,
    },

    /// Debits and credits differ by more than the tolerance.
    #[error("Transaction is not balanced. Debit: {total_debits}, Credit: {total_credits}")]
    Unbalanced {
        /// Sum of debit amounts.
        total_debits: Decimal,
        /// Sum of credit amounts.
        total_credits: Decimal,
    },

    // ========== Account Errors ==========
    /// Account not found (or owned by another tenant).
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Account is inactive and cannot be used.
    #[error("Account {0} is inactive")]
    InactiveAccount(AccountId),

    /// Account type is not permitted on this side for this transaction type.
    #[error(
        "Account {account_id} of type {actual_type} cannot be used on the {side} side of a {transaction_type} transaction (allowed: {})",
        join(.allowed_types)
    )]
    AccountTypeNotAllowed {
        /// The offending account.
        account_id: AccountId,
        /// Transaction type being validated.
        transaction_type: TransactionType,
        /// Side the entry occupies.
        side: EntryType,
        /// The account's type.
        actual_type: AccountType,
        /// Types permitted on that side.
        allowed_types: Vec<AccountType>,
    },

    /// Account subtype is not permitted on this side for this transaction type.
    #[error(
        "Account {account_id} with detail type '{actual_subtype}' cannot be used on the {side} side of a {transaction_type} transaction (allowed: {})",
        join(.allowed_subtypes)
    )]
    AccountSubtypeNotAllowed {
        /// The offending account.
        account_id: AccountId,
        /// Transaction type being validated.
        transaction_type: TransactionType,
        /// Side the entry occupies.
        side: EntryType,
        /// The account's detail type.
        actual_subtype: String,
        /// Detail types permitted on that side.
        allowed_subtypes: Vec<String>,
    },

    /// Detail type does not belong to the account type.
    #[error("'{subtype}' is not a detail type of {account_type}")]
    InvalidAccountSubtype {
        /// The account type.
        account_type: AccountType,
        /// The rejected detail type.
        subtype: String,
    },

    /// Stored normal balance side disagrees with the account type.
    #[error("{account_type} accounts are {expected}-normal, not {normal_balance}-normal")]
    NormalBalanceMismatch {
        /// The account type.
        account_type: AccountType,
        /// Side the account type implies.
        expected: NormalBalance,
        /// Side found on the record.
        normal_balance: NormalBalance,
    },

    /// No active account of a required system type.
    #[error("No active {0} account configured")]
    MissingSystemAccount(AccountType),

    /// Unknown account type name.
    #[error("Unknown account type: {0}")]
    UnknownAccountType(String),

    /// Unknown transaction type name.
    #[error("Unknown transaction type: {0}")]
    UnknownTransactionType(String),

    // ========== Permission Table Errors ==========
    /// The permission table has no rule for this transaction type.
    #[error("No account-type permissions configured for {0}")]
    UnmappedTransactionType(TransactionType),

    /// The permission table could not be parsed.
    #[error("Invalid permission table: {0}")]
    InvalidPermissionTable(String),

    // ========== Transaction State Errors ==========
    /// Transaction was already posted once.
    #[error("Transaction {0} has already been posted")]
    AlreadyPosted(TransactionId),

    /// Only posted transactions can be reversed.
    #[error("Transaction {0} is not posted")]
    NotPosted(TransactionId),

    /// Voiding requires a non-empty reason.
    #[error("Void reason is required")]
    MissingVoidReason,

    /// Illegal status move.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// Transaction belongs to a document and cannot be deleted on its own.
    #[error("Transaction {0} is referenced by a document; delete the document instead")]
    TransactionReferenced(TransactionId),

    /// Transaction not found.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    // ========== Mutation Errors ==========
    /// An account referenced by a transaction vanished between validation
    /// and balance application.
    #[error("Account {0} disappeared while applying balances")]
    PostingAccountMissing(AccountId),
}

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientEntries { .. } => "INSUFFICIENT_ENTRIES",
            Self::ZeroAmount { .. } => "ZERO_AMOUNT",
            Self::NegativeAmount { .. } => "NEGATIVE_AMOUNT",
            Self::Unbalanced { .. } => "UNBALANCED_TRANSACTION",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::InactiveAccount(_) => "ACCOUNT_INACTIVE",
            Self::AccountTypeNotAllowed { .. } => "ACCOUNT_TYPE_NOT_ALLOWED",
            Self::AccountSubtypeNotAllowed { .. } => "ACCOUNT_SUBTYPE_NOT_ALLOWED",
            Self::InvalidAccountSubtype { .. } => "INVALID_ACCOUNT_SUBTYPE",
            Self::NormalBalanceMismatch { .. } => "NORMAL_BALANCE_MISMATCH",
            Self::MissingSystemAccount(_) => "MISSING_SYSTEM_ACCOUNT",
            Self::UnknownAccountType(_) => "UNKNOWN_ACCOUNT_TYPE",
            Self::UnknownTransactionType(_) => "UNKNOWN_TRANSACTION_TYPE",
            Self::UnmappedTransactionType(_) => "UNMAPPED_TRANSACTION_TYPE",
            Self::InvalidPermissionTable(_) => "INVALID_PERMISSION_TABLE",
            Self::AlreadyPosted(_) => "ALREADY_POSTED",
            Self::NotPosted(_) => "NOT_POSTED",
            Self::MissingVoidReason => "VOID_REASON_REQUIRED",
            Self::Transition(e) => e.error_code(),
            Self::TransactionReferenced(_) => "TRANSACTION_REFERENCED",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::PostingAccountMissing(_) => "POSTING_ACCOUNT_MISSING",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::InsufficientEntries { .. }
            | Self::ZeroAmount { .. }
            | Self::NegativeAmount { .. }
            | Self::Unbalanced { .. }
            | Self::InactiveAccount(_)
            | Self::AccountTypeNotAllowed { .. }
            | Self::AccountSubtypeNotAllowed { .. }
            | Self::InvalidAccountSubtype { .. }
            | Self::NormalBalanceMismatch { .. }
            | Self::UnknownAccountType(_)
            | Self::UnknownTransactionType(_)
            | Self::MissingVoidReason => 400,

            // 404 Not Found
            Self::AccountNotFound(_) | Self::TransactionNotFound(_) => 404,

            // 409 Conflict - state errors
            Self::AlreadyPosted(_)
            | Self::NotPosted(_)
            | Self::Transition(_)
            | Self::TransactionReferenced(_) => 409,

            // 422 - tenant setup is incomplete
            Self::MissingSystemAccount(_) | Self::UnmappedTransactionType(_) => 422,

            // 500 Internal Server Error
            Self::InvalidPermissionTable(_) | Self::PostingAccountMissing(_) => 500,
        }
    }

    /// Returns true for mutation-phase failures that must abort the whole
    /// operation rather than be corrected and retried.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::AlreadyPosted(_) | Self::PostingAccountMissing(_)
        )
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        AppError::from_status(err.http_status_code(), format!("{}: {err}", err.error_code()))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            LedgerError::InsufficientEntries { count: 1 }.error_code(),
            "INSUFFICIENT_ENTRIES"
        );
        assert_eq!(
            LedgerError::Unbalanced {
                total_debits: dec!(100),
                total_credits: dec!(90),
            }
            .error_code(),
            "UNBALANCED_TRANSACTION"
        );
        assert_eq!(
            LedgerError::AlreadyPosted(TransactionId::new()).error_code(),
            "ALREADY_POSTED"
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(LedgerError::MissingVoidReason.http_status_code(), 400);
        assert_eq!(
            LedgerError::AccountNotFound(AccountId::new()).http_status_code(),
            404
        );
        assert_eq!(
            LedgerError::AlreadyPosted(TransactionId::new()).http_status_code(),
            409
        );
        assert_eq!(
            LedgerError::PostingAccountMissing(AccountId::new()).http_status_code(),
            500
        );
    }

    #[test]
    fn test_fatal_errors() {
        assert!(LedgerError::AlreadyPosted(TransactionId::new()).is_fatal());
        assert!(LedgerError::PostingAccountMissing(AccountId::new()).is_fatal());
        assert!(!LedgerError::AccountNotFound(AccountId::new()).is_fatal());
        assert!(!LedgerError::MissingVoidReason.is_fatal());
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::Unbalanced {
            total_debits: dec!(100.00),
            total_credits: dec!(90.00),
        };
        assert_eq!(
            err.to_string(),
            "Transaction is not balanced. Debit: 100.00, Credit: 90.00"
        );

        let account_id = AccountId::new();
        let err = LedgerError::AccountTypeNotAllowed {
            account_id,
            transaction_type: TransactionType::Payment,
            side: EntryType::Credit,
            actual_type: AccountType::Income,
            allowed_types: vec![AccountType::AccountsReceivable],
        };
        assert_eq!(
            err.to_string(),
            format!(
                "Account {account_id} of type Income cannot be used on the credit side of a payment transaction (allowed: Accounts Receivable)"
            )
        );
    }

    #[test]
    fn test_into_app_error() {
        let app: AppError = LedgerError::AlreadyPosted(TransactionId::new()).into();
        assert_eq!(app.status_code(), 409);
        assert!(app.to_string().contains("ALREADY_POSTED"));
    }
}
