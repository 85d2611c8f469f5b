//! Store ports consumed by the workflows.
//!
//! Persistence lives outside the core. These traits are the whole contract:
//! reads are tenant-scoped, and writes only touch the fields the ledger owns
//! (balances on accounts, status fields on transactions, whole documents).

use tally_shared::types::{AccountId, TenantId, TransactionId};
use thiserror::Error;

use crate::document::Document;
use crate::ledger::{Account, Transaction};

/// Errors reported by a store implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A write targeted a record the store does not hold.
    #[error("{kind} {id} not found in store")]
    NotFound {
        /// Record kind.
        kind: &'static str,
        /// Record identifier.
        id: String,
    },

    /// A record with the same identifier already exists.
    #[error("{kind} {id} already exists")]
    Duplicate {
        /// Record kind.
        kind: &'static str,
        /// Record identifier.
        id: String,
    },

    /// The backing store failed.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Create a not-found error.
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "STORE_NOT_FOUND",
            Self::Duplicate { .. } => "STORE_DUPLICATE",
            Self::Unavailable(_) => "STORE_UNAVAILABLE",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Duplicate { .. } => 409,
            Self::Unavailable(_) => 503,
        }
    }
}

/// Chart of accounts. The core never creates or deletes accounts.
pub trait AccountStore: Send + Sync {
    /// Fetch one account.
    fn account(&self, tenant_id: TenantId, id: AccountId) -> Result<Option<Account>, StoreError>;

    /// Fetch the given accounts; unknown ids are skipped.
    fn accounts_by_ids(
        &self,
        tenant_id: TenantId,
        ids: &[AccountId],
    ) -> Result<Vec<Account>, StoreError>;

    /// Every account of the tenant.
    fn accounts(&self, tenant_id: TenantId) -> Result<Vec<Account>, StoreError>;

    /// Write back `current_balance` and `last_transaction_date`.
    fn update_balances(&self, tenant_id: TenantId, accounts: &[Account])
    -> Result<(), StoreError>;
}

/// Transaction log.
pub trait TransactionStore: Send + Sync {
    /// Every transaction of the tenant, in insertion order.
    fn transactions(&self, tenant_id: TenantId) -> Result<Vec<Transaction>, StoreError>;

    /// Fetch one transaction.
    fn transaction(
        &self,
        tenant_id: TenantId,
        id: TransactionId,
    ) -> Result<Option<Transaction>, StoreError>;

    /// Append a new transaction.
    fn append(&self, transaction: &Transaction) -> Result<(), StoreError>;

    /// Write back status, timestamps and void reason.
    fn update_status(&self, transaction: &Transaction) -> Result<(), StoreError>;

    /// Remove every listed transaction, or none of them.
    ///
    /// Fails with `NotFound` if any id is unknown for the tenant.
    fn delete_transactions(
        &self,
        tenant_id: TenantId,
        ids: &[TransactionId],
    ) -> Result<(), StoreError>;
}

/// Per document type storage.
pub trait DocumentStore<D: Document>: Send + Sync {
    /// Fetch one document.
    fn document(&self, tenant_id: TenantId, id: D::Id) -> Result<Option<D>, StoreError>;

    /// Every document of the tenant.
    fn documents(&self, tenant_id: TenantId) -> Result<Vec<D>, StoreError>;

    /// Insert or replace a document.
    fn save(&self, document: &D) -> Result<(), StoreError>;

    /// Remove a document. Returns false if it did not exist.
    fn delete_document(&self, tenant_id: TenantId, id: D::Id) -> Result<bool, StoreError>;
}
