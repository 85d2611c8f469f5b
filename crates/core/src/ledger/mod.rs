//! Double-entry bookkeeping logic.
//!
//! This module implements the ledger engine:
//! - Chart-of-accounts taxonomy and account records
//! - Transaction entries and the transaction aggregate
//! - Account-type permission table
//! - Entry validation (balance, ownership, permissions)
//! - Posting and reversal of balance effects
//! - Full balance recalculation by replay
//! - Error types for ledger operations

pub mod account;
pub mod balance;
pub mod entry;
pub mod error;
pub mod permissions;
pub mod posting;
pub mod recalculation;
pub mod transaction;
pub mod types;
pub mod validation;

#[cfg(test)]
mod posting_props;
#[cfg(test)]
mod validation_props;

pub use account::{Account, AccountCategory, AccountType, SystemAccounts};
pub use balance::{AccountDelta, BalanceDeltas, NormalBalance};
pub use entry::{EntryType, TransactionEntry};
pub use error::LedgerError;
pub use permissions::{AccountTypeSet, PermissionTable, SideRule, SubtypeRule};
pub use posting::{DeleteScope, PostingEngine, PostingOutcome};
pub use recalculation::{BalanceDrift, Recalculation, RecalculationEngine, RecalculationSummary};
pub use transaction::{SourceDocument, Transaction, TransactionStatus};
pub use types::{TransactionTotals, TransactionType};
pub use validation::{AccountLookup, BALANCE_TOLERANCE, LedgerValidator};
