//! Posting engine: applies and reverses a transaction's balance effect.
//!
//! The engine takes accounts and transactions as values and returns updated
//! copies; it never writes anywhere. Every account a transaction touches is
//! fetched and checked before any balance is computed, so a failure leaves
//! nothing half-applied.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tally_shared::types::AccountId;
use tracing::{debug, info};

use super::account::Account;
use super::balance::{AccountDelta, BalanceDeltas};
use super::error::LedgerError;
use super::transaction::{Transaction, TransactionStatus};
use crate::lifecycle::Status;

/// Result of posting or voiding: the transaction with its new status and the
/// accounts whose balances changed (sorted by account id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostingOutcome {
    /// Transaction after the status change.
    pub transaction: Transaction,
    /// Updated accounts to write back.
    pub accounts: Vec<Account>,
}

/// Whether a deletion removes the transaction alone or together with the
/// document that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteScope {
    /// Deleting the transaction by itself.
    Standalone,
    /// The owning document is being deleted too.
    WithDocument,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Apply,
    Reverse,
}

/// Stateless service for applying transactions to account balances.
pub struct PostingEngine;

impl PostingEngine {
    /// Post a draft transaction.
    ///
    /// Sets `status = posted`, `posted_at = now` and clears stale void
    /// fields. Every touched account must be active.
    ///
    /// # Errors
    ///
    /// - `AlreadyPosted` if the transaction is posted or was ever posted
    /// - `Transition` if the transaction is void
    /// - `PostingAccountMissing` / `InactiveAccount` if an account is unusable
    pub fn post(
        transaction: &Transaction,
        accounts: &[Account],
        now: DateTime<Utc>,
    ) -> Result<PostingOutcome, LedgerError> {
        match transaction.status {
            TransactionStatus::Draft if !transaction.was_ever_posted() => {}
            TransactionStatus::Draft | TransactionStatus::Posted => {
                return Err(LedgerError::AlreadyPosted(transaction.id));
            }
            TransactionStatus::Void => {
                return Err(TransactionStatus::table()
                    .invalid(TransactionStatus::Void, TransactionStatus::Posted)
                    .into());
            }
        }

        let updated = Self::apply(transaction, accounts, Direction::Apply)?;

        let mut posted = transaction.clone();
        posted.status = TransactionStatus::Posted;
        posted.posted_at = Some(now);
        posted.updated_at = now;
        posted.voided_at = None;
        posted.void_reason = None;

        info!(
            tenant_id = %transaction.tenant_id,
            transaction_id = %transaction.id,
            transaction_type = %transaction.transaction_type,
            amount = %transaction.total_amount,
            accounts = updated.len(),
            "Transaction posted"
        );

        Ok(PostingOutcome {
            transaction: posted,
            accounts: updated,
        })
    }

    /// Undo a posted transaction's balance effect.
    ///
    /// Uses the entries recorded on the transaction, never a re-derivation.
    /// Inactive accounts are still reversed.
    ///
    /// # Errors
    ///
    /// - `NotPosted` if the transaction is not posted
    /// - `PostingAccountMissing` if a touched account is gone
    pub fn reverse(
        transaction: &Transaction,
        accounts: &[Account],
    ) -> Result<Vec<Account>, LedgerError> {
        if !transaction.is_posted() {
            return Err(LedgerError::NotPosted(transaction.id));
        }
        Self::apply(transaction, accounts, Direction::Reverse)
    }

    /// Void a draft or posted transaction.
    ///
    /// A posted transaction is reversed first; a draft never touched
    /// balances and returns no accounts.
    ///
    /// # Errors
    ///
    /// - `MissingVoidReason` if `reason` is blank
    /// - `Transition` if the transaction is already void
    /// - reversal errors for posted transactions
    pub fn void(
        transaction: &Transaction,
        accounts: &[Account],
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<PostingOutcome, LedgerError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(LedgerError::MissingVoidReason);
        }
        TransactionStatus::table().check(transaction.status, TransactionStatus::Void)?;

        let updated = if transaction.is_posted() {
            Self::reverse(transaction, accounts)?
        } else {
            Vec::new()
        };

        let mut voided = transaction.clone();
        voided.status = TransactionStatus::Void;
        voided.voided_at = Some(now);
        voided.void_reason = Some(reason.to_string());
        voided.updated_at = now;

        info!(
            tenant_id = %transaction.tenant_id,
            transaction_id = %transaction.id,
            was_posted = transaction.is_posted(),
            reason,
            "Transaction voided"
        );

        Ok(PostingOutcome {
            transaction: voided,
            accounts: updated,
        })
    }

    /// Balance updates required before deleting a transaction.
    ///
    /// A posted transaction's effect is reversed; drafts and voids need no
    /// updates. A transaction owned by a document can only be deleted along
    /// with that document.
    ///
    /// # Errors
    ///
    /// - `TransactionReferenced` for a standalone delete of a document's
    ///   transaction
    /// - reversal errors for posted transactions
    pub fn prepare_delete(
        transaction: &Transaction,
        accounts: &[Account],
        scope: DeleteScope,
    ) -> Result<Vec<Account>, LedgerError> {
        if scope == DeleteScope::Standalone && transaction.source.is_some() {
            return Err(LedgerError::TransactionReferenced(transaction.id));
        }
        if transaction.is_posted() {
            Self::reverse(transaction, accounts)
        } else {
            Ok(Vec::new())
        }
    }

    fn apply(
        transaction: &Transaction,
        accounts: &[Account],
        direction: Direction,
    ) -> Result<Vec<Account>, LedgerError> {
        let deltas = BalanceDeltas::from_entries(&transaction.entries);
        let index: HashMap<AccountId, &Account> = accounts
            .iter()
            .filter(|a| a.tenant_id == transaction.tenant_id)
            .map(|a| (a.id, a))
            .collect();

        // Fetch and check every account before computing anything.
        let mut touched = Vec::with_capacity(deltas.len());
        for (account_id, delta) in deltas.iter() {
            let account = index
                .get(&account_id)
                .copied()
                .ok_or(LedgerError::PostingAccountMissing(account_id))?;
            if direction == Direction::Apply && !account.is_active {
                return Err(LedgerError::InactiveAccount(account_id));
            }
            touched.push((account, delta));
        }

        Ok(touched
            .into_iter()
            .map(|(account, delta)| {
                let mut updated = account.clone();
                match direction {
                    Direction::Apply => {
                        Self::apply_delta(&mut updated, &delta);
                        updated.last_transaction_date = updated
                            .last_transaction_date
                            .max(Some(transaction.transaction_date));
                    }
                    Direction::Reverse => {
                        updated.current_balance -= delta.change_for(updated.normal_balance);
                    }
                }
                debug!(
                    account_id = %updated.id,
                    previous = %account.current_balance,
                    current = %updated.current_balance,
                    "Balance updated"
                );
                updated
            })
            .collect())
    }

    /// Add one aggregated delta to an account in its normal direction.
    pub(crate) fn apply_delta(account: &mut Account, delta: &AccountDelta) {
        account.current_balance += delta.change_for(account.normal_balance);
    }
}
