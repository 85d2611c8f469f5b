//! Store-backed ledger operations.
//!
//! Fetches what the pure engines need from the stores, runs them, and writes
//! the results back. Every check runs before the first write; balances are
//! written before the transaction status, so an interrupted write leaves a
//! drift that [`LedgerService::recalculate`] repairs.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tally_shared::types::{AccountId, TenantId, TransactionId};
use tracing::{info, instrument};

use super::error::WorkflowError;
use super::ports::{AccountStore, TransactionStore};
use crate::ledger::{
    Account, BALANCE_TOLERANCE, DeleteScope, LedgerError, LedgerValidator, PermissionTable,
    PostingEngine, Recalculation, RecalculationEngine, Transaction, TransactionEntry,
    TransactionType,
};

/// Ledger operations over an account store and a transaction store.
pub struct LedgerService<S> {
    store: Arc<S>,
    permissions: Arc<PermissionTable>,
    tolerance: Decimal,
}

impl<S> Clone for LedgerService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            permissions: Arc::clone(&self.permissions),
            tolerance: self.tolerance,
        }
    }
}

impl<S: AccountStore + TransactionStore> LedgerService<S> {
    /// Create a service with the default balancing tolerance.
    #[must_use]
    pub fn new(store: Arc<S>, permissions: Arc<PermissionTable>) -> Self {
        Self {
            store,
            permissions,
            tolerance: BALANCE_TOLERANCE,
        }
    }

    /// Override the balancing tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: Decimal) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The account-type permission table in use.
    #[must_use]
    pub fn permissions(&self) -> &PermissionTable {
        &self.permissions
    }

    fn validator(&self) -> LedgerValidator<'_> {
        LedgerValidator::new(&self.permissions).with_tolerance(self.tolerance)
    }

    fn entry_accounts(
        &self,
        tenant_id: TenantId,
        entries: &[TransactionEntry],
    ) -> Result<Vec<Account>, WorkflowError> {
        let ids: Vec<AccountId> = entries
            .iter()
            .map(|e| e.account_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        Ok(self.store.accounts_by_ids(tenant_id, &ids)?)
    }

    /// Roll `last_transaction_date` back for accounts whose latest posting
    /// is being reversed.
    fn restamp(
        &self,
        tenant_id: TenantId,
        accounts: &mut [Account],
        excluded: &[TransactionId],
    ) -> Result<(), WorkflowError> {
        if accounts.is_empty() {
            return Ok(());
        }
        let log = self.store.transactions(tenant_id)?;
        RecalculationEngine::restamp(accounts, &log, excluded);
        Ok(())
    }

    /// Fetch a stored transaction.
    ///
    /// # Errors
    ///
    /// `TransactionNotFound`, or a store error.
    pub fn transaction(
        &self,
        tenant_id: TenantId,
        id: TransactionId,
    ) -> Result<Transaction, WorkflowError> {
        self.store
            .transaction(tenant_id, id)?
            .ok_or_else(|| LedgerError::TransactionNotFound(id).into())
    }

    /// Dry-run validation; nothing is written.
    ///
    /// # Errors
    ///
    /// The first validation failure, or a store error.
    pub fn validate(
        &self,
        tenant_id: TenantId,
        transaction_type: TransactionType,
        entries: &[TransactionEntry],
    ) -> Result<(), WorkflowError> {
        let accounts = self.entry_accounts(tenant_id, entries)?;
        self.validator()
            .validate(tenant_id, transaction_type, entries, &accounts)?;
        Ok(())
    }

    /// Validate a draft and append it to the log.
    ///
    /// # Errors
    ///
    /// Validation or store errors; nothing is written on failure.
    pub fn record_draft(&self, draft: &Transaction) -> Result<(), WorkflowError> {
        self.validate(draft.tenant_id, draft.transaction_type, &draft.entries)?;
        self.store.append(draft)?;
        Ok(())
    }

    /// Validate a draft, post it and append the posted transaction.
    ///
    /// # Errors
    ///
    /// Validation, posting or store errors.
    pub fn record_posted(
        &self,
        draft: &Transaction,
        now: DateTime<Utc>,
    ) -> Result<Transaction, WorkflowError> {
        let accounts = self.entry_accounts(draft.tenant_id, &draft.entries)?;
        self.validator()
            .validate(draft.tenant_id, draft.transaction_type, &draft.entries, &accounts)?;
        let outcome = PostingEngine::post(draft, &accounts, now)?;

        self.store.update_balances(draft.tenant_id, &outcome.accounts)?;
        self.store.append(&outcome.transaction)?;
        Ok(outcome.transaction)
    }

    /// Post a stored draft.
    ///
    /// # Errors
    ///
    /// `TransactionNotFound`, posting errors, or store errors.
    #[instrument(skip_all, fields(tenant_id = %tenant_id, transaction_id = %id))]
    pub fn post(
        &self,
        tenant_id: TenantId,
        id: TransactionId,
        now: DateTime<Utc>,
    ) -> Result<Transaction, WorkflowError> {
        let transaction = self.transaction(tenant_id, id)?;
        let accounts = self.entry_accounts(tenant_id, &transaction.entries)?;
        let outcome = PostingEngine::post(&transaction, &accounts, now)?;

        self.store.update_balances(tenant_id, &outcome.accounts)?;
        self.store.update_status(&outcome.transaction)?;
        Ok(outcome.transaction)
    }

    /// Void a stored transaction, reversing it if posted.
    ///
    /// # Errors
    ///
    /// `TransactionNotFound`, `MissingVoidReason`, transition or store
    /// errors.
    #[instrument(skip_all, fields(tenant_id = %tenant_id, transaction_id = %id))]
    pub fn void(
        &self,
        tenant_id: TenantId,
        id: TransactionId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Transaction, WorkflowError> {
        let transaction = self.transaction(tenant_id, id)?;
        let accounts = self.entry_accounts(tenant_id, &transaction.entries)?;
        let mut outcome = PostingEngine::void(&transaction, &accounts, reason, now)?;
        self.restamp(tenant_id, &mut outcome.accounts, &[id])?;

        self.store.update_balances(tenant_id, &outcome.accounts)?;
        self.store.update_status(&outcome.transaction)?;
        Ok(outcome.transaction)
    }

    /// Move a voided transaction back to draft.
    ///
    /// # Errors
    ///
    /// `TransactionNotFound`, transition or store errors.
    pub fn reopen(
        &self,
        tenant_id: TenantId,
        id: TransactionId,
        now: DateTime<Utc>,
    ) -> Result<Transaction, WorkflowError> {
        let mut transaction = self.transaction(tenant_id, id)?;
        transaction.reopen(now)?;
        self.store.update_status(&transaction)?;
        Ok(transaction)
    }

    /// Delete a transaction, reversing its effect first if posted.
    ///
    /// # Errors
    ///
    /// `TransactionNotFound`, `TransactionReferenced` for a standalone
    /// delete of a document's transaction, or store errors.
    #[instrument(skip_all, fields(tenant_id = %tenant_id, transaction_id = %id))]
    pub fn delete(
        &self,
        tenant_id: TenantId,
        id: TransactionId,
        scope: DeleteScope,
    ) -> Result<(), WorkflowError> {
        let transaction = self.transaction(tenant_id, id)?;
        self.delete_all(tenant_id, std::slice::from_ref(&transaction), scope)
    }

    /// Delete several transactions as one unit.
    ///
    /// Reversals are computed in order against a running copy of the
    /// accounts, so two transactions touching the same account compose.
    /// Nothing is written unless every reversal succeeds.
    ///
    /// # Errors
    ///
    /// `TransactionReferenced`, `PostingAccountMissing`, or store errors.
    #[instrument(skip_all, fields(tenant_id = %tenant_id, count = transactions.len()))]
    pub fn delete_all(
        &self,
        tenant_id: TenantId,
        transactions: &[Transaction],
        scope: DeleteScope,
    ) -> Result<(), WorkflowError> {
        let entries: Vec<TransactionEntry> = transactions
            .iter()
            .flat_map(|t| t.entries.iter().cloned())
            .collect();
        let mut working: BTreeMap<AccountId, Account> = self
            .entry_accounts(tenant_id, &entries)?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();

        let mut touched = BTreeSet::new();
        for transaction in transactions {
            let current: Vec<Account> = working.values().cloned().collect();
            for account in PostingEngine::prepare_delete(transaction, &current, scope)? {
                touched.insert(account.id);
                working.insert(account.id, account);
            }
        }

        let mut reversed: Vec<Account> = touched
            .iter()
            .filter_map(|id| working.remove(id))
            .collect();
        let ids: Vec<TransactionId> = transactions.iter().map(|t| t.id).collect();
        self.restamp(tenant_id, &mut reversed, &ids)?;

        self.store.update_balances(tenant_id, &reversed)?;
        self.store.delete_transactions(tenant_id, &ids)?;
        info!(
            deleted = ids.len(),
            reversed = transactions.iter().filter(|t| t.is_posted()).count(),
            "Transactions deleted"
        );
        Ok(())
    }

    /// Rebuild and store every balance of the tenant.
    ///
    /// # Errors
    ///
    /// `AccountNotFound` if a posted transaction references an unknown
    /// account, or store errors.
    #[instrument(skip_all, fields(tenant_id = %tenant_id))]
    pub fn recalculate(&self, tenant_id: TenantId) -> Result<Recalculation, WorkflowError> {
        let accounts = self.store.accounts(tenant_id)?;
        let transactions = self.store.transactions(tenant_id)?;
        let recalculation = RecalculationEngine::recalculate(&accounts, &transactions)?;

        self.store
            .update_balances(tenant_id, &recalculation.accounts)?;
        Ok(recalculation)
    }
}
