//! In-memory implementation of every store port.
//!
//! Backs the workflow tests and any embedding that keeps a tenant's books
//! in process. One `RwLock` per collection; callers are still expected to
//! serialize writers per tenant.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tally_shared::types::{
    AccountId, EstimateId, InvoiceId, PurchaseOrderId, TenantId, TransactionId,
};

use super::ports::{AccountStore, DocumentStore, StoreError, TransactionStore};
use crate::document::{Document, Estimate, Invoice, PurchaseOrder};
use crate::ledger::{Account, Transaction};

/// Thread-safe in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    accounts: RwLock<BTreeMap<AccountId, Account>>,
    transactions: RwLock<Vec<Transaction>>,
    invoices: RwLock<BTreeMap<InvoiceId, Invoice>>,
    estimates: RwLock<BTreeMap<EstimateId, Estimate>>,
    purchase_orders: RwLock<BTreeMap<PurchaseOrderId, PurchaseOrder>>,
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, StoreError> {
    lock.read()
        .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, StoreError> {
    lock.write()
        .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
}

impl MemoryStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with a chart of accounts and a transaction log.
    #[must_use]
    pub fn with_ledger(
        accounts: impl IntoIterator<Item = Account>,
        transactions: impl IntoIterator<Item = Transaction>,
    ) -> Self {
        Self {
            accounts: RwLock::new(accounts.into_iter().map(|a| (a.id, a)).collect()),
            transactions: RwLock::new(transactions.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Add an account (onboarding or CRUD; not a ledger operation).
    ///
    /// # Errors
    ///
    /// `Duplicate` if the id is taken.
    pub fn insert_account(&self, account: Account) -> Result<(), StoreError> {
        let mut accounts = write(&self.accounts)?;
        if accounts.contains_key(&account.id) {
            return Err(StoreError::Duplicate {
                kind: AccountId::KIND,
                id: account.id.to_string(),
            });
        }
        accounts.insert(account.id, account);
        Ok(())
    }

    /// Drop an account behind the ledger's back.
    #[cfg(test)]
    pub(crate) fn remove_account(&self, id: AccountId) -> Option<Account> {
        self.accounts.write().unwrap().remove(&id)
    }
}

impl AccountStore for MemoryStore {
    fn account(&self, tenant_id: TenantId, id: AccountId) -> Result<Option<Account>, StoreError> {
        Ok(read(&self.accounts)?
            .get(&id)
            .filter(|a| a.tenant_id == tenant_id)
            .cloned())
    }

    fn accounts_by_ids(
        &self,
        tenant_id: TenantId,
        ids: &[AccountId],
    ) -> Result<Vec<Account>, StoreError> {
        let accounts = read(&self.accounts)?;
        Ok(ids
            .iter()
            .filter_map(|id| accounts.get(id))
            .filter(|a| a.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    fn accounts(&self, tenant_id: TenantId) -> Result<Vec<Account>, StoreError> {
        Ok(read(&self.accounts)?
            .values()
            .filter(|a| a.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    fn update_balances(
        &self,
        tenant_id: TenantId,
        updated: &[Account],
    ) -> Result<(), StoreError> {
        let mut accounts = write(&self.accounts)?;
        if let Some(missing) = updated.iter().find(|u| {
            accounts
                .get(&u.id)
                .is_none_or(|stored| stored.tenant_id != tenant_id)
        }) {
            return Err(StoreError::not_found(AccountId::KIND, missing.id));
        }
        for account in updated {
            if let Some(stored) = accounts.get_mut(&account.id) {
                stored.current_balance = account.current_balance;
                stored.last_transaction_date = account.last_transaction_date;
            }
        }
        Ok(())
    }
}

impl TransactionStore for MemoryStore {
    fn transactions(&self, tenant_id: TenantId) -> Result<Vec<Transaction>, StoreError> {
        Ok(read(&self.transactions)?
            .iter()
            .filter(|t| t.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    fn transaction(
        &self,
        tenant_id: TenantId,
        id: TransactionId,
    ) -> Result<Option<Transaction>, StoreError> {
        Ok(read(&self.transactions)?
            .iter()
            .find(|t| t.id == id && t.tenant_id == tenant_id)
            .cloned())
    }

    fn append(&self, transaction: &Transaction) -> Result<(), StoreError> {
        let mut transactions = write(&self.transactions)?;
        if transactions.iter().any(|t| t.id == transaction.id) {
            return Err(StoreError::Duplicate {
                kind: TransactionId::KIND,
                id: transaction.id.to_string(),
            });
        }
        transactions.push(transaction.clone());
        Ok(())
    }

    fn update_status(&self, transaction: &Transaction) -> Result<(), StoreError> {
        let mut transactions = write(&self.transactions)?;
        let stored = transactions
            .iter_mut()
            .find(|t| t.id == transaction.id && t.tenant_id == transaction.tenant_id)
            .ok_or_else(|| StoreError::not_found(TransactionId::KIND, transaction.id))?;
        stored.status = transaction.status;
        stored.updated_at = transaction.updated_at;
        stored.posted_at = transaction.posted_at;
        stored.voided_at = transaction.voided_at;
        stored.void_reason.clone_from(&transaction.void_reason);
        Ok(())
    }

    fn delete_transactions(
        &self,
        tenant_id: TenantId,
        ids: &[TransactionId],
    ) -> Result<(), StoreError> {
        let mut transactions = write(&self.transactions)?;
        if let Some(missing) = ids.iter().find(|id| {
            !transactions
                .iter()
                .any(|t| t.id == **id && t.tenant_id == tenant_id)
        }) {
            return Err(StoreError::not_found(TransactionId::KIND, *missing));
        }
        transactions.retain(|t| !(t.tenant_id == tenant_id && ids.contains(&t.id)));
        Ok(())
    }
}

macro_rules! document_table {
    ($doc:ty, $field:ident) => {
        impl DocumentStore<$doc> for MemoryStore {
            fn document(
                &self,
                tenant_id: TenantId,
                id: <$doc as Document>::Id,
            ) -> Result<Option<$doc>, StoreError> {
                Ok(read(&self.$field)?
                    .get(&id)
                    .filter(|d| d.tenant_id() == tenant_id)
                    .cloned())
            }

            fn documents(&self, tenant_id: TenantId) -> Result<Vec<$doc>, StoreError> {
                Ok(read(&self.$field)?
                    .values()
                    .filter(|d| d.tenant_id() == tenant_id)
                    .cloned()
                    .collect())
            }

            fn save(&self, document: &$doc) -> Result<(), StoreError> {
                write(&self.$field)?.insert(document.id(), document.clone());
                Ok(())
            }

            fn delete_document(
                &self,
                tenant_id: TenantId,
                id: <$doc as Document>::Id,
            ) -> Result<bool, StoreError> {
                let mut documents = write(&self.$field)?;
                if documents.get(&id).is_some_and(|d| d.tenant_id() == tenant_id) {
                    documents.remove(&id);
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
        }
    };
}

document_table!(Invoice, invoices);
document_table!(Estimate, estimates);
document_table!(PurchaseOrder, purchase_orders);

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal_macros::dec;

    use super::*;
    use crate::ledger::{AccountType, TransactionEntry, TransactionType};

    fn bank(tenant_id: TenantId) -> Account {
        Account::new(tenant_id, "Checking", AccountType::Bank, "Checking", dec!(100)).unwrap()
    }

    #[test]
    fn test_accounts_are_tenant_scoped() {
        let tenant = TenantId::new();
        let other = TenantId::new();
        let account = bank(tenant);
        let store = MemoryStore::with_ledger([account.clone()], []);

        assert_eq!(store.account(tenant, account.id).unwrap(), Some(account.clone()));
        assert_eq!(store.account(other, account.id).unwrap(), None);
        assert!(store.accounts_by_ids(other, &[account.id]).unwrap().is_empty());
        assert!(store.accounts(other).unwrap().is_empty());
    }

    #[test]
    fn test_update_balances_is_all_or_nothing() {
        let tenant = TenantId::new();
        let account = bank(tenant);
        let store = MemoryStore::with_ledger([account.clone()], []);

        let mut changed = account.clone();
        changed.current_balance = dec!(250);
        let stranger = bank(tenant);

        assert!(matches!(
            store.update_balances(tenant, &[changed.clone(), stranger]),
            Err(StoreError::NotFound { .. })
        ));
        assert_eq!(
            store.account(tenant, account.id).unwrap().unwrap().current_balance,
            dec!(100)
        );

        store.update_balances(tenant, &[changed]).unwrap();
        assert_eq!(
            store.account(tenant, account.id).unwrap().unwrap().current_balance,
            dec!(250)
        );
    }

    #[test]
    fn test_transaction_status_update_and_delete() {
        let tenant = TenantId::new();
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        let account = bank(tenant);
        let tx = Transaction::draft(
            tenant,
            TransactionType::JournalEntry,
            NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            "Opening adjustment",
            vec![
                TransactionEntry::debit(account.id, dec!(5)),
                TransactionEntry::credit(account.id, dec!(5)),
            ],
            now,
        );
        let store = MemoryStore::new();
        store.append(&tx).unwrap();
        assert!(matches!(
            store.append(&tx),
            Err(StoreError::Duplicate { .. })
        ));

        let mut voided = tx.clone();
        voided.status = crate::ledger::TransactionStatus::Void;
        voided.void_reason = Some("typo".to_string());
        voided.description = "ignored".to_string();
        store.update_status(&voided).unwrap();

        let stored = store.transaction(tenant, tx.id).unwrap().unwrap();
        assert_eq!(stored.status, crate::ledger::TransactionStatus::Void);
        assert_eq!(stored.void_reason.as_deref(), Some("typo"));
        assert_eq!(stored.description, "Opening adjustment");

        assert!(matches!(
            store.delete_transactions(tenant, &[tx.id, TransactionId::new()]),
            Err(StoreError::NotFound { .. })
        ));
        assert!(store.transaction(tenant, tx.id).unwrap().is_some());

        store.delete_transactions(tenant, &[tx.id]).unwrap();
        assert!(store.transaction(tenant, tx.id).unwrap().is_none());
        assert!(store.delete_transactions(tenant, &[tx.id]).is_err());
    }
}
