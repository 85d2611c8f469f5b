//! Shared setup for workflow tests.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tally_shared::types::{AccountId, TenantId};

use super::ledger::LedgerService;
use super::memory::MemoryStore;
use super::ports::{AccountStore, TransactionStore};
use crate::ledger::{Account, AccountType, PermissionTable, RecalculationEngine};

pub(crate) struct Books {
    pub tenant: TenantId,
    pub receivable: AccountId,
    pub sales: AccountId,
    pub consulting: AccountId,
    pub cogs: AccountId,
    pub inventory: AccountId,
    pub checking: AccountId,
    pub ledger: LedgerService<MemoryStore>,
}

pub(crate) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap()
}

pub(crate) fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, d).unwrap()
}

impl Books {
    pub fn new() -> Self {
        let tenant = TenantId::new();
        let open = |name: &str, account_type, subtype: &str, opening| {
            Account::new(tenant, name, account_type, subtype, opening).unwrap()
        };
        let receivable = open(
            "Accounts Receivable",
            AccountType::AccountsReceivable,
            "Accounts Receivable (A/R)",
            dec!(0),
        );
        let sales = open(
            "Sales",
            AccountType::Income,
            "Sales of Product Income",
            dec!(0),
        )
        .as_default();
        let consulting = open("Consulting", AccountType::Income, "Service/Fee Income", dec!(0));
        let cogs = open(
            "Cost of Goods Sold",
            AccountType::CostOfGoodsSold,
            "Supplies & Materials - COGS",
            dec!(0),
        );
        let inventory = open(
            "Inventory",
            AccountType::OtherCurrentAsset,
            "Inventory",
            dec!(800),
        );
        let checking = open("Checking", AccountType::Bank, "Checking", dec!(5000));

        let ids = (
            receivable.id,
            sales.id,
            consulting.id,
            cogs.id,
            inventory.id,
            checking.id,
        );
        let store = MemoryStore::with_ledger(
            [receivable, sales, consulting, cogs, inventory, checking],
            [],
        );

        Self {
            tenant,
            receivable: ids.0,
            sales: ids.1,
            consulting: ids.2,
            cogs: ids.3,
            inventory: ids.4,
            checking: ids.5,
            ledger: LedgerService::new(Arc::new(store), Arc::new(PermissionTable::builtin())),
        }
    }

    pub fn store(&self) -> &MemoryStore {
        self.ledger.store()
    }

    pub fn balance(&self, id: AccountId) -> Decimal {
        self.store()
            .account(self.tenant, id)
            .unwrap()
            .unwrap()
            .current_balance
    }

    /// Asserts that replaying the log reproduces the stored balances.
    pub fn assert_replay_matches(&self) {
        let accounts = self.store().accounts(self.tenant).unwrap();
        let transactions = self.store().transactions(self.tenant).unwrap();
        let replayed = RecalculationEngine::recalculate(&accounts, &transactions).unwrap();
        assert!(RecalculationEngine::drift(&accounts, &replayed.accounts).is_empty());
        for (stored, rebuilt) in accounts.iter().zip(&replayed.accounts) {
            assert_eq!(stored.last_transaction_date, rebuilt.last_transaction_date);
        }
    }
}
