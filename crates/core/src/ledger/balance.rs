//! Directional balance arithmetic.
//!
//! - Debit-normal accounts (assets, expenses): balance += debit - credit
//! - Credit-normal accounts (liabilities, equity, income): balance += credit - debit

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::AccountId;

use super::entry::{EntryType, TransactionEntry};

/// The side that increases an account's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalBalance {
    /// Increased by debits.
    Debit,
    /// Increased by credits.
    Credit,
}

impl NormalBalance {
    /// Balance change caused by `debit` and `credit` totals.
    #[must_use]
    pub fn balance_change(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self {
            Self::Debit => debit - credit,
            Self::Credit => credit - debit,
        }
    }

    /// Returns true if entries on `side` increase the balance.
    #[must_use]
    pub fn increased_by(self, side: EntryType) -> bool {
        matches!(
            (self, side),
            (Self::Debit, EntryType::Debit) | (Self::Credit, EntryType::Credit)
        )
    }
}

impl fmt::Display for NormalBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debit => write!(f, "debit"),
            Self::Credit => write!(f, "credit"),
        }
    }
}

/// Debit and credit totals for one account within a transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountDelta {
    /// Sum of debit entries.
    pub debit: Decimal,
    /// Sum of credit entries.
    pub credit: Decimal,
}

impl AccountDelta {
    /// Net `debit - credit`.
    #[must_use]
    pub fn net(&self) -> Decimal {
        self.debit - self.credit
    }

    /// Change to an account with the given normal side.
    #[must_use]
    pub fn change_for(&self, normal: NormalBalance) -> Decimal {
        normal.balance_change(self.debit, self.credit)
    }
}

/// Per-account deltas of one transaction, aggregated by account id.
///
/// A transaction may touch the same account more than once; aggregation
/// happens before any balance is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalanceDeltas(BTreeMap<AccountId, AccountDelta>);

impl BalanceDeltas {
    /// Aggregate `entries` by account.
    #[must_use]
    pub fn from_entries(entries: &[TransactionEntry]) -> Self {
        let mut deltas: BTreeMap<AccountId, AccountDelta> = BTreeMap::new();
        for entry in entries {
            let delta = deltas.entry(entry.account_id).or_default();
            match entry.entry_type {
                EntryType::Debit => delta.debit += entry.amount,
                EntryType::Credit => delta.credit += entry.amount,
            }
        }
        Self(deltas)
    }

    /// Accounts touched, in id order.
    pub fn account_ids(&self) -> impl Iterator<Item = AccountId> + '_ {
        self.0.keys().copied()
    }

    /// Iterate `(account, delta)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (AccountId, AccountDelta)> + '_ {
        self.0.iter().map(|(id, delta)| (*id, *delta))
    }

    /// Number of distinct accounts touched.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no account is touched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_debit_normal_balance_change() {
        assert_eq!(
            NormalBalance::Debit.balance_change(dec!(100), dec!(30)),
            dec!(70)
        );
    }

    #[test]
    fn test_credit_normal_balance_change() {
        assert_eq!(
            NormalBalance::Credit.balance_change(dec!(100), dec!(30)),
            dec!(-70)
        );
    }

    #[test]
    fn test_increased_by() {
        assert!(NormalBalance::Debit.increased_by(EntryType::Debit));
        assert!(!NormalBalance::Debit.increased_by(EntryType::Credit));
        assert!(NormalBalance::Credit.increased_by(EntryType::Credit));
    }

    #[test]
    fn test_deltas_aggregate_repeated_accounts() {
        let cash = AccountId::new();
        let sales = AccountId::new();
        let entries = vec![
            TransactionEntry::debit(cash, dec!(40)),
            TransactionEntry::debit(cash, dec!(60)),
            TransactionEntry::credit(sales, dec!(100)),
            TransactionEntry::credit(cash, dec!(5)),
            TransactionEntry::debit(sales, dec!(5)),
        ];

        let deltas = BalanceDeltas::from_entries(&entries);
        let by_id: BTreeMap<_, _> = deltas.iter().collect();

        assert_eq!(deltas.len(), 2);
        assert_eq!(by_id[&cash].net(), dec!(95));
        assert_eq!(by_id[&sales].change_for(NormalBalance::Credit), dec!(95));
    }
}
