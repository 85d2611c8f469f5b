//! Property-based tests for ledger entry validation.
//!
//! - Balanced entries with positive amounts always pass the balance check
//! - Any imbalance above the tolerance is rejected with both totals
//! - Non-positive amounts are rejected regardless of balance

use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::AccountId;

use super::entry::TransactionEntry;
use super::error::LedgerError;
use super::permissions::PermissionTable;
use super::validation::{BALANCE_TOLERANCE, LedgerValidator};

/// Strategy to generate a valid positive amount (> 0).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate a non-positive amount.
fn non_positive_amount() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|cents| Decimal::new(-cents, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_balanced_entries_pass(
        debits in prop::collection::vec(positive_amount(), 1..6),
    ) {
        let table = PermissionTable::builtin();
        let total: Decimal = debits.iter().copied().sum();
        let mut entries: Vec<TransactionEntry> = debits
            .into_iter()
            .map(|amount| TransactionEntry::debit(AccountId::new(), amount))
            .collect();
        entries.push(TransactionEntry::credit(AccountId::new(), total));

        let totals = LedgerValidator::new(&table).check_balance(&entries).unwrap();
        prop_assert_eq!(totals.total_debits, total);
        prop_assert_eq!(totals.total_credits, total);
    }

    #[test]
    fn prop_imbalance_rejected(
        amount in positive_amount(),
        skew in positive_amount(),
    ) {
        let table = PermissionTable::builtin();
        let entries = vec![
            TransactionEntry::debit(AccountId::new(), amount + skew),
            TransactionEntry::credit(AccountId::new(), amount),
        ];
        prop_assume!(skew > BALANCE_TOLERANCE);

        let err = LedgerValidator::new(&table).check_balance(&entries).unwrap_err();
        prop_assert_eq!(
            err,
            LedgerError::Unbalanced { total_debits: amount + skew, total_credits: amount }
        );
    }

    #[test]
    fn prop_non_positive_amount_rejected(
        bad in non_positive_amount(),
        good in positive_amount(),
        bad_is_debit in any::<bool>(),
    ) {
        let table = PermissionTable::builtin();
        let bad_account = AccountId::new();
        let entries = if bad_is_debit {
            vec![
                TransactionEntry::debit(bad_account, bad),
                TransactionEntry::credit(AccountId::new(), good),
            ]
        } else {
            vec![
                TransactionEntry::debit(AccountId::new(), good),
                TransactionEntry::credit(bad_account, bad),
            ]
        };

        let err = LedgerValidator::new(&table).check_balance(&entries).unwrap_err();
        let rejected = matches!(
            err,
            LedgerError::ZeroAmount { account_id } | LedgerError::NegativeAmount { account_id, .. }
                if account_id == bad_account
        );
        prop_assert!(rejected);
    }
}
