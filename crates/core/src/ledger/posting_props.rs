//! Property-based tests for posting, reversal and replay.
//!
//! - Incremental posting/voiding equals full replay of the same log
//! - Recalculation is idempotent
//! - Post followed by reverse restores balances exactly

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::TenantId;

use super::account::{Account, AccountType};
use super::entry::TransactionEntry;
use super::posting::PostingEngine;
use super::recalculation::RecalculationEngine;
use super::transaction::Transaction;
use super::types::TransactionType;

/// Strategy to generate positive amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate signed opening balances.
fn opening_balance() -> impl Strategy<Value = Decimal> {
    (-500_000i64..500_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

#[derive(Debug, Clone)]
enum Op {
    /// Post a transaction debiting one account and crediting two.
    Post {
        debit: usize,
        credit_a: usize,
        credit_b: usize,
        amount_a: Decimal,
        amount_b: Decimal,
        day: u32,
    },
    /// Void the n-th transaction of the log (modulo its length).
    Void(usize),
}

fn op_strategy(accounts: usize) -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (
            0..accounts,
            0..accounts,
            0..accounts,
            positive_amount(),
            positive_amount(),
            1u32..28,
        )
            .prop_map(|(debit, credit_a, credit_b, amount_a, amount_b, day)| Op::Post {
                debit,
                credit_a,
                credit_b,
                amount_a,
                amount_b,
                day,
            }),
        1 => any::<usize>().prop_map(Op::Void),
    ]
}

const TYPES: [(AccountType, &str); 5] = [
    (AccountType::Bank, "Checking"),
    (AccountType::AccountsReceivable, "Accounts Receivable (A/R)"),
    (AccountType::Income, "Sales of Product Income"),
    (AccountType::Expense, "Travel"),
    (AccountType::CreditCard, "Credit Card"),
];

fn chart(tenant: TenantId, openings: &[Decimal]) -> Vec<Account> {
    TYPES
        .iter()
        .zip(openings)
        .map(|((t, s), opening)| Account::new(tenant, t.as_str(), *t, *s, *opening).unwrap())
        .collect()
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap()
}

fn write_back(accounts: &mut [Account], updated: Vec<Account>) {
    for account in updated {
        if let Some(slot) = accounts.iter_mut().find(|a| a.id == account.id) {
            *slot = account;
        }
    }
}

fn balances(accounts: &[Account]) -> Vec<Decimal> {
    accounts.iter().map(|a| a.current_balance).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_incremental_equals_replay(
        openings in prop::collection::vec(opening_balance(), TYPES.len()),
        ops in prop::collection::vec(op_strategy(TYPES.len()), 1..30),
    ) {
        let tenant = TenantId::new();
        let mut accounts = chart(tenant, &openings);
        let mut log: Vec<Transaction> = Vec::new();

        for op in ops {
            match op {
                Op::Post { debit, credit_a, credit_b, amount_a, amount_b, day } => {
                    let tx = Transaction::draft(
                        tenant,
                        TransactionType::JournalEntry,
                        NaiveDate::from_ymd_opt(2026, 5, day).unwrap(),
                        "generated",
                        vec![
                            TransactionEntry::debit(accounts[debit].id, amount_a + amount_b),
                            TransactionEntry::credit(accounts[credit_a].id, amount_a),
                            TransactionEntry::credit(accounts[credit_b].id, amount_b),
                        ],
                        now(),
                    );
                    let outcome = PostingEngine::post(&tx, &accounts, now()).unwrap();
                    write_back(&mut accounts, outcome.accounts);
                    log.push(outcome.transaction);
                }
                Op::Void(n) => {
                    if log.is_empty() {
                        continue;
                    }
                    let i = n % log.len();
                    if !log[i].is_posted() {
                        continue;
                    }
                    let outcome = PostingEngine::void(&log[i], &accounts, "generated", now()).unwrap();
                    write_back(&mut accounts, outcome.accounts);
                    log[i] = outcome.transaction;
                }
            }
        }

        let replayed = RecalculationEngine::recalculate(&accounts, &log).unwrap();
        prop_assert_eq!(balances(&replayed.accounts), balances(&accounts));

        let again = RecalculationEngine::recalculate(&replayed.accounts, &log).unwrap();
        prop_assert_eq!(&again, &replayed);
        prop_assert!(RecalculationEngine::drift(&accounts, &replayed.accounts).is_empty());
    }

    #[test]
    fn prop_post_then_reverse_restores_exactly(
        openings in prop::collection::vec(opening_balance(), TYPES.len()),
        debit in 0..TYPES.len(),
        credit in 0..TYPES.len(),
        amount in positive_amount(),
    ) {
        let tenant = TenantId::new();
        let accounts = chart(tenant, &openings);
        let tx = Transaction::draft(
            tenant,
            TransactionType::JournalEntry,
            NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
            "generated",
            vec![
                TransactionEntry::debit(accounts[debit].id, amount),
                TransactionEntry::credit(accounts[credit].id, amount),
            ],
            now(),
        );

        let outcome = PostingEngine::post(&tx, &accounts, now()).unwrap();
        let mut after = accounts.clone();
        write_back(&mut after, outcome.accounts);

        let reversed = PostingEngine::reverse(&outcome.transaction, &after).unwrap();
        write_back(&mut after, reversed);

        prop_assert_eq!(balances(&after), balances(&accounts));
    }
}
