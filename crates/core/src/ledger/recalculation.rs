//! Recalculation engine: rebuilds balances from the transaction log.
//!
//! Resets every account to its opening balance, then replays posted
//! transactions in date order using the same directional rule as posting.
//! Running it twice with no intervening change yields identical balances,
//! and the result must equal the incrementally maintained state.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, TransactionId};
use tracing::{info, warn};

use super::account::{Account, AccountCategory};
use super::balance::{BalanceDeltas, NormalBalance};
use super::error::LedgerError;
use super::posting::PostingEngine;
use super::transaction::Transaction;
use super::validation::BALANCE_TOLERANCE;

/// Category totals and replay counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecalculationSummary {
    /// Sum of asset balances.
    pub total_assets: Decimal,
    /// Sum of liability balances.
    pub total_liabilities: Decimal,
    /// Sum of equity balances.
    pub total_equity: Decimal,
    /// Sum of income balances.
    pub total_income: Decimal,
    /// Sum of expense balances (cost of goods sold included).
    pub total_expense: Decimal,
    /// Income minus expense.
    pub net_income: Decimal,
    /// Sum of balances of debit-normal accounts.
    pub total_debit_balances: Decimal,
    /// Sum of balances of credit-normal accounts.
    pub total_credit_balances: Decimal,
    /// Whether the trial balance agrees within tolerance.
    pub is_balanced: bool,
    /// Posted transactions replayed.
    pub transactions_replayed: usize,
    /// Accounts reset to their opening balance.
    pub accounts_reset: usize,
}

/// Rebuilt accounts plus their summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recalculation {
    /// Accounts with replayed balances, in input order.
    pub accounts: Vec<Account>,
    /// Totals over the rebuilt accounts.
    pub summary: RecalculationSummary,
}

/// An account whose stored balance differs from the replayed one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDrift {
    /// The account.
    pub account_id: AccountId,
    /// Account name.
    pub name: String,
    /// Balance before recalculation.
    pub stored: Decimal,
    /// Balance after recalculation.
    pub replayed: Decimal,
    /// `replayed - stored`.
    pub difference: Decimal,
}

/// Stateless service for full balance replay.
pub struct RecalculationEngine;

impl RecalculationEngine {
    /// Rebuild every account's balance from `transactions`.
    ///
    /// Only posted transactions are replayed, ordered by transaction date
    /// with ties kept in input order.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if a posted transaction references an
    /// account missing from `accounts` (or owned by another tenant).
    pub fn recalculate(
        accounts: &[Account],
        transactions: &[Transaction],
    ) -> Result<Recalculation, LedgerError> {
        let mut rebuilt: Vec<Account> = accounts
            .iter()
            .cloned()
            .map(|mut account| {
                account.current_balance = account.opening_balance;
                account.last_transaction_date = None;
                account
            })
            .collect();
        let index: HashMap<AccountId, usize> = rebuilt
            .iter()
            .enumerate()
            .map(|(i, account)| (account.id, i))
            .collect();

        let mut posted: Vec<&Transaction> =
            transactions.iter().filter(|t| t.is_posted()).collect();
        posted.sort_by_key(|t| t.transaction_date);

        for transaction in &posted {
            let deltas = BalanceDeltas::from_entries(&transaction.entries);
            let slots = deltas
                .iter()
                .map(|(account_id, delta)| {
                    index
                        .get(&account_id)
                        .copied()
                        .filter(|i| rebuilt[*i].tenant_id == transaction.tenant_id)
                        .map(|i| (i, delta))
                        .ok_or(LedgerError::AccountNotFound(account_id))
                })
                .collect::<Result<Vec<_>, _>>()?;

            for (i, delta) in slots {
                let account = &mut rebuilt[i];
                PostingEngine::apply_delta(account, &delta);
                account.last_transaction_date = account
                    .last_transaction_date
                    .max(Some(transaction.transaction_date));
            }
        }

        let summary = Self::summarize(&rebuilt, posted.len());

        info!(
            accounts_reset = summary.accounts_reset,
            transactions_replayed = summary.transactions_replayed,
            net_income = %summary.net_income,
            is_balanced = summary.is_balanced,
            "Balances recalculated"
        );
        if !summary.is_balanced {
            warn!(
                total_debit_balances = %summary.total_debit_balances,
                total_credit_balances = %summary.total_credit_balances,
                "Trial balance does not agree"
            );
        }

        Ok(Recalculation {
            accounts: rebuilt,
            summary,
        })
    }

    /// Reset each account's `last_transaction_date` to the latest posted
    /// transaction in `transactions` that touches it, ignoring `excluded`.
    ///
    /// Reversal cannot roll the date back on its own; callers run this with
    /// the log after a void or delete so the stored value matches a replay.
    pub fn restamp(
        accounts: &mut [Account],
        transactions: &[Transaction],
        excluded: &[TransactionId],
    ) {
        for account in accounts.iter_mut() {
            account.last_transaction_date = transactions
                .iter()
                .filter(|t| t.is_posted() && t.tenant_id == account.tenant_id)
                .filter(|t| !excluded.contains(&t.id))
                .filter(|t| t.entries.iter().any(|e| e.account_id == account.id))
                .map(|t| t.transaction_date)
                .max();
        }
    }

    /// Category and trial-balance totals over `accounts`.
    #[must_use]
    pub fn summarize(accounts: &[Account], transactions_replayed: usize) -> RecalculationSummary {
        let by_category = |category: AccountCategory| -> Decimal {
            accounts
                .iter()
                .filter(|a| a.category() == category)
                .map(|a| a.current_balance)
                .sum()
        };
        let by_side = |side: NormalBalance| -> Decimal {
            accounts
                .iter()
                .filter(|a| a.normal_balance == side)
                .map(|a| a.current_balance)
                .sum()
        };

        let total_income = by_category(AccountCategory::Income);
        let total_expense = by_category(AccountCategory::Expense);
        let total_debit_balances = by_side(NormalBalance::Debit);
        let total_credit_balances = by_side(NormalBalance::Credit);

        RecalculationSummary {
            total_assets: by_category(AccountCategory::Asset),
            total_liabilities: by_category(AccountCategory::Liability),
            total_equity: by_category(AccountCategory::Equity),
            total_income,
            total_expense,
            net_income: total_income - total_expense,
            total_debit_balances,
            total_credit_balances,
            is_balanced: (total_debit_balances - total_credit_balances).abs() <= BALANCE_TOLERANCE,
            transactions_replayed,
            accounts_reset: accounts.len(),
        }
    }

    /// Accounts whose balance in `after` differs from `before`.
    #[must_use]
    pub fn drift(before: &[Account], after: &[Account]) -> Vec<BalanceDrift> {
        let stored: HashMap<AccountId, Decimal> = before
            .iter()
            .map(|a| (a.id, a.current_balance))
            .collect();

        after
            .iter()
            .filter_map(|account| {
                let previous = stored.get(&account.id).copied().unwrap_or_default();
                (previous != account.current_balance).then(|| BalanceDrift {
                    account_id: account.id,
                    name: account.name.clone(),
                    stored: previous,
                    replayed: account.current_balance,
                    difference: account.current_balance - previous,
                })
            })
            .collect()
    }
}
