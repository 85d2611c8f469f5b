//! Ledger entry domain types.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::AccountId;

/// Side of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Debit entry (increases assets/expenses, decreases liabilities/equity/income).
    Debit,
    /// Credit entry (decreases assets/expenses, increases liabilities/equity/income).
    Credit,
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debit => write!(f, "debit"),
            Self::Credit => write!(f, "credit"),
        }
    }
}

/// A single line of a transaction.
///
/// Carries exactly one amount tagged as debit or credit, so an entry is never
/// ambiguous about its side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEntry {
    /// The account affected by this entry.
    pub account_id: AccountId,
    /// Whether this is a debit or credit.
    pub entry_type: EntryType,
    /// Amount; must be strictly positive.
    pub amount: Decimal,
    /// Optional description for this line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TransactionEntry {
    /// Debit `amount` to `account_id`.
    #[must_use]
    pub fn debit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            entry_type: EntryType::Debit,
            amount,
            description: None,
        }
    }

    /// Credit `amount` to `account_id`.
    #[must_use]
    pub fn credit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            entry_type: EntryType::Credit,
            amount,
            description: None,
        }
    }

    /// Attach a line description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Debit amount, zero for credit entries.
    #[must_use]
    pub fn debit_amount(&self) -> Decimal {
        match self.entry_type {
            EntryType::Debit => self.amount,
            EntryType::Credit => Decimal::ZERO,
        }
    }

    /// Credit amount, zero for debit entries.
    #[must_use]
    pub fn credit_amount(&self) -> Decimal {
        match self.entry_type {
            EntryType::Debit => Decimal::ZERO,
            EntryType::Credit => self.amount,
        }
    }

    /// Returns the signed amount (positive for debit, negative for credit).
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        self.debit_amount() - self.credit_amount()
    }
}
