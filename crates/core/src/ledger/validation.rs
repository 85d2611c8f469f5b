//! Ledger entry validation.
//!
//! Pure checks run before any mutation. Calling [`LedgerValidator::validate`]
//! any number of times has no side effects, so it doubles as a dry run.

use std::collections::HashMap;

use rust_decimal::Decimal;
use tally_shared::types::{AccountId, TenantId};

use super::account::Account;
use super::entry::TransactionEntry;
use super::error::LedgerError;
use super::permissions::PermissionTable;
use super::types::{TransactionTotals, TransactionType};

/// Largest accepted difference between total debits and total credits.
pub const BALANCE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 3);

/// Read access to accounts by id.
pub trait AccountLookup {
    /// The account with `id`, if known.
    fn find(&self, id: AccountId) -> Option<&Account>;
}

impl AccountLookup for HashMap<AccountId, Account> {
    fn find(&self, id: AccountId) -> Option<&Account> {
        self.get(&id)
    }
}

impl AccountLookup for [Account] {
    fn find(&self, id: AccountId) -> Option<&Account> {
        self.iter().find(|a| a.id == id)
    }
}

impl AccountLookup for Vec<Account> {
    fn find(&self, id: AccountId) -> Option<&Account> {
        self.as_slice().find(id)
    }
}

/// Validates proposed transactions against balance and permission rules.
///
/// Checks run in this order and the first failure is returned:
/// 1. At least two entries
/// 2. Every amount strictly positive
/// 3. Debits equal credits within the tolerance
/// 4. Every account exists, belongs to the tenant and is active (the
///    activity check is skipped by [`LedgerValidator::for_history`])
/// 5. Every account type is allowed on its side
/// 6. Every detail type is allowed on its side (only for mapped types)
#[derive(Debug, Clone, Copy)]
pub struct LedgerValidator<'a> {
    permissions: &'a PermissionTable,
    tolerance: Decimal,
    require_active: bool,
}

impl<'a> LedgerValidator<'a> {
    /// Validator using [`BALANCE_TOLERANCE`].
    #[must_use]
    pub fn new(permissions: &'a PermissionTable) -> Self {
        Self {
            permissions,
            tolerance: BALANCE_TOLERANCE,
            require_active: true,
        }
    }

    /// Re-check already posted transactions.
    ///
    /// Accounts may be deactivated after they were posted to, so
    /// inactive accounts are accepted.
    #[must_use]
    pub fn for_history(mut self) -> Self {
        self.require_active = false;
        self
    }

    /// Override the balancing tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: Decimal) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// The permission table in use.
    #[must_use]
    pub fn permissions(&self) -> &'a PermissionTable {
        self.permissions
    }

    /// Validate `entries` for a `transaction_type` transaction of `tenant_id`.
    ///
    /// # Errors
    ///
    /// Returns the first failed check as a `LedgerError`.
    pub fn validate<L>(
        &self,
        tenant_id: TenantId,
        transaction_type: TransactionType,
        entries: &[TransactionEntry],
        accounts: &L,
    ) -> Result<TransactionTotals, LedgerError>
    where
        L: AccountLookup + ?Sized,
    {
        let totals = self.check_balance(entries)?;

        for entry in entries {
            let account = accounts
                .find(entry.account_id)
                .filter(|a| a.tenant_id == tenant_id)
                .ok_or(LedgerError::AccountNotFound(entry.account_id))?;

            if self.require_active && !account.is_active {
                return Err(LedgerError::InactiveAccount(account.id));
            }

            let allowed = self
                .permissions
                .allowed_types(transaction_type, entry.entry_type)?;
            if !allowed.allows(account.account_type) {
                return Err(LedgerError::AccountTypeNotAllowed {
                    account_id: account.id,
                    transaction_type,
                    side: entry.entry_type,
                    actual_type: account.account_type,
                    allowed_types: allowed.to_vec(),
                });
            }

            if let Some(subtypes) = self
                .permissions
                .allowed_subtypes(transaction_type, entry.entry_type)
                && !subtypes.iter().any(|s| *s == account.account_subtype)
            {
                return Err(LedgerError::AccountSubtypeNotAllowed {
                    account_id: account.id,
                    transaction_type,
                    side: entry.entry_type,
                    actual_subtype: account.account_subtype.clone(),
                    allowed_subtypes: subtypes.to_vec(),
                });
            }
        }

        Ok(totals)
    }

    /// Entry-count, amount and balance checks only; no account access.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientEntries`, `ZeroAmount`, `NegativeAmount` or
    /// `Unbalanced`.
    pub fn check_balance(
        &self,
        entries: &[TransactionEntry],
    ) -> Result<TransactionTotals, LedgerError> {
        if entries.len() < 2 {
            return Err(LedgerError::InsufficientEntries {
                count: entries.len(),
            });
        }

        for entry in entries {
            if entry.amount.is_zero() {
                return Err(LedgerError::ZeroAmount {
                    account_id: entry.account_id,
                });
            }
            if entry.amount.is_sign_negative() {
                return Err(LedgerError::NegativeAmount {
                    account_id: entry.account_id,
                    amount: entry.amount,
                });
            }
        }

        let totals = TransactionTotals::new(
            entries.iter().map(TransactionEntry::debit_amount).sum(),
            entries.iter().map(TransactionEntry::credit_amount).sum(),
        );
        if !totals.is_balanced(self.tolerance) {
            return Err(LedgerError::Unbalanced {
                total_debits: totals.total_debits,
                total_credits: totals.total_credits,
            });
        }

        Ok(totals)
    }
}
