//! Account-type permission table.
//!
//! A static, versioned mapping from transaction type to the account types
//! allowed on each side, plus an opt-in table of allowed detail types. The
//! built-in table is version 1; a replacement can be supplied as JSON:
//!
//! ```json
//! {
//!   "version": 2,
//!   "types": {
//!     "payment": { "debit": { "only": ["Bank"] }, "credit": { "only": ["Accounts Receivable"] } },
//!     "journal_entry": { "debit": "any", "credit": "any" }
//!   },
//!   "subtypes": {}
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::account::AccountType;
use super::entry::EntryType;
use super::error::LedgerError;
use super::types::TransactionType;

/// Account types allowed on one side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountTypeSet {
    /// Any account type.
    Any,
    /// Only the listed types.
    Only(BTreeSet<AccountType>),
}

impl AccountTypeSet {
    fn of(types: &[AccountType]) -> Self {
        Self::Only(types.iter().copied().collect())
    }

    /// Returns true if `account_type` is allowed.
    #[must_use]
    pub fn allows(&self, account_type: AccountType) -> bool {
        match self {
            Self::Any => true,
            Self::Only(types) => types.contains(&account_type),
        }
    }

    /// The allowed types as a list (every type for `Any`).
    #[must_use]
    pub fn to_vec(&self) -> Vec<AccountType> {
        match self {
            Self::Any => AccountType::ALL.to_vec(),
            Self::Only(types) => types.iter().copied().collect(),
        }
    }
}

/// Per-side account-type rule for one transaction type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideRule {
    /// Types allowed on debit entries.
    pub debit: AccountTypeSet,
    /// Types allowed on credit entries.
    pub credit: AccountTypeSet,
}

impl SideRule {
    /// The set for `side`.
    #[must_use]
    pub fn side(&self, side: EntryType) -> &AccountTypeSet {
        match side {
            EntryType::Debit => &self.debit,
            EntryType::Credit => &self.credit,
        }
    }
}

/// Per-side detail-type rule. An empty list leaves that side unrestricted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtypeRule {
    /// Detail types allowed on debit entries.
    #[serde(default)]
    pub debit: Vec<String>,
    /// Detail types allowed on credit entries.
    #[serde(default)]
    pub credit: Vec<String>,
}

impl SubtypeRule {
    /// The list for `side`.
    #[must_use]
    pub fn side(&self, side: EntryType) -> &[String] {
        match side {
            EntryType::Debit => &self.debit,
            EntryType::Credit => &self.credit,
        }
    }
}

/// Versioned account-type and detail-type permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionTable {
    /// Table version.
    pub version: u32,
    /// Account-type rules; every transaction type used must be mapped.
    pub types: BTreeMap<TransactionType, SideRule>,
    /// Advisory detail-type rules; unmapped transaction types skip the check.
    #[serde(default)]
    pub subtypes: BTreeMap<TransactionType, SubtypeRule>,
}

impl Default for PermissionTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PermissionTable {
    /// Parse a table from JSON.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidPermissionTable` if the JSON does not
    /// describe a table.
    pub fn from_json(json: &str) -> Result<Self, LedgerError> {
        serde_json::from_str(json).map_err(|e| LedgerError::InvalidPermissionTable(e.to_string()))
    }

    /// Account types allowed on `side` of `transaction_type`.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::UnmappedTransactionType` if the table has no
    /// rule for the type.
    pub fn allowed_types(
        &self,
        transaction_type: TransactionType,
        side: EntryType,
    ) -> Result<&AccountTypeSet, LedgerError> {
        self.types
            .get(&transaction_type)
            .map(|rule| rule.side(side))
            .ok_or(LedgerError::UnmappedTransactionType(transaction_type))
    }

    /// Detail types allowed on `side` of `transaction_type`, if restricted.
    #[must_use]
    pub fn allowed_subtypes(
        &self,
        transaction_type: TransactionType,
        side: EntryType,
    ) -> Option<&[String]> {
        self.subtypes
            .get(&transaction_type)
            .map(|rule| rule.side(side))
            .filter(|allowed| !allowed.is_empty())
    }

    /// The built-in version-1 table.
    #[must_use]
    pub fn builtin() -> Self {
        use AccountType::{
            AccountsPayable, AccountsReceivable, Bank, CostOfGoodsSold, CreditCard, Equity,
            Expense, FixedAsset, Income, LongTermLiabilities, OtherAsset, OtherCurrentAsset,
            OtherCurrentLiability, OtherExpense, OtherIncome,
        };

        const PURCHASABLE: &[AccountType] = &[
            Expense,
            OtherExpense,
            CostOfGoodsSold,
            OtherCurrentAsset,
            FixedAsset,
        ];
        const DEPOSIT_SOURCES: &[AccountType] = &[OtherCurrentAsset, Income, OtherIncome, Equity];
        const GENERAL_DEBITS: &[AccountType] = &[
            Bank,
            AccountsReceivable,
            OtherCurrentAsset,
            FixedAsset,
            OtherAsset,
            Expense,
            OtherExpense,
        ];
        const GENERAL_CREDITS: &[AccountType] = &[
            Bank,
            AccountsPayable,
            CreditCard,
            OtherCurrentLiability,
            LongTermLiabilities,
            Equity,
            Income,
            OtherIncome,
        ];

        let rule = |debit: &[AccountType], credit: &[AccountType]| SideRule {
            debit: AccountTypeSet::of(debit),
            credit: AccountTypeSet::of(credit),
        };

        let types = BTreeMap::from([
            (
                TransactionType::SalesInvoice,
                rule(
                    &[AccountsReceivable, CostOfGoodsSold],
                    &[Income, OtherIncome, OtherCurrentAsset],
                ),
            ),
            (
                TransactionType::SalesReceipt,
                rule(&[Bank, OtherCurrentAsset], &[Income, OtherIncome]),
            ),
            (
                TransactionType::Payment,
                rule(&[Bank, OtherCurrentAsset], &[AccountsReceivable]),
            ),
            (TransactionType::Bill, rule(PURCHASABLE, &[AccountsPayable])),
            (
                TransactionType::BillPayment,
                rule(&[AccountsPayable], &[Bank, CreditCard, OtherCurrentAsset]),
            ),
            (
                TransactionType::JournalEntry,
                SideRule {
                    debit: AccountTypeSet::Any,
                    credit: AccountTypeSet::Any,
                },
            ),
            (
                TransactionType::Transfer,
                rule(&[Bank, OtherCurrentAsset], &[Bank, OtherCurrentAsset]),
            ),
            (TransactionType::Deposit, rule(&[Bank], DEPOSIT_SOURCES)),
            (TransactionType::Charge, rule(PURCHASABLE, &[CreditCard])),
            (
                TransactionType::VendorCredit,
                rule(
                    &[AccountsPayable],
                    &[Expense, OtherExpense, CostOfGoodsSold, OtherCurrentAsset],
                ),
            ),
            (
                TransactionType::CustomerCredit,
                rule(&[Income, OtherIncome], &[AccountsReceivable, Bank]),
            ),
            (TransactionType::Check, rule(PURCHASABLE, &[Bank])),
            (TransactionType::CreditCard, rule(PURCHASABLE, &[CreditCard])),
            (
                TransactionType::PurchaseInvoice,
                rule(PURCHASABLE, &[AccountsPayable]),
            ),
            (TransactionType::CashPurchase, rule(PURCHASABLE, &[Bank])),
            (TransactionType::BankDeposit, rule(&[Bank], DEPOSIT_SOURCES)),
            (
                TransactionType::BankWithdrawal,
                rule(&[Expense, OtherExpense], &[Bank]),
            ),
            (
                TransactionType::InventoryAdjustment,
                rule(
                    &[OtherCurrentAsset, CostOfGoodsSold],
                    &[OtherCurrentAsset, CostOfGoodsSold],
                ),
            ),
            (
                TransactionType::CreditRefund,
                rule(&[CreditCard], &[Expense, OtherExpense, OtherCurrentAsset]),
            ),
            (
                TransactionType::GeneralExpense,
                rule(&[Expense, OtherExpense], &[Bank, CreditCard, OtherCurrentAsset]),
            ),
            (
                TransactionType::OtherIncome,
                rule(&[Bank, OtherCurrentAsset], &[OtherIncome]),
            ),
            (
                TransactionType::OtherExpense,
                rule(&[OtherExpense], &[Bank, CreditCard, OtherCurrentAsset]),
            ),
            (
                TransactionType::OwnerContribution,
                rule(&[Bank, OtherCurrentAsset, FixedAsset], &[Equity]),
            ),
            (
                TransactionType::OwnerDrawing,
                rule(&[Equity], &[Bank, OtherCurrentAsset]),
            ),
            (
                TransactionType::PurchaseOrder,
                rule(&[OtherCurrentAsset], &[OtherCurrentLiability]),
            ),
            (
                TransactionType::OtherTransaction,
                rule(GENERAL_DEBITS, GENERAL_CREDITS),
            ),
        ]);

        let subtype_rule = |debit: &[&str], credit: &[&str]| SubtypeRule {
            debit: debit.iter().map(ToString::to_string).collect(),
            credit: credit.iter().map(ToString::to_string).collect(),
        };
        let subtypes = BTreeMap::from([
            (
                TransactionType::Transfer,
                subtype_rule(
                    &["Checking", "Savings", "Money Market", "Cash on hand"],
                    &["Checking", "Savings", "Money Market", "Cash on hand"],
                ),
            ),
            (
                TransactionType::OwnerContribution,
                subtype_rule(&["Checking", "Savings"], &["Owner's Equity"]),
            ),
            (
                TransactionType::OwnerDrawing,
                subtype_rule(&["Owner's Equity"], &["Checking", "Savings"]),
            ),
            (
                TransactionType::InventoryAdjustment,
                subtype_rule(
                    &["Inventory", "Supplies & Materials - COGS"],
                    &["Inventory", "Supplies & Materials - COGS"],
                ),
            ),
        ]);

        Self {
            version: 1,
            types,
            subtypes,
        }
    }
}
