//! Transaction classification and totals.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::LedgerError;

/// Transaction type classification.
///
/// Closed enumeration; each type has its own account-type permissions in the
/// [`PermissionTable`](super::permissions::PermissionTable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Customer invoice.
    SalesInvoice,
    /// Sale paid on the spot.
    SalesReceipt,
    /// Customer payment against receivables.
    Payment,
    /// Vendor bill.
    Bill,
    /// Payment of a vendor bill.
    BillPayment,
    /// Manual journal entry.
    JournalEntry,
    /// Transfer between asset accounts.
    Transfer,
    /// Deposit into a bank account.
    Deposit,
    /// Credit card charge.
    Charge,
    /// Credit received from a vendor.
    VendorCredit,
    /// Credit memo issued to a customer.
    CustomerCredit,
    /// Check written.
    Check,
    /// Credit card purchase.
    CreditCard,
    /// Purchase on account.
    PurchaseInvoice,
    /// Purchase paid in cash.
    CashPurchase,
    /// Bank deposit.
    BankDeposit,
    /// Bank withdrawal.
    BankWithdrawal,
    /// Inventory quantity or value adjustment.
    InventoryAdjustment,
    /// Refund to a credit card.
    CreditRefund,
    /// Miscellaneous expense.
    GeneralExpense,
    /// Non-operating income.
    OtherIncome,
    /// Non-operating expense.
    OtherExpense,
    /// Owner puts money into the business.
    OwnerContribution,
    /// Owner takes money out of the business.
    OwnerDrawing,
    /// Purchase order commitment.
    PurchaseOrder,
    /// Anything else.
    OtherTransaction,
}

impl TransactionType {
    /// Every transaction type.
    pub const ALL: [Self; 26] = [
        Self::SalesInvoice,
        Self::SalesReceipt,
        Self::Payment,
        Self::Bill,
        Self::BillPayment,
        Self::JournalEntry,
        Self::Transfer,
        Self::Deposit,
        Self::Charge,
        Self::VendorCredit,
        Self::CustomerCredit,
        Self::Check,
        Self::CreditCard,
        Self::PurchaseInvoice,
        Self::CashPurchase,
        Self::BankDeposit,
        Self::BankWithdrawal,
        Self::InventoryAdjustment,
        Self::CreditRefund,
        Self::GeneralExpense,
        Self::OtherIncome,
        Self::OtherExpense,
        Self::OwnerContribution,
        Self::OwnerDrawing,
        Self::PurchaseOrder,
        Self::OtherTransaction,
    ];

    /// Wire name, e.g. `sales_invoice`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SalesInvoice => "sales_invoice",
            Self::SalesReceipt => "sales_receipt",
            Self::Payment => "payment",
            Self::Bill => "bill",
            Self::BillPayment => "bill_payment",
            Self::JournalEntry => "journal_entry",
            Self::Transfer => "transfer",
            Self::Deposit => "deposit",
            Self::Charge => "charge",
            Self::VendorCredit => "vendor_credit",
            Self::CustomerCredit => "customer_credit",
            Self::Check => "check",
            Self::CreditCard => "credit_card",
            Self::PurchaseInvoice => "purchase_invoice",
            Self::CashPurchase => "cash_purchase",
            Self::BankDeposit => "bank_deposit",
            Self::BankWithdrawal => "bank_withdrawal",
            Self::InventoryAdjustment => "inventory_adjustment",
            Self::CreditRefund => "credit_refund",
            Self::GeneralExpense => "general_expense",
            Self::OtherIncome => "other_income",
            Self::OtherExpense => "other_expense",
            Self::OwnerContribution => "owner_contribution",
            Self::OwnerDrawing => "owner_drawing",
            Self::PurchaseOrder => "purchase_order",
            Self::OtherTransaction => "other_transaction",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| LedgerError::UnknownTransactionType(s.to_string()))
    }
}

/// Debit and credit totals of a set of entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionTotals {
    /// Sum of debit amounts.
    pub total_debits: Decimal,
    /// Sum of credit amounts.
    pub total_credits: Decimal,
}

impl TransactionTotals {
    /// Creates totals from the two sums.
    #[must_use]
    pub fn new(total_debits: Decimal, total_credits: Decimal) -> Self {
        Self {
            total_debits,
            total_credits,
        }
    }

    /// Absolute difference between debits and credits.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        (self.total_debits - self.total_credits).abs()
    }

    /// Returns true if the difference is within `tolerance`.
    #[must_use]
    pub fn is_balanced(&self, tolerance: Decimal) -> bool {
        self.difference() <= tolerance
    }
}
