//! Chart-of-accounts taxonomy and the account record.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, TenantId};

use super::balance::NormalBalance;
use super::error::LedgerError;

/// Account type from the fixed chart-of-accounts taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AccountType {
    /// Checking, savings, cash on hand.
    #[serde(rename = "Bank")]
    Bank,
    /// Money owed by customers.
    #[serde(rename = "Accounts Receivable")]
    AccountsReceivable,
    /// Inventory, prepaid expenses, undeposited funds and similar.
    #[serde(rename = "Other Current Asset")]
    OtherCurrentAsset,
    /// Buildings, vehicles, equipment.
    #[serde(rename = "Fixed Asset")]
    FixedAsset,
    /// Long-term non-fixed assets.
    #[serde(rename = "Other Asset")]
    OtherAsset,
    /// Money owed to vendors.
    #[serde(rename = "Accounts Payable", alias = "Accounts payable (A/P)")]
    AccountsPayable,
    /// Credit card balances.
    #[serde(rename = "Credit Card")]
    CreditCard,
    /// Short-term liabilities other than payables.
    #[serde(rename = "Other Current Liability")]
    OtherCurrentLiability,
    /// Notes and loans due after a year.
    #[serde(rename = "Long Term Liabilities", alias = "Long Term Liability")]
    LongTermLiabilities,
    /// Owner and shareholder equity.
    #[serde(rename = "Equity")]
    Equity,
    /// Primary operating income.
    #[serde(rename = "Income")]
    Income,
    /// Interest, dividends and other non-operating income.
    #[serde(rename = "Other Income")]
    OtherIncome,
    /// Direct cost of goods and services sold.
    #[serde(rename = "Cost of Goods Sold")]
    CostOfGoodsSold,
    /// Operating expenses.
    #[serde(rename = "Expense")]
    Expense,
    /// Non-operating expenses.
    #[serde(rename = "Other Expense")]
    OtherExpense,
}

/// Reporting category an account type rolls up into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountCategory {
    /// Balance sheet: assets.
    Asset,
    /// Balance sheet: liabilities.
    Liability,
    /// Balance sheet: equity.
    Equity,
    /// Profit and loss: income.
    Income,
    /// Profit and loss: expense (includes cost of goods sold).
    Expense,
}

impl AccountType {
    /// Every account type, in chart order.
    pub const ALL: [Self; 15] = [
        Self::Bank,
        Self::AccountsReceivable,
        Self::OtherCurrentAsset,
        Self::FixedAsset,
        Self::OtherAsset,
        Self::AccountsPayable,
        Self::CreditCard,
        Self::OtherCurrentLiability,
        Self::LongTermLiabilities,
        Self::Equity,
        Self::Income,
        Self::OtherIncome,
        Self::CostOfGoodsSold,
        Self::Expense,
        Self::OtherExpense,
    ];

    /// Display name used in the chart of accounts.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bank => "Bank",
            Self::AccountsReceivable => "Accounts Receivable",
            Self::OtherCurrentAsset => "Other Current Asset",
            Self::FixedAsset => "Fixed Asset",
            Self::OtherAsset => "Other Asset",
            Self::AccountsPayable => "Accounts Payable",
            Self::CreditCard => "Credit Card",
            Self::OtherCurrentLiability => "Other Current Liability",
            Self::LongTermLiabilities => "Long Term Liabilities",
            Self::Equity => "Equity",
            Self::Income => "Income",
            Self::OtherIncome => "Other Income",
            Self::CostOfGoodsSold => "Cost of Goods Sold",
            Self::Expense => "Expense",
            Self::OtherExpense => "Other Expense",
        }
    }

    /// Reporting category.
    #[must_use]
    pub fn category(self) -> AccountCategory {
        match self {
            Self::Bank
            | Self::AccountsReceivable
            | Self::OtherCurrentAsset
            | Self::FixedAsset
            | Self::OtherAsset => AccountCategory::Asset,
            Self::AccountsPayable
            | Self::CreditCard
            | Self::OtherCurrentLiability
            | Self::LongTermLiabilities => AccountCategory::Liability,
            Self::Equity => AccountCategory::Equity,
            Self::Income | Self::OtherIncome => AccountCategory::Income,
            Self::CostOfGoodsSold | Self::Expense | Self::OtherExpense => {
                AccountCategory::Expense
            }
        }
    }

    /// Side that increases an account of this type.
    #[must_use]
    pub fn normal_balance(self) -> NormalBalance {
        match self.category() {
            AccountCategory::Asset | AccountCategory::Expense => NormalBalance::Debit,
            AccountCategory::Liability | AccountCategory::Equity | AccountCategory::Income => {
                NormalBalance::Credit
            }
        }
    }

    /// Detail types (subtypes) permitted for this account type.
    #[must_use]
    pub fn subtypes(self) -> &'static [&'static str] {
        match self {
            Self::Bank => &[
                "Cash on hand",
                "Checking",
                "Money Market",
                "Rents Held in Trust",
                "Savings",
                "Trust account",
            ],
            Self::AccountsReceivable => &["Accounts Receivable (A/R)"],
            Self::OtherCurrentAsset => &[
                "Allowance for Bad Debts",
                "Development Costs",
                "Employee Cash Advances",
                "Inventory",
                "Investment - Mortgage/Real Estate Loans",
                "Investment - Tax-Exempt Securities",
                "Investment - U.S. Government Obligations",
                "Investments - Other",
                "Loans To Officers",
                "Loans to Others",
                "Loans to Stockholders",
                "Other Current Assets",
                "Prepaid Expenses",
                "Retainage",
                "Undeposited Funds",
            ],
            Self::FixedAsset => &[
                "Accumulated Amortization",
                "Accumulated Depletion",
                "Accumulated Depreciation",
                "Buildings",
                "Depletable Assets",
                "Fixed Asset Computers",
                "Fixed Asset Copiers",
                "Fixed Asset Furniture",
                "Fixed Asset Other Tools Equipment",
                "Fixed Asset Phone",
                "Fixed Asset Photo Video",
                "Fixed Asset Software",
                "Furniture & Fixtures",
                "Intangible Assets",
                "Land",
                "Leasehold Improvements",
                "Machinery & Equipment",
                "Other fixed assets",
                "Vehicles",
            ],
            Self::OtherAsset => &[
                "Accumulated Amortization of Other Assets",
                "Goodwill",
                "Lease Buyout",
                "Licenses",
                "Organizational Costs",
                "Other Long-term Assets",
                "Security Deposits",
            ],
            Self::AccountsPayable => &["Accounts Payable (A/P)"],
            Self::CreditCard => &["Credit Card"],
            Self::OtherCurrentLiability => &[
                "Deferred Revenue",
                "Federal Income Tax Payable",
                "Insurance Payable",
                "Line of Credit",
                "Loan Payable",
                "Other Current Liabilities",
                "Payroll Clearing",
                "Payroll Tax Payable",
                "Prepaid Expenses Payable",
                "Rents in trust - Liability",
                "Sales Tax Payable",
                "State/Local Income Tax Payable",
                "Trust Accounts - Liabilities",
                "Undistributed Tips",
            ],
            Self::LongTermLiabilities => &[
                "Notes Payable",
                "Other Long Term Liabilities",
                "Shareholder Notes Payable",
            ],
            Self::Equity => &[
                "Accumulated Adjustment",
                "Common Stock",
                "Estimated Taxes",
                "Health Insurance Premium",
                "Health Savings Account Contribution",
                "Opening Balance Equity",
                "Owner's Equity",
                "Paid-In Capital or Surplus",
                "Partner Contributions",
                "Partner Distributions",
                "Partner's Equity",
                "Personal Expense",
                "Personal Income",
                "Preferred Stock",
                "Retained Earnings",
                "Treasury Stock",
            ],
            Self::Income => &[
                "Discounts/Refunds Given",
                "Non-Profit Income",
                "Other Primary Income",
                "Sales of Product Income",
                "Service/Fee Income",
                "Unapplied Cash Payment Income",
            ],
            Self::OtherIncome => &[
                "Dividend Income",
                "Interest Earned",
                "Other Investment Income",
                "Other Miscellaneous Income",
                "Tax-Exempt Interest",
            ],
            Self::CostOfGoodsSold => &[
                "Cost of labor - COS",
                "Equipment Rental - COS",
                "Other Costs of Services - COS",
                "Shipping, Freight & Delivery - COS",
                "Supplies & Materials - COGS",
            ],
            Self::Expense => &[
                "Advertising/Promotional",
                "Auto",
                "Bad Debts",
                "Bank Charges",
                "Charitable Contributions",
                "Communication",
                "Cost of Labor",
                "Dues & subscriptions",
                "Entertainment",
                "Entertainment Meals",
                "Equipment Rental",
                "Finance costs",
                "Insurance",
                "Interest Paid",
                "Legal & Professional Fees",
                "Office/General Administrative Expenses",
                "Other Business Expenses",
                "Other Miscellaneous Service Cost",
                "Payroll Expenses",
                "Payroll Tax Expenses",
                "Payroll Wage Expenses",
                "Promotional Meals",
                "Rent or Lease of Buildings",
                "Repair & Maintenance",
                "Shipping, Freight & Delivery",
                "Supplies & Materials",
                "Taxes Paid",
                "Travel",
                "Travel Meals",
                "Unapplied Cash Bill Payment Expense",
                "Utilities",
            ],
            Self::OtherExpense => &[
                "Amortization",
                "Depreciation",
                "Exchange Gain or Loss",
                "Gas And Fuel",
                "Home Office",
                "Homeowner Rental Insurance",
                "Mortgage Interest Home Office",
                "Other Home Office Expenses",
                "Other Miscellaneous Expense",
                "Other Vehicle Expenses",
                "Parking and Tolls",
                "Penalties & Settlements",
                "Property Tax Home Office",
                "Rent and Lease Home Office",
                "Repairs and Maintenance Home Office",
                "Utilities Home Office",
                "Vehicle",
                "Vehicle Insurance",
                "Vehicle Lease",
                "Vehicle Loan",
                "Vehicle Loan Interest",
                "Vehicle Registration",
                "Vehicle Repairs",
                "Wash and Road Services",
            ],
        }
    }

    /// Returns true if `subtype` is a detail type of this account type.
    #[must_use]
    pub fn allows_subtype(self, subtype: &str) -> bool {
        self.subtypes().contains(&subtype)
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| LedgerError::UnknownAccountType(s.to_string()))
    }
}

/// A chart-of-accounts entry.
///
/// Balance fields are owned by the posting and recalculation engines; all
/// other fields are metadata maintained elsewhere. On load the normal
/// balance side is derived from the account type; a stored side that
/// disagrees is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AccountRecord")]
pub struct Account {
    /// Account identifier.
    pub id: AccountId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Display name.
    pub name: String,
    /// Classification.
    pub account_type: AccountType,
    /// Detail type, constrained by `account_type`.
    pub account_subtype: String,
    /// Side that increases the balance, derived from `account_type`.
    pub normal_balance: NormalBalance,
    /// Balance before any posted transaction.
    pub opening_balance: Decimal,
    /// Balance after every posted transaction.
    pub current_balance: Decimal,
    /// Date of the latest posted transaction touching the account.
    pub last_transaction_date: Option<NaiveDate>,
    /// Inactive accounts cannot receive new postings.
    pub is_active: bool,
    /// One of the tenant's system accounts.
    pub is_default: bool,
}

/// Wire shape of [`Account`]; `normal_balance` is optional.
#[derive(Deserialize)]
struct AccountRecord {
    id: AccountId,
    tenant_id: TenantId,
    name: String,
    account_type: AccountType,
    account_subtype: String,
    #[serde(default)]
    normal_balance: Option<NormalBalance>,
    #[serde(default)]
    opening_balance: Decimal,
    #[serde(default)]
    current_balance: Decimal,
    #[serde(default)]
    last_transaction_date: Option<NaiveDate>,
    #[serde(default = "default_true")]
    is_active: bool,
    #[serde(default)]
    is_default: bool,
}

impl TryFrom<AccountRecord> for Account {
    type Error = LedgerError;

    fn try_from(record: AccountRecord) -> Result<Self, Self::Error> {
        let expected = record.account_type.normal_balance();
        if let Some(stored) = record.normal_balance
            && stored != expected
        {
            return Err(LedgerError::NormalBalanceMismatch {
                account_type: record.account_type,
                expected,
                normal_balance: stored,
            });
        }

        Ok(Self {
            id: record.id,
            tenant_id: record.tenant_id,
            name: record.name,
            account_type: record.account_type,
            account_subtype: record.account_subtype,
            normal_balance: expected,
            opening_balance: record.opening_balance,
            current_balance: record.current_balance,
            last_transaction_date: record.last_transaction_date,
            is_active: record.is_active,
            is_default: record.is_default,
        })
    }
}

fn default_true() -> bool {
    true
}

impl Account {
    /// Create an active account whose current balance equals its opening
    /// balance.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidAccountSubtype` if `subtype` is not a
    /// detail type of `account_type`.
    pub fn new(
        tenant_id: TenantId,
        name: impl Into<String>,
        account_type: AccountType,
        subtype: impl Into<String>,
        opening_balance: Decimal,
    ) -> Result<Self, LedgerError> {
        let account_subtype = subtype.into();
        if !account_type.allows_subtype(&account_subtype) {
            return Err(LedgerError::InvalidAccountSubtype {
                account_type,
                subtype: account_subtype,
            });
        }

        Ok(Self {
            id: AccountId::new(),
            tenant_id,
            name: name.into(),
            account_type,
            account_subtype,
            normal_balance: account_type.normal_balance(),
            opening_balance,
            current_balance: opening_balance,
            last_transaction_date: None,
            is_active: true,
            is_default: false,
        })
    }

    /// Mark as one of the tenant's system accounts.
    #[must_use]
    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Reporting category.
    #[must_use]
    pub fn category(&self) -> AccountCategory {
        self.account_type.category()
    }
}

/// The tenant's default accounts used by document workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemAccounts {
    /// Default Accounts Receivable.
    pub accounts_receivable: AccountId,
    /// Default income account for invoice lines.
    pub income: AccountId,
    /// Default Cost of Goods Sold.
    pub cost_of_goods_sold: AccountId,
    /// Inventory asset (Other Current Asset / "Inventory").
    pub inventory: AccountId,
    /// Default deposit account.
    pub bank: AccountId,
}

impl SystemAccounts {
    /// Pick the tenant's default accounts.
    ///
    /// Active accounts flagged `is_default` win; otherwise the first active
    /// account of the right type is used.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::MissingSystemAccount` naming the first type for
    /// which no active account exists.
    pub fn resolve(accounts: &[Account]) -> Result<Self, LedgerError> {
        let pick = |account_type: AccountType, subtype: Option<&str>| {
            let candidates = || {
                accounts.iter().filter(move |a| {
                    a.is_active
                        && a.account_type == account_type
                        && subtype.is_none_or(|s| a.account_subtype == s)
                })
            };
            candidates()
                .find(|a| a.is_default)
                .or_else(|| candidates().next())
                .map(|a| a.id)
                .ok_or(LedgerError::MissingSystemAccount(account_type))
        };

        Ok(Self {
            accounts_receivable: pick(AccountType::AccountsReceivable, None)?,
            income: pick(AccountType::Income, None)?,
            cost_of_goods_sold: pick(AccountType::CostOfGoodsSold, None)?,
            inventory: pick(AccountType::OtherCurrentAsset, Some("Inventory"))?,
            bank: pick(AccountType::Bank, None)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use rust_decimal_macros::dec;

    use super::*;

    #[rstest]
    #[case(AccountType::Bank, NormalBalance::Debit, AccountCategory::Asset)]
    #[case(AccountType::AccountsReceivable, NormalBalance::Debit, AccountCategory::Asset)]
    #[case(AccountType::AccountsPayable, NormalBalance::Credit, AccountCategory::Liability)]
    #[case(AccountType::LongTermLiabilities, NormalBalance::Credit, AccountCategory::Liability)]
    #[case(AccountType::Equity, NormalBalance::Credit, AccountCategory::Equity)]
    #[case(AccountType::OtherIncome, NormalBalance::Credit, AccountCategory::Income)]
    #[case(AccountType::CostOfGoodsSold, NormalBalance::Debit, AccountCategory::Expense)]
    #[case(AccountType::OtherExpense, NormalBalance::Debit, AccountCategory::Expense)]
    fn test_account_type_classification(
        #[case] account_type: AccountType,
        #[case] normal: NormalBalance,
        #[case] category: AccountCategory,
    ) {
        assert_eq!(account_type.normal_balance(), normal);
        assert_eq!(account_type.category(), category);
    }

    #[test]
    fn test_every_type_has_subtypes() {
        for account_type in AccountType::ALL {
            assert!(!account_type.subtypes().is_empty(), "{account_type}");
        }
    }

    #[test]
    fn test_account_type_from_str() {
        assert_eq!(
            "accounts receivable".parse::<AccountType>().unwrap(),
            AccountType::AccountsReceivable
        );
        assert!("Cash".parse::<AccountType>().is_err());
    }

    #[test]
    fn test_account_type_serde_names() {
        let json = serde_json::to_string(&AccountType::CostOfGoodsSold).unwrap();
        assert_eq!(json, "\"Cost of Goods Sold\"");
        let legacy: AccountType = serde_json::from_str("\"Accounts payable (A/P)\"").unwrap();
        assert_eq!(legacy, AccountType::AccountsPayable);
    }

    #[test]
    fn test_account_new_derives_normal_balance() {
        let account = Account::new(
            TenantId::new(),
            "Sales",
            AccountType::Income,
            "Sales of Product Income",
            dec!(0),
        )
        .unwrap();

        assert_eq!(account.normal_balance, NormalBalance::Credit);
        assert_eq!(account.current_balance, dec!(0));
        assert!(account.is_active);
    }

    #[test]
    fn test_account_new_rejects_foreign_subtype() {
        let err = Account::new(
            TenantId::new(),
            "Checking",
            AccountType::Income,
            "Checking",
            dec!(0),
        )
        .unwrap_err();

        assert!(matches!(err, LedgerError::InvalidAccountSubtype { .. }));
    }

    #[test]
    fn test_loaded_account_normal_balance_follows_type() {
        let account = Account::new(
            TenantId::new(),
            "Sales",
            AccountType::Income,
            "Sales of Product Income",
            dec!(0),
        )
        .unwrap();
        let mut json = serde_json::to_value(&account).unwrap();

        let loaded: Account = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(loaded, account);

        json.as_object_mut().unwrap().remove("normal_balance");
        let derived: Account = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(derived.normal_balance, NormalBalance::Credit);

        json["normal_balance"] = serde_json::json!("debit");
        let err = serde_json::from_value::<Account>(json).unwrap_err();
        assert!(err.to_string().contains("credit-normal"));
    }

    #[test]
    fn test_system_accounts_prefer_defaults() {
        let tenant = TenantId::new();
        let accounts = vec![
            Account::new(tenant, "AR", AccountType::AccountsReceivable, "Accounts Receivable (A/R)", dec!(0)).unwrap(),
            Account::new(tenant, "Services", AccountType::Income, "Service/Fee Income", dec!(0)).unwrap(),
            Account::new(tenant, "Sales", AccountType::Income, "Sales of Product Income", dec!(0))
                .unwrap()
                .as_default(),
            Account::new(tenant, "COGS", AccountType::CostOfGoodsSold, "Supplies & Materials - COGS", dec!(0)).unwrap(),
            Account::new(tenant, "Prepaid", AccountType::OtherCurrentAsset, "Prepaid Expenses", dec!(0)).unwrap(),
            Account::new(tenant, "Inventory", AccountType::OtherCurrentAsset, "Inventory", dec!(0)).unwrap(),
            Account::new(tenant, "Checking", AccountType::Bank, "Checking", dec!(0)).unwrap(),
        ];

        let system = SystemAccounts::resolve(&accounts).unwrap();

        assert_eq!(system.accounts_receivable, accounts[0].id);
        assert_eq!(system.income, accounts[2].id);
        assert_eq!(system.inventory, accounts[5].id);
        assert_eq!(system.bank, accounts[6].id);
    }

    #[test]
    fn test_system_accounts_missing_type() {
        let tenant = TenantId::new();
        let accounts = vec![
            Account::new(tenant, "AR", AccountType::AccountsReceivable, "Accounts Receivable (A/R)", dec!(0)).unwrap(),
        ];

        let err = SystemAccounts::resolve(&accounts).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::MissingSystemAccount(AccountType::Income)
        ));
    }
}
