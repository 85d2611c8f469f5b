//! Transaction aggregate.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{InvoiceId, PaymentId, TenantId, TransactionId};

use super::entry::TransactionEntry;
use super::error::LedgerError;
use super::types::{TransactionTotals, TransactionType};
use crate::lifecycle::{Status, TransitionTable};

/// Transaction status.
///
/// `draft -> posted | void`, `posted -> void`, `void -> draft`. Posted is
/// never reachable from void directly; a voided transaction must go back
/// through draft and a fresh posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Not yet applied to balances.
    Draft,
    /// Applied to balances exactly once.
    Posted,
    /// Effect reversed (or never applied, if voided from draft).
    Void,
}

static TRANSACTION_TRANSITIONS: TransitionTable<TransactionStatus> = TransitionTable {
    subject: "transaction",
    edges: &[
        (
            TransactionStatus::Draft,
            &[TransactionStatus::Posted, TransactionStatus::Void],
        ),
        (TransactionStatus::Posted, &[TransactionStatus::Void]),
        (TransactionStatus::Void, &[TransactionStatus::Draft]),
    ],
    stamps: &[],
    action_only: &[],
};

impl Status for TransactionStatus {
    fn table() -> &'static TransitionTable<Self> {
        &TRANSACTION_TRANSITIONS
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Posted => write!(f, "posted"),
            Self::Void => write!(f, "void"),
        }
    }
}

/// The business document a transaction was generated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceDocument {
    /// Sales invoice transaction.
    Invoice {
        /// The invoice.
        invoice_id: InvoiceId,
    },
    /// Payment received against an invoice.
    InvoicePayment {
        /// The invoice paid.
        invoice_id: InvoiceId,
        /// The payment record.
        payment_id: PaymentId,
    },
}

impl SourceDocument {
    /// The invoice this transaction belongs to.
    #[must_use]
    pub fn invoice_id(self) -> InvoiceId {
        match self {
            Self::Invoice { invoice_id } | Self::InvoicePayment { invoice_id, .. } => invoice_id,
        }
    }
}

/// A balanced set of entries with its own lifecycle.
///
/// `total_amount` is the sum of debit amounts. `posted_at`, `voided_at` and
/// `void_reason` are written only by the posting engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction identifier.
    pub id: TransactionId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Classification, drives account-type permissions.
    pub transaction_type: TransactionType,
    /// Lifecycle status.
    pub status: TransactionStatus,
    /// Accounting date; replay order.
    pub transaction_date: NaiveDate,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Entries in display order.
    pub entries: Vec<TransactionEntry>,
    /// Sum of debit amounts.
    pub total_amount: Decimal,
    /// Originating document, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceDocument>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last status change.
    pub updated_at: DateTime<Utc>,
    /// When the transaction was posted.
    #[serde(default)]
    pub posted_at: Option<DateTime<Utc>>,
    /// When the transaction was last voided.
    #[serde(default)]
    pub voided_at: Option<DateTime<Utc>>,
    /// Reason given on the last void.
    #[serde(default)]
    pub void_reason: Option<String>,
}

impl Transaction {
    /// Create a draft transaction.
    #[must_use]
    pub fn draft(
        tenant_id: TenantId,
        transaction_type: TransactionType,
        transaction_date: NaiveDate,
        description: impl Into<String>,
        entries: Vec<TransactionEntry>,
        now: DateTime<Utc>,
    ) -> Self {
        let total_amount = entries.iter().map(TransactionEntry::debit_amount).sum();
        Self {
            id: TransactionId::new(),
            tenant_id,
            transaction_type,
            status: TransactionStatus::Draft,
            transaction_date,
            description: description.into(),
            entries,
            total_amount,
            source: None,
            created_at: now,
            updated_at: now,
            posted_at: None,
            voided_at: None,
            void_reason: None,
        }
    }

    /// Link to the originating document.
    #[must_use]
    pub fn with_source(mut self, source: SourceDocument) -> Self {
        self.source = Some(source);
        self
    }

    /// Debit and credit totals of the entries.
    #[must_use]
    pub fn totals(&self) -> TransactionTotals {
        TransactionTotals::new(
            self.entries.iter().map(TransactionEntry::debit_amount).sum(),
            self.entries.iter().map(TransactionEntry::credit_amount).sum(),
        )
    }

    /// Returns true if the entries' effect is currently applied to balances.
    #[must_use]
    pub fn is_posted(&self) -> bool {
        self.status == TransactionStatus::Posted
    }

    /// Returns true if the transaction was ever posted.
    #[must_use]
    pub fn was_ever_posted(&self) -> bool {
        self.posted_at.is_some()
    }

    /// Move a voided transaction back to draft.
    ///
    /// Void fields are kept until the next post clears them; `posted_at` is
    /// kept too, so a transaction that was posted once cannot be re-posted.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Transition` unless the transaction is void.
    pub fn reopen(&mut self, now: DateTime<Utc>) -> Result<(), LedgerError> {
        TransactionStatus::table().check(self.status, TransactionStatus::Draft)?;
        self.status = TransactionStatus::Draft;
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use tally_shared::types::AccountId;

    use super::*;

    fn sample(now: DateTime<Utc>) -> Transaction {
        Transaction::draft(
            TenantId::new(),
            TransactionType::JournalEntry,
            NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            "Accrual",
            vec![
                TransactionEntry::debit(AccountId::new(), dec!(70)),
                TransactionEntry::debit(AccountId::new(), dec!(30)),
                TransactionEntry::credit(AccountId::new(), dec!(100)),
            ],
            now,
        )
    }

    #[test]
    fn test_draft_derives_total_amount() {
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 8, 0, 0).unwrap();
        let tx = sample(now);

        assert_eq!(tx.status, TransactionStatus::Draft);
        assert_eq!(tx.total_amount, dec!(100));
        assert_eq!(tx.totals(), TransactionTotals::new(dec!(100), dec!(100)));
        assert!(!tx.was_ever_posted());
    }

    #[test]
    fn test_status_graph() {
        let table = TransactionStatus::table();
        assert!(table.allows(TransactionStatus::Draft, TransactionStatus::Posted));
        assert!(table.allows(TransactionStatus::Posted, TransactionStatus::Void));
        assert!(table.allows(TransactionStatus::Void, TransactionStatus::Draft));
        assert!(!table.allows(TransactionStatus::Void, TransactionStatus::Posted));
        assert!(!table.allows(TransactionStatus::Posted, TransactionStatus::Draft));
    }

    #[test]
    fn test_reopen_only_from_void() {
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 8, 0, 0).unwrap();
        let mut tx = sample(now);

        assert!(matches!(tx.reopen(now), Err(LedgerError::Transition(_))));

        tx.status = TransactionStatus::Void;
        tx.reopen(now).unwrap();
        assert_eq!(tx.status, TransactionStatus::Draft);
    }
}
