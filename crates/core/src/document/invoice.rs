//! Invoices: status machine, payment terms and payments.

use std::fmt;

use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, EstimateId, InvoiceId, PaymentId, TenantId, TransactionId};

use super::Document;
use super::error::DocumentError;
use super::line_item::{LineItem, priced_total};
use crate::lifecycle::machine::Transition;
use crate::lifecycle::{Lifecycle, Milestone, Status, TransitionTable};

/// Invoice status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Being prepared; its transaction is a draft.
    Draft,
    /// Sent to the customer.
    Sent,
    /// Customer accepted.
    Accepted,
    /// Customer declined.
    Declined,
    /// Fully paid.
    Paid,
    /// Some payments received.
    #[serde(alias = "partial_payment")]
    PartiallyPaid,
    /// Past due date with a balance outstanding.
    Overdue,
    /// Cancelled before payment.
    Cancelled,
    /// Voided.
    Void,
}

impl InvoiceStatus {
    /// Every invoice status.
    pub const ALL: [Self; 9] = [
        Self::Draft,
        Self::Sent,
        Self::Accepted,
        Self::Declined,
        Self::Paid,
        Self::PartiallyPaid,
        Self::Overdue,
        Self::Cancelled,
        Self::Void,
    ];

    /// Statuses whose linked transaction is posted.
    #[must_use]
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Draft | Self::Cancelled | Self::Void)
    }

    /// Statuses that can be marked overdue.
    #[must_use]
    pub fn awaits_payment(self) -> bool {
        matches!(self, Self::Sent | Self::Accepted | Self::PartiallyPaid)
    }
}

static INVOICE_TRANSITIONS: TransitionTable<InvoiceStatus> = {
    use InvoiceStatus::{
        Accepted, Cancelled, Declined, Draft, Overdue, Paid, PartiallyPaid, Sent, Void,
    };
    TransitionTable {
        subject: "invoice",
        edges: &[
            (Draft, &[Sent, Cancelled]),
            (
                Sent,
                &[Accepted, Declined, PartiallyPaid, Paid, Overdue, Cancelled, Draft],
            ),
            (Accepted, &[PartiallyPaid, Paid, Overdue, Cancelled, Draft]),
            (Declined, &[Draft, Cancelled]),
            (PartiallyPaid, &[Paid, Overdue, Void, Draft]),
            (Paid, &[Void, Draft]),
            (Overdue, &[PartiallyPaid, Paid, Void, Draft]),
            (Cancelled, &[Draft]),
            (Void, &[Draft]),
        ],
        stamps: &[
            (Sent, Milestone::Sent),
            (Accepted, Milestone::Accepted),
            (Declined, Milestone::Declined),
            (Paid, Milestone::Paid),
            (Cancelled, Milestone::Cancelled),
            (Void, Milestone::Voided),
        ],
        action_only: &[Paid, PartiallyPaid],
    }
};

impl Status for InvoiceStatus {
    fn table() -> &'static TransitionTable<Self> {
        &INVOICE_TRANSITIONS
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
            Self::Paid => "paid",
            Self::PartiallyPaid => "partially_paid",
            Self::Overdue => "overdue",
            Self::Cancelled => "cancelled",
            Self::Void => "void",
        };
        f.write_str(s)
    }
}

/// Payment terms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentTerms {
    /// Due on the invoice date.
    DueOnReceipt,
    /// Due in 15 days.
    #[serde(alias = "net15")]
    Net15,
    /// Due in 30 days.
    #[default]
    #[serde(alias = "net30")]
    Net30,
    /// Due in 45 days.
    #[serde(alias = "net45")]
    Net45,
    /// Due in 60 days.
    #[serde(alias = "net60")]
    Net60,
}

impl PaymentTerms {
    /// Days between the document date and the due date.
    #[must_use]
    pub fn days(self) -> u64 {
        match self {
            Self::DueOnReceipt => 0,
            Self::Net15 => 15,
            Self::Net30 => 30,
            Self::Net45 => 45,
            Self::Net60 => 60,
        }
    }

    /// Due date for a document dated `date`.
    #[must_use]
    pub fn due_date(self, date: NaiveDate) -> NaiveDate {
        date.checked_add_days(Days::new(self.days()))
            .unwrap_or(NaiveDate::MAX)
    }
}

/// A payment applied to an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Payment identifier.
    pub id: PaymentId,
    /// Amount received.
    pub amount: Decimal,
    /// Date the money was received.
    pub payment_date: NaiveDate,
    /// Account the money was deposited into.
    pub deposit_account_id: AccountId,
    /// The posted payment transaction.
    pub transaction_id: TransactionId,
    /// When the payment was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// A customer invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Invoice identifier.
    pub id: InvoiceId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Customer display name.
    pub customer_name: String,
    /// Invoice date; also the sale's transaction date.
    pub invoice_date: NaiveDate,
    /// Payment terms.
    pub payment_terms: PaymentTerms,
    /// Derived from the invoice date and terms.
    pub due_date: NaiveDate,
    /// Lines; the invoice owns them.
    pub line_items: Vec<LineItem>,
    /// Sum of line amounts.
    pub total: Decimal,
    /// Payments received, oldest first.
    #[serde(default)]
    pub payments: Vec<Payment>,
    /// `total - Σ payments`.
    pub balance_due: Decimal,
    /// The currently linked sales transaction.
    pub transaction_id: Option<TransactionId>,
    /// Estimate this invoice was converted from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converted_from_estimate: Option<EstimateId>,
    /// Status and timestamps.
    pub lifecycle: Lifecycle<InvoiceStatus>,
}

impl Invoice {
    /// A draft invoice.
    ///
    /// # Errors
    ///
    /// Line item errors or a non-positive total.
    pub fn new(
        tenant_id: TenantId,
        customer_name: impl Into<String>,
        invoice_date: NaiveDate,
        payment_terms: PaymentTerms,
        line_items: Vec<LineItem>,
        now: DateTime<Utc>,
    ) -> Result<Self, DocumentError> {
        let total = priced_total(&line_items)?;
        Ok(Self {
            id: InvoiceId::new(),
            tenant_id,
            customer_name: customer_name.into(),
            invoice_date,
            payment_terms,
            due_date: payment_terms.due_date(invoice_date),
            line_items,
            total,
            payments: Vec::new(),
            balance_due: total,
            transaction_id: None,
            converted_from_estimate: None,
            lifecycle: Lifecycle::new(InvoiceStatus::Draft, now),
        })
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> InvoiceStatus {
        self.lifecycle.status
    }

    /// Sum of recorded payments.
    #[must_use]
    pub fn amount_paid(&self) -> Decimal {
        self.payments.iter().map(|p| p.amount).sum()
    }

    /// Plain status change (payment statuses go through
    /// [`Invoice::record_payment`]).
    ///
    /// # Errors
    ///
    /// Transition errors from the status machine.
    pub fn transition(
        &mut self,
        to: InvoiceStatus,
        now: DateTime<Utc>,
        void_reason: Option<&str>,
    ) -> Result<Transition<InvoiceStatus>, DocumentError> {
        Ok(self.lifecycle.transition(to, now, void_reason)?)
    }

    /// Status a payment of `amount` would move the invoice to.
    ///
    /// Pure check; nothing is modified.
    ///
    /// # Errors
    ///
    /// - `InvalidPaymentAmount` for a non-positive amount
    /// - `PaymentExceedsBalance` for an overpayment
    /// - `Transition` if the current status cannot take payments
    pub fn payment_target(&self, amount: Decimal) -> Result<InvoiceStatus, DocumentError> {
        if amount <= Decimal::ZERO {
            return Err(DocumentError::InvalidPaymentAmount(amount));
        }
        if amount > self.balance_due {
            return Err(DocumentError::PaymentExceedsBalance {
                amount,
                balance_due: self.balance_due,
            });
        }

        let target = if amount == self.balance_due {
            InvoiceStatus::Paid
        } else {
            InvoiceStatus::PartiallyPaid
        };
        if target != self.status() {
            InvoiceStatus::table().check(self.status(), target)?;
        }
        Ok(target)
    }

    /// Apply a payment whose transaction has been posted.
    ///
    /// # Errors
    ///
    /// Same as [`Invoice::payment_target`]; on error nothing changes.
    pub fn record_payment(
        &mut self,
        payment: Payment,
        now: DateTime<Utc>,
    ) -> Result<InvoiceStatus, DocumentError> {
        let target = self.payment_target(payment.amount)?;
        if target != self.status() {
            self.lifecycle.apply_action(target, now)?;
        } else {
            self.lifecycle.updated_at = now;
        }
        self.payments.push(payment);
        self.balance_due = self.total - self.amount_paid();
        Ok(target)
    }

    /// Returns true if the invoice is past due on `today` and still open.
    #[must_use]
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status().awaits_payment() && self.due_date < today && self.balance_due > Decimal::ZERO
    }

    /// Check that the invoice may be deleted (draft or void only).
    ///
    /// # Errors
    ///
    /// `NotDeletable` for any other status.
    pub fn ensure_deletable(&self) -> Result<(), DocumentError> {
        match self.status() {
            InvoiceStatus::Draft | InvoiceStatus::Void => Ok(()),
            status => Err(DocumentError::NotDeletable {
                subject: "invoice",
                status: status.to_string(),
            }),
        }
    }
}

impl Document for Invoice {
    type Id = InvoiceId;
    const KIND: &'static str = "invoice";

    fn id(&self) -> InvoiceId {
        self.id
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}
