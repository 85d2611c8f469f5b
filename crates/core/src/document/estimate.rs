//! Estimates (quotes) and their conversion into invoices.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{EstimateId, InvoiceId, TenantId};

use super::Document;
use super::error::DocumentError;
use super::invoice::{Invoice, PaymentTerms};
use super::line_item::{LineItem, priced_total};
use crate::lifecycle::machine::Transition;
use crate::lifecycle::{Lifecycle, Milestone, Status, TransitionTable};

/// Estimate status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateStatus {
    /// Being prepared.
    Draft,
    /// Sent to the customer.
    Sent,
    /// Customer accepted; can be converted.
    Accepted,
    /// Customer declined.
    Declined,
    /// Validity period lapsed.
    Expired,
    /// Turned into an invoice. Terminal.
    Converted,
    /// Withdrawn.
    Cancelled,
}

impl EstimateStatus {
    /// Every estimate status.
    pub const ALL: [Self; 7] = [
        Self::Draft,
        Self::Sent,
        Self::Accepted,
        Self::Declined,
        Self::Expired,
        Self::Converted,
        Self::Cancelled,
    ];
}

static ESTIMATE_TRANSITIONS: TransitionTable<EstimateStatus> = {
    use EstimateStatus::{Accepted, Cancelled, Converted, Declined, Draft, Expired, Sent};
    TransitionTable {
        subject: "estimate",
        edges: &[
            (Draft, &[Sent, Cancelled]),
            (Sent, &[Accepted, Declined, Expired, Cancelled, Draft]),
            (Accepted, &[Converted, Cancelled, Draft]),
            (Declined, &[Draft, Cancelled]),
            (Expired, &[Draft, Cancelled]),
            (Cancelled, &[Draft]),
        ],
        stamps: &[
            (Sent, Milestone::Sent),
            (Accepted, Milestone::Accepted),
            (Declined, Milestone::Declined),
            (Expired, Milestone::Expired),
            (Converted, Milestone::Converted),
            (Cancelled, Milestone::Cancelled),
        ],
        action_only: &[Converted],
    }
};

impl Status for EstimateStatus {
    fn table() -> &'static TransitionTable<Self> {
        &ESTIMATE_TRANSITIONS
    }
}

impl fmt::Display for EstimateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
            Self::Expired => "expired",
            Self::Converted => "converted",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// A quote sent to a customer ahead of an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Estimate {
    /// Estimate identifier.
    pub id: EstimateId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Customer display name.
    pub customer_name: String,
    /// Estimate date.
    pub estimate_date: NaiveDate,
    /// Last day the quote is valid.
    pub expiration_date: Option<NaiveDate>,
    /// Quoted lines.
    pub line_items: Vec<LineItem>,
    /// Sum of line amounts.
    pub total: Decimal,
    /// Invoice produced by conversion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converted_invoice_id: Option<InvoiceId>,
    /// Status and timestamps.
    pub lifecycle: Lifecycle<EstimateStatus>,
}

impl Estimate {
    /// A draft estimate.
    ///
    /// # Errors
    ///
    /// Line item errors or a non-positive total.
    pub fn new(
        tenant_id: TenantId,
        customer_name: impl Into<String>,
        estimate_date: NaiveDate,
        expiration_date: Option<NaiveDate>,
        line_items: Vec<LineItem>,
        now: DateTime<Utc>,
    ) -> Result<Self, DocumentError> {
        let total = priced_total(&line_items)?;
        Ok(Self {
            id: EstimateId::new(),
            tenant_id,
            customer_name: customer_name.into(),
            estimate_date,
            expiration_date,
            line_items,
            total,
            converted_invoice_id: None,
            lifecycle: Lifecycle::new(EstimateStatus::Draft, now),
        })
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> EstimateStatus {
        self.lifecycle.status
    }

    /// Plain status change. `converted` is only reachable through
    /// [`Estimate::mark_converted`].
    ///
    /// # Errors
    ///
    /// Transition errors from the status machine.
    pub fn transition(
        &mut self,
        to: EstimateStatus,
        now: DateTime<Utc>,
    ) -> Result<Transition<EstimateStatus>, DocumentError> {
        Ok(self.lifecycle.transition(to, now, None)?)
    }

    /// Returns true if a sent estimate has passed its expiration date.
    #[must_use]
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.status() == EstimateStatus::Sent && self.expiration_date.is_some_and(|d| d < today)
    }

    /// Draft invoice carrying this estimate's customer and lines.
    ///
    /// The estimate itself is not modified; see [`Estimate::mark_converted`].
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless the estimate is accepted.
    pub fn to_invoice(
        &self,
        invoice_date: NaiveDate,
        payment_terms: PaymentTerms,
        now: DateTime<Utc>,
    ) -> Result<Invoice, DocumentError> {
        EstimateStatus::table().check(self.status(), EstimateStatus::Converted)?;
        let mut invoice = Invoice::new(
            self.tenant_id,
            self.customer_name.clone(),
            invoice_date,
            payment_terms,
            self.line_items.clone(),
            now,
        )?;
        invoice.converted_from_estimate = Some(self.id);
        Ok(invoice)
    }

    /// Record the conversion into `invoice_id`.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless the estimate is accepted.
    pub fn mark_converted(
        &mut self,
        invoice_id: InvoiceId,
        now: DateTime<Utc>,
    ) -> Result<Transition<EstimateStatus>, DocumentError> {
        let transition = self
            .lifecycle
            .apply_action(EstimateStatus::Converted, now)?;
        self.converted_invoice_id = Some(invoice_id);
        Ok(transition)
    }
}

impl Document for Estimate {
    type Id = EstimateId;
    const KIND: &'static str = "estimate";

    fn id(&self) -> EstimateId {
        self.id
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}
