//! Purchase orders and line-level goods receipts.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{LineItemId, PurchaseOrderId, TenantId};
use tracing::debug;

use super::Document;
use super::error::DocumentError;
use crate::lifecycle::machine::Transition;
use crate::lifecycle::{Lifecycle, Milestone, Status, TransitionTable};

/// Purchase order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOrderStatus {
    /// Being prepared.
    Draft,
    /// Sent to the vendor.
    Sent,
    /// Vendor accepted; goods may be received.
    Accepted,
    /// Vendor declined.
    Declined,
    /// Some ordered goods received.
    PartiallyReceived,
    /// Every open line fully received.
    Received,
    /// Withdrawn.
    Cancelled,
    /// Closed out after receipt.
    Closed,
}

impl PurchaseOrderStatus {
    /// Every purchase order status.
    pub const ALL: [Self; 8] = [
        Self::Draft,
        Self::Sent,
        Self::Accepted,
        Self::Declined,
        Self::PartiallyReceived,
        Self::Received,
        Self::Cancelled,
        Self::Closed,
    ];

    /// Returns true if goods can be received in this status.
    #[must_use]
    pub fn is_receivable(self) -> bool {
        matches!(self, Self::Accepted | Self::PartiallyReceived)
    }
}

static PURCHASE_ORDER_TRANSITIONS: TransitionTable<PurchaseOrderStatus> = {
    use PurchaseOrderStatus::{
        Accepted, Cancelled, Closed, Declined, Draft, PartiallyReceived, Received, Sent,
    };
    TransitionTable {
        subject: "purchase order",
        edges: &[
            (Draft, &[Sent, Cancelled]),
            (Sent, &[Accepted, Declined, Cancelled, Draft]),
            (Accepted, &[PartiallyReceived, Received, Cancelled, Draft]),
            (Declined, &[Draft, Cancelled]),
            (PartiallyReceived, &[Received, Cancelled, Draft]),
            (Received, &[Closed, Draft]),
            (Cancelled, &[Draft]),
            (Closed, &[Draft]),
        ],
        stamps: &[
            (Sent, Milestone::Sent),
            (Accepted, Milestone::Accepted),
            (Declined, Milestone::Declined),
            (Received, Milestone::Received),
            (Cancelled, Milestone::Cancelled),
            (Closed, Milestone::Closed),
        ],
        action_only: &[PartiallyReceived, Received],
    }
};

impl Status for PurchaseOrderStatus {
    fn table() -> &'static TransitionTable<Self> {
        &PURCHASE_ORDER_TRANSITIONS
    }
}

impl fmt::Display for PurchaseOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
            Self::PartiallyReceived => "partially_received",
            Self::Received => "received",
            Self::Cancelled => "cancelled",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Status of a single purchase order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineItemStatus {
    /// Nothing received.
    Pending,
    /// `0 < received_quantity < quantity`.
    PartiallyReceived,
    /// `received_quantity == quantity`.
    Received,
    /// No longer expected.
    Cancelled,
}

static LINE_ITEM_TRANSITIONS: TransitionTable<LineItemStatus> = {
    use LineItemStatus::{Cancelled, PartiallyReceived, Pending, Received};
    TransitionTable {
        subject: "purchase order line",
        edges: &[
            (Pending, &[PartiallyReceived, Received, Cancelled]),
            (PartiallyReceived, &[Received, Cancelled]),
        ],
        stamps: &[(Received, Milestone::Received)],
        action_only: &[PartiallyReceived, Received],
    }
};

impl Status for LineItemStatus {
    fn table() -> &'static TransitionTable<Self> {
        &LINE_ITEM_TRANSITIONS
    }
}

impl fmt::Display for LineItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::PartiallyReceived => "partially_received",
            Self::Received => "received",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// An ordered line with its receipt progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderLine {
    /// Line identifier.
    pub id: LineItemId,
    /// What was ordered.
    pub description: String,
    /// Ordered quantity.
    pub quantity: Decimal,
    /// Price per unit.
    pub unit_price: Decimal,
    /// Quantity received so far; never exceeds `quantity`.
    pub received_quantity: Decimal,
    /// Line status and receipt stamp.
    pub lifecycle: Lifecycle<LineItemStatus>,
    /// Most recent receipt on this line.
    pub last_received_at: Option<DateTime<Utc>>,
}

impl PurchaseOrderLine {
    /// A pending line.
    #[must_use]
    pub fn new(
        description: impl Into<String>,
        quantity: Decimal,
        unit_price: Decimal,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: LineItemId::new(),
            description: description.into(),
            quantity,
            unit_price,
            received_quantity: Decimal::ZERO,
            lifecycle: Lifecycle::new(LineItemStatus::Pending, now),
            last_received_at: None,
        }
    }

    /// Current line status.
    #[must_use]
    pub fn status(&self) -> LineItemStatus {
        self.lifecycle.status
    }

    /// Quantity still expected.
    #[must_use]
    pub fn outstanding(&self) -> Decimal {
        self.quantity - self.received_quantity
    }

    /// `quantity * unit_price`, rounded to cents.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        (self.quantity * self.unit_price).round_dp(2)
    }

    fn validate(&self) -> Result<(), DocumentError> {
        if self.quantity <= Decimal::ZERO {
            return Err(DocumentError::InvalidQuantity {
                line_item_id: self.id,
                quantity: self.quantity,
            });
        }
        if self.unit_price < Decimal::ZERO {
            return Err(DocumentError::InvalidUnitPrice {
                line_item_id: self.id,
                unit_price: self.unit_price,
            });
        }
        Ok(())
    }

    /// Add `quantity` to the received total and recompute the line status.
    ///
    /// # Errors
    ///
    /// - `InvalidQuantity` for a non-positive quantity
    /// - `QuantityExceedsOrdered` if the total would pass the ordered quantity
    /// - `InvalidTransition` for a cancelled or fully received line
    pub fn receive(
        &mut self,
        quantity: Decimal,
        now: DateTime<Utc>,
    ) -> Result<LineItemStatus, DocumentError> {
        if quantity <= Decimal::ZERO {
            return Err(DocumentError::InvalidQuantity {
                line_item_id: self.id,
                quantity,
            });
        }
        let received = self.received_quantity + quantity;
        if received > self.quantity {
            return Err(DocumentError::QuantityExceedsOrdered {
                line_item_id: self.id,
                ordered: self.quantity,
                received: self.received_quantity,
                requested: quantity,
            });
        }

        let target = if received == self.quantity {
            LineItemStatus::Received
        } else {
            LineItemStatus::PartiallyReceived
        };
        if target != self.status() {
            self.lifecycle.apply_action(target, now)?;
        } else {
            self.lifecycle.updated_at = now;
        }
        self.received_quantity = received;
        self.last_received_at = Some(now);
        Ok(target)
    }

    /// Stop expecting the rest of this line.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` if the line is already received or cancelled.
    pub fn cancel(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<Transition<LineItemStatus>, DocumentError> {
        Ok(self.lifecycle.transition(LineItemStatus::Cancelled, now, None)?)
    }
}

/// Quantity received against one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineReceipt {
    /// The line being received.
    pub line_item_id: LineItemId,
    /// Units received in this receipt.
    pub quantity: Decimal,
}

/// An order placed with a vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    /// Purchase order identifier.
    pub id: PurchaseOrderId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Vendor display name.
    pub vendor_name: String,
    /// Order date.
    pub order_date: NaiveDate,
    /// Expected delivery date.
    pub expected_date: Option<NaiveDate>,
    /// Ordered lines.
    pub lines: Vec<PurchaseOrderLine>,
    /// Sum of line amounts.
    pub total: Decimal,
    /// Most recent receipt on any line.
    pub last_received_at: Option<DateTime<Utc>>,
    /// Status and timestamps.
    pub lifecycle: Lifecycle<PurchaseOrderStatus>,
}

impl PurchaseOrder {
    /// A draft purchase order.
    ///
    /// # Errors
    ///
    /// `NoLineItems`, line errors, or `NonPositiveTotal`.
    pub fn new(
        tenant_id: TenantId,
        vendor_name: impl Into<String>,
        order_date: NaiveDate,
        lines: Vec<PurchaseOrderLine>,
        now: DateTime<Utc>,
    ) -> Result<Self, DocumentError> {
        if lines.is_empty() {
            return Err(DocumentError::NoLineItems);
        }
        for line in &lines {
            line.validate()?;
        }
        let total: Decimal = lines.iter().map(PurchaseOrderLine::amount).sum();
        if total <= Decimal::ZERO {
            return Err(DocumentError::NonPositiveTotal(total));
        }

        Ok(Self {
            id: PurchaseOrderId::new(),
            tenant_id,
            vendor_name: vendor_name.into(),
            order_date,
            expected_date: None,
            lines,
            total,
            last_received_at: None,
            lifecycle: Lifecycle::new(PurchaseOrderStatus::Draft, now),
        })
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> PurchaseOrderStatus {
        self.lifecycle.status
    }

    /// Look up a line.
    #[must_use]
    pub fn line(&self, id: LineItemId) -> Option<&PurchaseOrderLine> {
        self.lines.iter().find(|line| line.id == id)
    }

    /// Plain status change. Receipt statuses go through
    /// [`PurchaseOrder::receive`].
    ///
    /// # Errors
    ///
    /// Transition errors from the status machine.
    pub fn transition(
        &mut self,
        to: PurchaseOrderStatus,
        now: DateTime<Utc>,
    ) -> Result<Transition<PurchaseOrderStatus>, DocumentError> {
        Ok(self.lifecycle.transition(to, now, None)?)
    }

    /// Record a goods receipt.
    ///
    /// Every line receipt is applied to a copy of the lines first; the order
    /// is only modified if all of them succeed. Returns the new order status.
    ///
    /// # Errors
    ///
    /// - `NotReceivable` unless the order is accepted or partially received
    /// - `EmptyReceipt` for an empty receipt
    /// - `LineItemNotFound` for an unknown line
    /// - any [`PurchaseOrderLine::receive`] error
    pub fn receive(
        &mut self,
        receipts: &[LineReceipt],
        now: DateTime<Utc>,
    ) -> Result<PurchaseOrderStatus, DocumentError> {
        let status = self.status();
        if !status.is_receivable() {
            return Err(DocumentError::NotReceivable {
                status: status.to_string(),
            });
        }
        if receipts.is_empty() {
            return Err(DocumentError::EmptyReceipt);
        }

        let mut lines = self.lines.clone();
        for receipt in receipts {
            let line = lines
                .iter_mut()
                .find(|line| line.id == receipt.line_item_id)
                .ok_or(DocumentError::LineItemNotFound(receipt.line_item_id))?;
            line.receive(receipt.quantity, now)?;
        }

        let complete = lines
            .iter()
            .filter(|line| line.status() != LineItemStatus::Cancelled)
            .all(|line| line.status() == LineItemStatus::Received);
        let target = if complete {
            PurchaseOrderStatus::Received
        } else {
            PurchaseOrderStatus::PartiallyReceived
        };
        if target != status {
            self.lifecycle.apply_action(target, now)?;
        } else {
            self.lifecycle.updated_at = now;
        }

        self.lines = lines;
        self.last_received_at = Some(now);
        debug!(
            purchase_order_id = %self.id,
            lines = receipts.len(),
            status = %target,
            "Goods received"
        );
        Ok(target)
    }

    /// Cancel one line; the order becomes received if every other line is.
    ///
    /// # Errors
    ///
    /// `LineItemNotFound`, or `InvalidTransition` for a line that cannot be
    /// cancelled.
    pub fn cancel_line(
        &mut self,
        line_item_id: LineItemId,
        now: DateTime<Utc>,
    ) -> Result<PurchaseOrderStatus, DocumentError> {
        let line = self
            .lines
            .iter_mut()
            .find(|line| line.id == line_item_id)
            .ok_or(DocumentError::LineItemNotFound(line_item_id))?;
        line.cancel(now)?;

        let open: Vec<_> = self
            .lines
            .iter()
            .filter(|line| line.status() != LineItemStatus::Cancelled)
            .collect();
        let complete = !open.is_empty()
            && open
                .iter()
                .all(|line| line.status() == LineItemStatus::Received);
        if complete && self.status() == PurchaseOrderStatus::PartiallyReceived {
            self.lifecycle
                .apply_action(PurchaseOrderStatus::Received, now)?;
        }
        Ok(self.status())
    }

    /// Check that the order may be deleted.
    ///
    /// # Errors
    ///
    /// `NotDeletable` for accepted, partially received and received orders.
    pub fn ensure_deletable(&self) -> Result<(), DocumentError> {
        match self.status() {
            PurchaseOrderStatus::Accepted
            | PurchaseOrderStatus::PartiallyReceived
            | PurchaseOrderStatus::Received => Err(DocumentError::NotDeletable {
                subject: "purchase order",
                status: self.status().to_string(),
            }),
            _ => Ok(()),
        }
    }
}

impl Document for PurchaseOrder {
    type Id = PurchaseOrderId;
    const KIND: &'static str = "purchase_order";

    fn id(&self) -> PurchaseOrderId {
        self.id
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}
