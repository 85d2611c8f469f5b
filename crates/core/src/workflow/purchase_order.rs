//! Purchase order workflow. Purchase orders carry no ledger effect.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tally_shared::types::{LineItemId, PurchaseOrderId, TenantId};
use tracing::info;

use super::error::WorkflowError;
use super::ports::DocumentStore;
use crate::document::{Document, LineReceipt, PurchaseOrder, PurchaseOrderStatus};

/// Orchestrates purchase orders over a document store.
pub struct PurchaseOrderWorkflow<S> {
    store: Arc<S>,
}

impl<S: DocumentStore<PurchaseOrder>> PurchaseOrderWorkflow<S> {
    /// Create a workflow over `store`.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Fetch one purchase order.
    ///
    /// # Errors
    ///
    /// `DocumentNotFound`, or a store error.
    pub fn purchase_order(
        &self,
        tenant_id: TenantId,
        id: PurchaseOrderId,
    ) -> Result<PurchaseOrder, WorkflowError> {
        self.store
            .document(tenant_id, id)?
            .ok_or_else(|| WorkflowError::document_not_found(PurchaseOrder::KIND, id))
    }

    /// Store a new purchase order.
    ///
    /// # Errors
    ///
    /// Store errors.
    pub fn create(&self, order: PurchaseOrder) -> Result<PurchaseOrder, WorkflowError> {
        self.store.save(&order)?;
        info!(
            tenant_id = %order.tenant_id,
            purchase_order_id = %order.id,
            lines = order.lines.len(),
            "Purchase order created"
        );
        Ok(order)
    }

    /// Plain status change.
    ///
    /// # Errors
    ///
    /// Transition or store errors.
    pub fn change_status(
        &self,
        tenant_id: TenantId,
        id: PurchaseOrderId,
        to: PurchaseOrderStatus,
        now: DateTime<Utc>,
    ) -> Result<PurchaseOrder, WorkflowError> {
        let mut order = self.purchase_order(tenant_id, id)?;
        let transition = order.transition(to, now)?;
        self.store.save(&order)?;
        info!(
            tenant_id = %tenant_id,
            purchase_order_id = %id,
            from = %transition.from,
            to = %transition.to,
            "Purchase order status changed"
        );
        Ok(order)
    }

    /// Record a goods receipt (all lines or none).
    ///
    /// # Errors
    ///
    /// Receipt errors from [`PurchaseOrder::receive`], or store errors.
    pub fn receive(
        &self,
        tenant_id: TenantId,
        id: PurchaseOrderId,
        receipts: &[LineReceipt],
        now: DateTime<Utc>,
    ) -> Result<PurchaseOrder, WorkflowError> {
        let mut order = self.purchase_order(tenant_id, id)?;
        let status = order.receive(receipts, now)?;
        self.store.save(&order)?;
        info!(
            tenant_id = %tenant_id,
            purchase_order_id = %id,
            status = %status,
            "Goods receipt recorded"
        );
        Ok(order)
    }

    /// Cancel the rest of one line.
    ///
    /// # Errors
    ///
    /// `LineItemNotFound`, transition or store errors.
    pub fn cancel_line(
        &self,
        tenant_id: TenantId,
        id: PurchaseOrderId,
        line_item_id: LineItemId,
        now: DateTime<Utc>,
    ) -> Result<PurchaseOrder, WorkflowError> {
        let mut order = self.purchase_order(tenant_id, id)?;
        order.cancel_line(line_item_id, now)?;
        self.store.save(&order)?;
        Ok(order)
    }

    /// Delete a purchase order that is not being received.
    ///
    /// # Errors
    ///
    /// `NotDeletable`, or store errors.
    pub fn delete(&self, tenant_id: TenantId, id: PurchaseOrderId) -> Result<(), WorkflowError> {
        let order = self.purchase_order(tenant_id, id)?;
        order.ensure_deletable()?;
        self.store.delete_document(tenant_id, id)?;
        Ok(())
    }
}
