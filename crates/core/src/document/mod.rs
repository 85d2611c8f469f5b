//! Business documents governed by the status machine.
//!
//! Invoices, estimates and purchase orders each instantiate
//! [`crate::lifecycle`] with their own status set and transition table.
//! Documents never touch account balances; ledger side effects are driven by
//! [`crate::workflow`].
//!
//! # Modules
//!
//! - `invoice` - Invoices, payment terms and payments
//! - `estimate` - Estimates and conversion into invoices
//! - `purchase_order` - Purchase orders and line receipts
//! - `line_item` - Priced line items
//! - `error` - Document errors

pub mod error;
pub mod estimate;
pub mod invoice;
pub mod line_item;
pub mod purchase_order;

#[cfg(test)]
mod machine_props;

use tally_shared::types::TenantId;

pub use error::DocumentError;
pub use estimate::{Estimate, EstimateStatus};
pub use invoice::{Invoice, InvoiceStatus, Payment, PaymentTerms};
pub use line_item::LineItem;
pub use purchase_order::{
    LineItemStatus, LineReceipt, PurchaseOrder, PurchaseOrderLine, PurchaseOrderStatus,
};

/// A tenant-owned document that can be kept in a document store.
pub trait Document: Clone {
    /// Identifier type.
    type Id: Copy + Eq + Ord + std::fmt::Display;

    /// Short name used in logs and errors.
    const KIND: &'static str;

    /// Document identifier.
    fn id(&self) -> Self::Id;

    /// Owning tenant.
    fn tenant_id(&self) -> TenantId;
}
