//! Document workflows over the store ports.
//!
//! A workflow loads a document, asks the status machine whether the change
//! is legal, drives the ledger (validate, post, void, delete), and writes
//! everything back. The engines stay pure; only this module talks to stores.
//!
//! # Modules
//!
//! - `ports` - Account, transaction and document store traits
//! - `memory` - In-memory store implementing every port
//! - `ledger` - Store-backed ledger operations and recalculation
//! - `invoice` - Invoice creation, status changes, payments, deletion
//! - `estimate` - Estimate status changes and conversion to invoices
//! - `purchase_order` - Purchase order status changes and receipts
//! - `error` - Workflow errors

pub mod error;
pub mod estimate;
pub mod invoice;
pub mod ledger;
pub mod memory;
pub mod ports;
pub mod purchase_order;

#[cfg(test)]
mod fixtures;

pub use error::WorkflowError;
pub use estimate::EstimateWorkflow;
pub use invoice::InvoiceWorkflow;
pub use ledger::LedgerService;
pub use memory::MemoryStore;
pub use ports::{AccountStore, DocumentStore, StoreError, TransactionStore};
pub use purchase_order::PurchaseOrderWorkflow;
