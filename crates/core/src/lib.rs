//! Core ledger and document logic for Tally.
//!
//! This crate contains pure business logic with ZERO web or database
//! dependencies. Persistence is reached only through the store ports in
//! [`workflow::ports`].
//!
//! # Modules
//!
//! - `ledger` - Double-entry validation, posting, reversal and recalculation
//! - `lifecycle` - Table-driven status machine shared by every document
//! - `document` - Invoices, estimates and purchase orders
//! - `workflow` - Orchestration of documents, ledger and stores

pub mod document;
pub mod ledger;
pub mod lifecycle;
pub mod workflow;
