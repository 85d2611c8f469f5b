//! Table-driven status machines.
//!
//! One generic machine serves every status-bearing record in the core:
//! ledger transactions, invoices, estimates, purchase orders and purchase
//! order lines. Each status enum supplies a static [`TransitionTable`]
//! (legal successors, timestamp bindings, action-only targets) and the
//! machine enforces it.
//!
//! # Modules
//!
//! - `table` - Transition tables and the `Status` trait
//! - `milestone` - Timestamp fields stamped on transitions
//! - `machine` - `Lifecycle`, the status + timestamps carried by a document
//! - `error` - Transition errors

pub mod error;
pub mod machine;
pub mod milestone;
pub mod table;

#[cfg(test)]
mod machine_props;

pub use error::TransitionError;
pub use machine::Lifecycle;
pub use milestone::{Milestone, Milestones};
pub use table::{Status, TransitionTable};
