//! Typed identifiers for ledger and document records.
//!
//! Every id wraps a UUID v7, so ids order roughly by creation time. Each
//! type also knows the record kind it names, which stores use in
//! not-found errors. Passing an `InvoiceId` where a `TransactionId` is
//! expected does not compile.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Text that does not parse as an id of the expected kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} id: '{input}'")]
pub struct IdParseError {
    /// Kind of record the id was meant to name.
    pub kind: &'static str,
    /// The rejected input.
    pub input: String,
}

macro_rules! typed_id {
    ($name:ident, $kind:literal, $doc:literal) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Record kind this id names.
            pub const KIND: &'static str = $kind;

            /// A fresh time-ordered id.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|_| IdParseError {
                        kind: $kind,
                        input: s.to_string(),
                    })
            }
        }
    };
}

typed_id!(TenantId, "tenant", "One company's books.");
typed_id!(AccountId, "account", "A chart-of-accounts entry.");
typed_id!(TransactionId, "transaction", "A ledger transaction.");
typed_id!(InvoiceId, "invoice", "A customer invoice.");
typed_id!(EstimateId, "estimate", "A customer estimate.");
typed_id!(PurchaseOrderId, "purchase order", "A vendor purchase order.");
typed_id!(LineItemId, "line item", "A line on an estimate, invoice or purchase order.");
typed_id!(PaymentId, "payment", "A payment applied to an invoice.");

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
