//! Document error types.

use rust_decimal::Decimal;
use tally_shared::AppError;
use tally_shared::types::LineItemId;
use thiserror::Error;

use crate::lifecycle::TransitionError;

/// Errors raised by invoices, estimates and purchase orders.
///
/// Every variant is detected before the document is modified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// Illegal status move, action-only target, or missing void reason.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// A document needs at least one line item.
    #[error("Document must have at least one line item")]
    NoLineItems,

    /// Line quantity must be positive.
    #[error("Invalid quantity {quantity} for line item {line_item_id}")]
    InvalidQuantity {
        /// The line item.
        line_item_id: LineItemId,
        /// The rejected quantity.
        quantity: Decimal,
    },

    /// Line unit price cannot be negative.
    #[error("Invalid unit price {unit_price} for line item {line_item_id}")]
    InvalidUnitPrice {
        /// The line item.
        line_item_id: LineItemId,
        /// The rejected price.
        unit_price: Decimal,
    },

    /// Document total must be positive.
    #[error("Document total must be positive, got {0}")]
    NonPositiveTotal(Decimal),

    /// Line item not found on the document.
    #[error("Line item not found: {0}")]
    LineItemNotFound(LineItemId),

    /// Receipt would exceed the ordered quantity.
    #[error(
        "Receiving {requested} on line item {line_item_id} exceeds ordered quantity {ordered} (already received {received})"
    )]
    QuantityExceedsOrdered {
        /// The line item.
        line_item_id: LineItemId,
        /// Ordered quantity.
        ordered: Decimal,
        /// Quantity received so far.
        received: Decimal,
        /// Quantity in this receipt.
        requested: Decimal,
    },

    /// A receipt must name at least one line.
    #[error("Receipt must contain at least one line")]
    EmptyReceipt,

    /// Goods can only be received on accepted or partially received orders.
    #[error("Cannot receive goods on a purchase order in status {status}")]
    NotReceivable {
        /// Current purchase order status.
        status: String,
    },

    /// Payment amount must be positive.
    #[error("Payment amount must be positive, got {0}")]
    InvalidPaymentAmount(Decimal),

    /// Payment larger than the outstanding balance.
    #[error("Payment amount {amount} exceeds balance due {balance_due}")]
    PaymentExceedsBalance {
        /// Attempted payment.
        amount: Decimal,
        /// Outstanding balance.
        balance_due: Decimal,
    },

    /// Document cannot be deleted in its current status.
    #[error("Cannot delete a {subject} in status {status}")]
    NotDeletable {
        /// Kind of document.
        subject: &'static str,
        /// Current status.
        status: String,
    },
}

impl DocumentError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Transition(e) => e.error_code(),
            Self::NoLineItems => "NO_LINE_ITEMS",
            Self::InvalidQuantity { .. } => "INVALID_QUANTITY",
            Self::InvalidUnitPrice { .. } => "INVALID_UNIT_PRICE",
            Self::NonPositiveTotal(_) => "NON_POSITIVE_TOTAL",
            Self::LineItemNotFound(_) => "LINE_ITEM_NOT_FOUND",
            Self::QuantityExceedsOrdered { .. } => "QUANTITY_EXCEEDS_ORDERED",
            Self::EmptyReceipt => "EMPTY_RECEIPT",
            Self::NotReceivable { .. } => "NOT_RECEIVABLE",
            Self::InvalidPaymentAmount(_) => "INVALID_PAYMENT_AMOUNT",
            Self::PaymentExceedsBalance { .. } => "PAYMENT_EXCEEDS_BALANCE",
            Self::NotDeletable { .. } => "NOT_DELETABLE",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Transition(TransitionError::MissingVoidReason)
            | Self::NoLineItems
            | Self::InvalidQuantity { .. }
            | Self::InvalidUnitPrice { .. }
            | Self::NonPositiveTotal(_)
            | Self::EmptyReceipt
            | Self::InvalidPaymentAmount(_) => 400,
            Self::LineItemNotFound(_) => 404,
            Self::Transition(_) | Self::NotReceivable { .. } | Self::NotDeletable { .. } => 409,
            Self::QuantityExceedsOrdered { .. } | Self::PaymentExceedsBalance { .. } => 422,
        }
    }
}

impl From<DocumentError> for AppError {
    fn from(err: DocumentError) -> Self {
        AppError::from_status(err.http_status_code(), format!("{}: {err}", err.error_code()))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_error_codes_and_status() {
        let err = DocumentError::QuantityExceedsOrdered {
            line_item_id: LineItemId::new(),
            ordered: dec!(10),
            received: dec!(3),
            requested: dec!(8),
        };
        assert_eq!(err.error_code(), "QUANTITY_EXCEEDS_ORDERED");
        assert_eq!(err.http_status_code(), 422);

        let err: DocumentError = TransitionError::MissingVoidReason.into();
        assert_eq!(err.error_code(), "VOID_REASON_REQUIRED");
        assert_eq!(err.http_status_code(), 400);
    }

    #[test]
    fn test_into_app_error() {
        let app: AppError = DocumentError::EmptyReceipt.into();
        assert!(matches!(app, AppError::Validation(_)));
    }
}
