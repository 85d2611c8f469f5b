//! Transition closure for every document status set.
//!
//! A move that is not an edge of the table is rejected and leaves the
//! lifecycle exactly as it was; a move that succeeds is always an edge.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use super::{EstimateStatus, InvoiceStatus, LineItemStatus, PurchaseOrderStatus};
use crate::lifecycle::{Lifecycle, Milestone, Status};

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
}

fn walk<S: Status>(start: S, steps: &[(S, bool)]) -> Result<(), TestCaseError> {
    let table = S::table();
    let mut lc = Lifecycle::new(start, base_time());

    for (i, (target, via_action)) in steps.iter().copied().enumerate() {
        let now = base_time() + Duration::hours(i64::try_from(i).unwrap() + 1);
        let before = lc.clone();
        let result = if via_action {
            lc.apply_action(target, now)
        } else {
            lc.transition(target, now, Some("correction"))
        };

        let permitted = if via_action {
            table.milestone(target) != Some(Milestone::Voided)
        } else {
            !table.is_action_only(target)
        };
        if table.allows(before.status, target) && permitted {
            prop_assert!(result.is_ok());
            prop_assert_eq!(lc.status, target);
        } else {
            prop_assert!(result.is_err());
            prop_assert_eq!(&lc, &before);
        }
    }
    Ok(())
}

fn steps<S: Status>(all: &'static [S]) -> impl Strategy<Value = Vec<(S, bool)>> {
    prop::collection::vec((prop::sample::select(all), any::<bool>()), 1..30)
}

proptest! {
    #[test]
    fn prop_invoice_transitions_closed(path in steps(&InvoiceStatus::ALL)) {
        walk(InvoiceStatus::Draft, &path)?;
    }

    #[test]
    fn prop_estimate_transitions_closed(path in steps(&EstimateStatus::ALL)) {
        walk(EstimateStatus::Draft, &path)?;
    }

    #[test]
    fn prop_purchase_order_transitions_closed(path in steps(&PurchaseOrderStatus::ALL)) {
        walk(PurchaseOrderStatus::Draft, &path)?;
    }

    #[test]
    fn prop_line_item_transitions_closed(path in steps(&[
        LineItemStatus::Pending,
        LineItemStatus::PartiallyReceived,
        LineItemStatus::Received,
        LineItemStatus::Cancelled,
    ])) {
        walk(LineItemStatus::Pending, &path)?;
    }
}

#[test]
fn test_invoice_void_to_paid_rejected() {
    let mut lc = Lifecycle::new(InvoiceStatus::Void, base_time());
    assert!(lc.apply_action(InvoiceStatus::Paid, base_time()).is_err());
    assert!(lc.transition(InvoiceStatus::Paid, base_time(), None).is_err());
    assert_eq!(lc.status, InvoiceStatus::Void);
}
