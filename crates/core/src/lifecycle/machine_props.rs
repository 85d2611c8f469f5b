//! Property-based tests for the status machine.
//!
//! - Status only ever moves along table edges
//! - A recorded milestone is never overwritten
//! - A rejected transition leaves the lifecycle unchanged

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use super::machine::Lifecycle;
use super::machine::test_status::{ALL, Doc};
use super::table::Status;

fn status_strategy() -> impl Strategy<Value = Doc> {
    prop::sample::select(ALL.to_vec())
}

fn attempts() -> impl Strategy<Value = Vec<(Doc, bool)>> {
    prop::collection::vec((status_strategy(), any::<bool>()), 1..40)
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
}

proptest! {
    #[test]
    fn prop_status_follows_table(steps in attempts()) {
        let table = Doc::table();
        let mut lc = Lifecycle::new(Doc::Draft, base_time());

        for (i, (target, via_action)) in steps.into_iter().enumerate() {
            let now = base_time() + Duration::minutes(i64::try_from(i).unwrap() + 1);
            let before = lc.clone();
            let result = if via_action {
                lc.apply_action(target, now)
            } else {
                lc.transition(target, now, Some("reason"))
            };

            match result {
                Ok(applied) => {
                    prop_assert!(table.allows(before.status, target));
                    prop_assert_eq!(applied.to, target);
                    prop_assert_eq!(lc.status, target);
                    prop_assert!(via_action || !table.is_action_only(target));
                }
                Err(_) => prop_assert_eq!(&lc, &before),
            }
        }
    }

    #[test]
    fn prop_milestones_first_write_wins(steps in attempts()) {
        let mut lc = Lifecycle::new(Doc::Draft, base_time());
        let mut seen: Vec<(super::Milestone, DateTime<Utc>)> = Vec::new();

        for (i, (target, via_action)) in steps.into_iter().enumerate() {
            let now = base_time() + Duration::minutes(i64::try_from(i).unwrap() + 1);
            let _ = if via_action {
                lc.apply_action(target, now)
            } else {
                lc.transition(target, now, Some("reason"))
            };

            for (milestone, at) in &seen {
                prop_assert_eq!(lc.milestone(*milestone), Some(*at));
            }
            seen = lc.milestones.iter().collect();
        }
    }
}
