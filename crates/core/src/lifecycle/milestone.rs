//! Timestamp fields stamped by status transitions.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A lifecycle timestamp a transition can set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    /// Document was sent to the counterparty.
    Sent,
    /// Counterparty accepted.
    Accepted,
    /// Counterparty declined.
    Declined,
    /// Estimate lapsed.
    Expired,
    /// Estimate was converted into an invoice.
    Converted,
    /// Invoice was fully paid.
    Paid,
    /// Document was cancelled.
    Cancelled,
    /// Document was voided.
    Voided,
    /// Goods were fully received.
    Received,
    /// Purchase order was closed.
    Closed,
}

impl Milestone {
    /// Field-style name, e.g. `sent_at`.
    #[must_use]
    pub fn field_name(self) -> &'static str {
        match self {
            Self::Sent => "sent_at",
            Self::Accepted => "accepted_at",
            Self::Declined => "declined_at",
            Self::Expired => "expired_at",
            Self::Converted => "converted_at",
            Self::Paid => "paid_at",
            Self::Cancelled => "cancelled_at",
            Self::Voided => "voided_at",
            Self::Received => "received_at",
            Self::Closed => "closed_at",
        }
    }
}

impl fmt::Display for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.field_name())
    }
}

/// The set of milestone timestamps recorded on a document.
///
/// Stamping is first-write-wins: once a milestone is recorded it is never
/// overwritten, so re-entering a status keeps the original time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Milestones(BTreeMap<Milestone, DateTime<Utc>>);

impl Milestones {
    /// Empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `milestone` at `at` unless already recorded.
    ///
    /// Returns true if the timestamp was written.
    pub fn stamp(&mut self, milestone: Milestone, at: DateTime<Utc>) -> bool {
        if self.0.contains_key(&milestone) {
            return false;
        }
        self.0.insert(milestone, at);
        true
    }

    /// When `milestone` was recorded.
    #[must_use]
    pub fn get(&self, milestone: Milestone) -> Option<DateTime<Utc>> {
        self.0.get(&milestone).copied()
    }

    /// Returns true if `milestone` has been recorded.
    #[must_use]
    pub fn contains(&self, milestone: Milestone) -> bool {
        self.0.contains_key(&milestone)
    }

    /// Iterate recorded milestones in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Milestone, DateTime<Utc>)> + '_ {
        self.0.iter().map(|(m, at)| (*m, *at))
    }
}
