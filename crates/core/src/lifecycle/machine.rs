//! Status plus timestamps carried by every document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::TransitionError;
use super::milestone::{Milestone, Milestones};
use super::table::Status;

/// The lifecycle state of a document: current status, audit times, recorded
/// milestones and the reason it was voided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifecycle<S> {
    /// Current status.
    pub status: S,
    /// When the document was created.
    pub created_at: DateTime<Utc>,
    /// When the status last changed.
    pub updated_at: DateTime<Utc>,
    /// Recorded milestone timestamps.
    #[serde(default)]
    pub milestones: Milestones,
    /// Reason given on the most recent void.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub void_reason: Option<String>,
}

/// A status change that has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition<S> {
    /// Status before the change.
    pub from: S,
    /// Status after the change.
    pub to: S,
    /// Milestone written by this change, if it was not already recorded.
    pub stamped: Option<Milestone>,
}

impl<S: Status> Lifecycle<S> {
    /// Start a lifecycle in `status` at `now`.
    #[must_use]
    pub fn new(status: S, now: DateTime<Utc>) -> Self {
        Self {
            status,
            created_at: now,
            updated_at: now,
            milestones: Milestones::new(),
            void_reason: None,
        }
    }

    /// When `milestone` was recorded.
    #[must_use]
    pub fn milestone(&self, milestone: Milestone) -> Option<DateTime<Utc>> {
        self.milestones.get(milestone)
    }

    /// Plain status change.
    ///
    /// Action-only targets are rejected here; they go through
    /// [`Lifecycle::apply_action`]. `void_reason` is required when the target
    /// stamps [`Milestone::Voided`] and ignored otherwise.
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` if `to` is not a successor of the current status
    /// - `ActionRequired` if `to` is action-only
    /// - `MissingVoidReason` if voiding without a non-empty reason
    pub fn transition(
        &mut self,
        to: S,
        now: DateTime<Utc>,
        void_reason: Option<&str>,
    ) -> Result<Transition<S>, TransitionError> {
        let table = S::table();
        table.check(self.status, to)?;
        if table.is_action_only(to) {
            return Err(TransitionError::ActionRequired {
                subject: table.subject,
                to: to.to_string(),
            });
        }
        self.apply(to, now, void_reason)
    }

    /// Status change performed by a dedicated action (e.g. converting an
    /// estimate). Action-only targets are allowed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if `to` is not a successor of the current
    /// status.
    pub fn apply_action(
        &mut self,
        to: S,
        now: DateTime<Utc>,
    ) -> Result<Transition<S>, TransitionError> {
        S::table().check(self.status, to)?;
        self.apply(to, now, None)
    }

    fn apply(
        &mut self,
        to: S,
        now: DateTime<Utc>,
        void_reason: Option<&str>,
    ) -> Result<Transition<S>, TransitionError> {
        let table = S::table();
        let milestone = table.milestone(to);

        let reason = if milestone == Some(Milestone::Voided) {
            match void_reason.map(str::trim) {
                Some(reason) if !reason.is_empty() => Some(reason.to_string()),
                _ => return Err(TransitionError::MissingVoidReason),
            }
        } else {
            None
        };

        let from = self.status;
        self.status = to;
        self.updated_at = now;
        let stamped = milestone.filter(|m| self.milestones.stamp(*m, now));
        if reason.is_some() {
            self.void_reason = reason;
        }

        debug!(
            subject = table.subject,
            from = %from,
            to = %to,
            stamped = ?stamped,
            "Status transition applied"
        );

        Ok(Transition { from, to, stamped })
    }
}
