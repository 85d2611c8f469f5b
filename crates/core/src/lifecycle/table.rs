//! Static transition tables.

use std::fmt;

use super::error::TransitionError;
use super::milestone::Milestone;

/// A status enum governed by a [`TransitionTable`].
pub trait Status: Copy + Eq + fmt::Debug + fmt::Display + 'static {
    /// The transition table for this status set.
    fn table() -> &'static TransitionTable<Self>;
}

/// Declarative description of a status machine.
///
/// `edges` lists the legal successors of each status; a status absent from
/// `edges` (or mapped to an empty slice) is terminal. `stamps` binds target
/// statuses to the timestamp they set. `action_only` statuses may only be
/// entered through a dedicated operation, never through a plain status
/// change.
#[derive(Debug)]
pub struct TransitionTable<S: 'static> {
    /// Name of the governed record, used in error messages.
    pub subject: &'static str,
    /// Legal successors per status.
    pub edges: &'static [(S, &'static [S])],
    /// Timestamp set on entering a status.
    pub stamps: &'static [(S, Milestone)],
    /// Statuses reachable only through a dedicated action.
    pub action_only: &'static [S],
}

impl<S: Status> TransitionTable<S> {
    /// Legal successors of `from`.
    #[must_use]
    pub fn successors(&self, from: S) -> &'static [S] {
        self.edges
            .iter()
            .find(|(status, _)| *status == from)
            .map_or(&[], |(_, next)| *next)
    }

    /// Returns true if `from -> to` is an edge of the table.
    #[must_use]
    pub fn allows(&self, from: S, to: S) -> bool {
        self.successors(from).contains(&to)
    }

    /// Returns true if `status` has no successors.
    #[must_use]
    pub fn is_terminal(&self, status: S) -> bool {
        self.successors(status).is_empty()
    }

    /// Returns true if `status` may only be entered through its action.
    #[must_use]
    pub fn is_action_only(&self, status: S) -> bool {
        self.action_only.contains(&status)
    }

    /// The timestamp bound to entering `to`, if any.
    #[must_use]
    pub fn milestone(&self, to: S) -> Option<Milestone> {
        self.stamps
            .iter()
            .find(|(status, _)| *status == to)
            .map(|(_, milestone)| *milestone)
    }

    /// Verify that `from -> to` is legal.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError::InvalidTransition` if the edge is absent.
    pub fn check(&self, from: S, to: S) -> Result<(), TransitionError> {
        if self.allows(from, to) {
            Ok(())
        } else {
            Err(self.invalid(from, to))
        }
    }

    /// Build the rejection error for `from -> to`.
    #[must_use]
    pub fn invalid(&self, from: S, to: S) -> TransitionError {
        TransitionError::InvalidTransition {
            subject: self.subject,
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}
