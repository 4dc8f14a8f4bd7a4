//! Per-user reveal state
//!
//! ```text
//! NoAssignment ──generation run──▶ Assigned(receiver) ──mark_viewed──▶ Viewed(receiver)
//!       ▲                                                                    │
//!       └──────────── new generation run / user deletion ────────────────────┘
//! ```
//!
//! Reading the state never transitions it. Only an explicit `mark_viewed`
//! moves `Assigned` to `Viewed`, and repeating it is a no-op.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::error::{CoreError, Result};
use crate::id::UserId;

/// A persisted pairing row: who gives to whom, and whether the giver has
/// completed the reveal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub giver: UserId,
    pub receiver: UserId,
    pub has_viewed: bool,
}

impl Assignment {
    pub fn reveal_state(&self) -> RevealState<UserId> {
        RevealState::from_record(Some(self.receiver), self.has_viewed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "state", content = "receiver", rename_all = "snake_case")]
pub enum RevealState<T> {
    NoAssignment,
    Assigned(T),
    Viewed(T),
}

/// Read-only view of an assignment returned by a reveal query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentView<T> {
    pub receiver: T,
    pub has_viewed: bool,
}

/// Outcome of a mark-viewed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MarkViewed {
    /// The state moved from `Assigned` to `Viewed`
    Marked,
    /// The state was already `Viewed`; nothing changed
    AlreadyViewed,
}

impl MarkViewed {
    pub fn changed(self) -> bool {
        matches!(self, Self::Marked)
    }
}

impl<T> Default for RevealState<T> {
    fn default() -> Self {
        Self::NoAssignment
    }
}

impl<T: Clone> RevealState<T> {
    /// Rebuild the state from stored columns. A missing receiver always means
    /// `NoAssignment`, whatever the viewed flag says.
    pub fn from_record(receiver: Option<T>, has_viewed: bool) -> Self {
        match (receiver, has_viewed) {
            (None, _) => Self::NoAssignment,
            (Some(receiver), false) => Self::Assigned(receiver),
            (Some(receiver), true) => Self::Viewed(receiver),
        }
    }

    pub fn has_assignment(&self) -> bool {
        !matches!(self, Self::NoAssignment)
    }

    pub fn has_viewed(&self) -> bool {
        matches!(self, Self::Viewed(_))
    }

    pub fn receiver(&self) -> Option<&T> {
        match self {
            Self::NoAssignment => None,
            Self::Assigned(receiver) | Self::Viewed(receiver) => Some(receiver),
        }
    }

    /// Query the assignment of `owner` without changing state.
    pub fn view(&self, owner: &impl Display) -> Result<AssignmentView<T>> {
        match self {
            Self::NoAssignment => Err(CoreError::no_assignment(owner)),
            Self::Assigned(receiver) => Ok(AssignmentView {
                receiver: receiver.clone(),
                has_viewed: false,
            }),
            Self::Viewed(receiver) => Ok(AssignmentView {
                receiver: receiver.clone(),
                has_viewed: true,
            }),
        }
    }

    /// Apply the one-way viewed transition for `owner`.
    pub fn mark_viewed(self, owner: &impl Display) -> Result<(Self, MarkViewed)> {
        match self {
            Self::NoAssignment => Err(CoreError::no_assignment(owner)),
            Self::Assigned(receiver) => Ok((Self::Viewed(receiver), MarkViewed::Marked)),
            viewed @ Self::Viewed(_) => Ok((viewed, MarkViewed::AlreadyViewed)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_record() {
        assert_eq!(
            RevealState::<u32>::from_record(None, true),
            RevealState::NoAssignment
        );
        assert_eq!(RevealState::from_record(Some(4), false), RevealState::Assigned(4));
        assert_eq!(RevealState::from_record(Some(4), true), RevealState::Viewed(4));
    }

    #[test]
    fn test_view_is_read_only() {
        let state = RevealState::Assigned("bob");
        let first = state.view(&"alice").unwrap();
        let second = state.view(&"alice").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.receiver, "bob");
        assert!(!first.has_viewed);
        assert_eq!(state, RevealState::Assigned("bob"));
    }

    #[test]
    fn test_no_assignment_errors() {
        let state = RevealState::<&str>::NoAssignment;
        assert!(matches!(
            state.view(&"alice"),
            Err(CoreError::NoAssignment { user_id }) if user_id == "alice"
        ));
        assert!(matches!(
            state.mark_viewed(&"alice"),
            Err(CoreError::NoAssignment { .. })
        ));
    }

    #[test]
    fn test_mark_viewed_is_idempotent() {
        let state = RevealState::Assigned("bob");

        let (state, outcome) = state.mark_viewed(&"alice").unwrap();
        assert_eq!(outcome, MarkViewed::Marked);
        assert!(outcome.changed());
        assert_eq!(state, RevealState::Viewed("bob"));

        let (state, outcome) = state.mark_viewed(&"alice").unwrap();
        assert_eq!(outcome, MarkViewed::AlreadyViewed);
        assert!(!outcome.changed());
        assert_eq!(state, RevealState::Viewed("bob"));

        let view = state.view(&"alice").unwrap();
        assert_eq!(view.receiver, "bob");
        assert!(view.has_viewed);
    }

    #[test]
    fn test_flags() {
        let none = RevealState::<u8>::NoAssignment;
        assert!(!none.has_assignment());
        assert!(!none.has_viewed());
        assert_eq!(none.receiver(), None);

        let assigned = RevealState::Assigned(1u8);
        assert!(assigned.has_assignment());
        assert!(!assigned.has_viewed());

        let viewed = RevealState::Viewed(1u8);
        assert!(viewed.has_assignment());
        assert!(viewed.has_viewed());
        assert_eq!(viewed.receiver(), Some(&1));
    }

    #[test]
    fn test_assignment_record_state() {
        let giver = UserId::generate();
        let receiver = UserId::generate();
        let row = Assignment {
            giver,
            receiver,
            has_viewed: false,
        };
        assert_eq!(row.reveal_state(), RevealState::Assigned(receiver));
    }
}
