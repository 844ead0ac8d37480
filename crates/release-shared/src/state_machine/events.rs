//! Transition events for the Release and Task state machines.
//!
//! Named after the edges in spec §4.3/§4.4 rather than after target states,
//! so the machine's `transition()` method reads as "what happened", matching
//! the teacher's `StepEvent` naming in `state_transition_handler.rs`.

use std::fmt;

use super::states::{ReleaseState, TaskState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseEvent {
    Initialize,
    Start,
    Staged,
    Publish,
    Complete,
    Cancel,
    Canceled,
    Fail,
}

impl ReleaseEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::Start => "start",
            Self::Staged => "staged",
            Self::Publish => "publish",
            Self::Complete => "complete",
            Self::Cancel => "cancel",
            Self::Canceled => "canceled",
            Self::Fail => "fail",
        }
    }

    /// The single target state this event always leads to, or `None` when
    /// the event is legal from multiple sources but always targets the same
    /// state anyway (true for every release event — see spec §4.4).
    pub fn target(&self) -> ReleaseState {
        match self {
            Self::Initialize => ReleaseState::Initializing,
            Self::Start => ReleaseState::Running,
            Self::Staged => ReleaseState::Staged,
            Self::Publish => ReleaseState::Publishing,
            Self::Complete => ReleaseState::Published,
            Self::Cancel => ReleaseState::Canceling,
            Self::Canceled => ReleaseState::Canceled,
            Self::Fail => ReleaseState::Failed,
        }
    }

    /// Source states from which this event is legal (spec §4.4).
    pub fn allowed_sources(&self) -> &'static [ReleaseState] {
        use ReleaseState::*;
        match self {
            Self::Initialize => &[Waiting],
            Self::Start => &[Initializing],
            Self::Staged => &[Running],
            Self::Publish => &[Staged],
            Self::Complete => &[Publishing],
            Self::Cancel => &[Waiting, Initializing, Running, Staged, Publishing],
            Self::Canceled => &[Canceling],
            Self::Fail => &[
                Waiting,
                Initializing,
                Running,
                Staged,
                Publishing,
                Canceling,
            ],
        }
    }
}

impl fmt::Display for ReleaseEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskEvent {
    Initialize,
    Start,
    Stage,
    Publish,
    Complete,
    Reject,
    Fail,
    Cancel,
}

impl TaskEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::Start => "start",
            Self::Stage => "stage",
            Self::Publish => "publish",
            Self::Complete => "complete",
            Self::Reject => "reject",
            Self::Fail => "fail",
            Self::Cancel => "cancel",
        }
    }

    pub fn target(&self) -> TaskState {
        match self {
            Self::Initialize => TaskState::Initialized,
            Self::Start => TaskState::Running,
            Self::Stage => TaskState::Staged,
            Self::Publish => TaskState::Publishing,
            Self::Complete => TaskState::Published,
            Self::Reject => TaskState::Rejected,
            Self::Fail => TaskState::Failed,
            Self::Cancel => TaskState::Canceled,
        }
    }

    /// Source states from which this event is legal (spec §4.3). `Fail` and
    /// `Cancel` are legal from any non-terminal state; the machine enforces
    /// that separately rather than enumerating every state here.
    pub fn allowed_sources(&self) -> Option<&'static [TaskState]> {
        use TaskState::*;
        match self {
            Self::Initialize => Some(&[Waiting]),
            Self::Start => Some(&[Initialized]),
            Self::Stage => Some(&[Running]),
            Self::Publish => Some(&[Staged]),
            Self::Complete => Some(&[Publishing]),
            Self::Reject => Some(&[Waiting]),
            Self::Fail | Self::Cancel => None,
        }
    }

    /// Whether this event yields an `error`-typed Event rather than `info`
    /// (spec §4.3: "type `error` for `failed`/`rejected`, else `info`").
    pub fn is_error_event(&self) -> bool {
        matches!(self, Self::Fail | Self::Reject)
    }
}

impl fmt::Display for TaskEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl ReleaseEvent {
    pub fn is_error_event(&self) -> bool {
        matches!(self, Self::Fail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_is_legal_from_every_non_terminal_release_state() {
        use ReleaseState::*;
        let sources = ReleaseEvent::Cancel.allowed_sources();
        for s in [Waiting, Initializing, Running, Staged, Publishing] {
            assert!(sources.contains(&s));
        }
        assert!(!sources.contains(&Canceling));
        assert!(!sources.contains(&Canceled));
    }

    #[test]
    fn task_fail_and_cancel_have_no_fixed_source_list() {
        assert!(TaskEvent::Fail.allowed_sources().is_none());
        assert!(TaskEvent::Cancel.allowed_sources().is_none());
    }

    #[test]
    fn reject_only_from_waiting() {
        assert_eq!(TaskEvent::Reject.allowed_sources(), Some(&[TaskState::Waiting][..]));
    }

    #[test]
    fn error_event_classification_matches_spec() {
        assert!(TaskEvent::Fail.is_error_event());
        assert!(TaskEvent::Reject.is_error_event());
        assert!(!TaskEvent::Complete.is_error_event());
        assert!(ReleaseEvent::Fail.is_error_event());
        assert!(!ReleaseEvent::Cancel.is_error_event());
    }
}
