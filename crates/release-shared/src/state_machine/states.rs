//! State enums for the Release and Task state machines (spec §4.3, §4.4).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Release lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseState {
    Waiting,
    Initializing,
    Running,
    Staged,
    Publishing,
    Published,
    Canceling,
    Canceled,
    Failed,
}

impl ReleaseState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Initializing => "initializing",
            Self::Running => "running",
            Self::Staged => "staged",
            Self::Publishing => "publishing",
            Self::Published => "published",
            Self::Canceling => "canceling",
            Self::Canceled => "canceled",
            Self::Failed => "failed",
        }
    }

    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Published | Self::Canceled | Self::Failed)
    }
}

impl fmt::Display for ReleaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReleaseState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "waiting" => Self::Waiting,
            "initializing" => Self::Initializing,
            "running" => Self::Running,
            "staged" => Self::Staged,
            "publishing" => Self::Publishing,
            "published" => Self::Published,
            "canceling" => Self::Canceling,
            "canceled" => Self::Canceled,
            "failed" => Self::Failed,
            other => return Err(format!("unknown release state: {other}")),
        })
    }
}

/// Task lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Waiting,
    Initialized,
    Running,
    Staged,
    Publishing,
    Published,
    Rejected,
    Failed,
    Canceled,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Initialized => "initialized",
            Self::Running => "running",
            Self::Staged => "staged",
            Self::Publishing => "publishing",
            Self::Published => "published",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Published | Self::Rejected | Self::Failed | Self::Canceled
        )
    }

    /// States the Status Poller still actively watches (spec §4.5 step 3:
    /// "not in a terminal-for-poll state").
    pub fn is_terminal_for_poll(&self) -> bool {
        matches!(
            self,
            Self::Staged | Self::Published | Self::Canceled | Self::Failed
        )
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "waiting" => Self::Waiting,
            "initialized" => Self::Initialized,
            "running" => Self::Running,
            "staged" => Self::Staged,
            "publishing" => Self::Publishing,
            "published" => Self::Published,
            "rejected" => Self::Rejected,
            "failed" => Self::Failed,
            "canceled" => Self::Canceled,
            other => return Err(format!("unknown task state: {other}")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_state_round_trips_through_str() {
        for s in [
            ReleaseState::Waiting,
            ReleaseState::Initializing,
            ReleaseState::Running,
            ReleaseState::Staged,
            ReleaseState::Publishing,
            ReleaseState::Published,
            ReleaseState::Canceling,
            ReleaseState::Canceled,
            ReleaseState::Failed,
        ] {
            assert_eq!(ReleaseState::from_str(s.as_str()).unwrap(), s);
        }
    }

    #[test]
    fn task_state_round_trips_through_str() {
        for s in [
            TaskState::Waiting,
            TaskState::Initialized,
            TaskState::Running,
            TaskState::Staged,
            TaskState::Publishing,
            TaskState::Published,
            TaskState::Rejected,
            TaskState::Failed,
            TaskState::Canceled,
        ] {
            assert_eq!(TaskState::from_str(s.as_str()).unwrap(), s);
        }
    }

    #[test]
    fn terminal_for_poll_matches_spec_list() {
        assert!(TaskState::Staged.is_terminal_for_poll());
        assert!(TaskState::Published.is_terminal_for_poll());
        assert!(TaskState::Canceled.is_terminal_for_poll());
        assert!(TaskState::Failed.is_terminal_for_poll());
        assert!(!TaskState::Running.is_terminal_for_poll());
        assert!(!TaskState::Waiting.is_terminal_for_poll());
    }

    #[test]
    fn unknown_state_string_errors() {
        assert!(ReleaseState::from_str("bogus").is_err());
        assert!(TaskState::from_str("bogus").is_err());
    }
}
