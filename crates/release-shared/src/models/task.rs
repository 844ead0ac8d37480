//! Task entity (spec §3, §4.3) — one (release, task-service) pairing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ids;
use crate::state_machine::states::TaskState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub kf_id: String,
    pub uuid: Uuid,
    pub release_id: String,
    pub task_service_id: String,
    pub state: TaskState,
    pub progress: u8,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Created exactly once per (release, enabled service) when the release
    /// leaves `waiting` (spec §3 invariant, §4.4 step 1).
    pub fn new(release_id: impl Into<String>, task_service_id: impl Into<String>) -> Self {
        Self {
            kf_id: ids::generate("TA"),
            uuid: Uuid::new_v4(),
            release_id: release_id.into(),
            task_service_id: task_service_id.into(),
            state: TaskState::Waiting,
            progress: 0,
            created_at: Utc::now(),
        }
    }

    /// Clamp to [0, 100] per spec §9's recommendation on unspecified
    /// `progress` clamping.
    pub fn set_progress(&mut self, progress: i64) {
        self.progress = progress.clamp(0, 100) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_starts_waiting_with_zero_progress() {
        let t = Task::new("RE_AAAAAAAA", "TS_BBBBBBBB");
        assert_eq!(t.state, TaskState::Waiting);
        assert_eq!(t.progress, 0);
        assert!(t.kf_id.starts_with("TA_"));
    }

    #[test]
    fn progress_clamps_above_100() {
        let mut t = Task::new("RE_AAAAAAAA", "TS_BBBBBBBB");
        t.set_progress(150);
        assert_eq!(t.progress, 100);
    }

    #[test]
    fn progress_clamps_below_zero() {
        let mut t = Task::new("RE_AAAAAAAA", "TS_BBBBBBBB");
        t.set_progress(-5);
        assert_eq!(t.progress, 0);
    }
}
