//! Event Journal entity (component F, spec §3, §4.6). Append-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ids;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Info,
    Warning,
    Error,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// An immutable audit record. Holds soft (nullable) references so it
/// survives deletion of the entities it describes (spec §3 Ownership, §9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub kf_id: String,
    pub uuid: Uuid,
    pub event_type: EventType,
    pub message: String,
    pub release_id: Option<String>,
    pub task_id: Option<String>,
    pub task_service_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn new(event_type: EventType, message: impl Into<String>) -> Self {
        Self {
            kf_id: ids::generate("EV"),
            uuid: Uuid::new_v4(),
            event_type,
            message: message.into(),
            release_id: None,
            task_id: None,
            task_service_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_release(mut self, release_id: impl Into<String>) -> Self {
        self.release_id = Some(release_id.into());
        self
    }

    pub fn with_task(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    pub fn with_task_service(mut self, task_service_id: impl Into<String>) -> Self {
        self.task_service_id = Some(task_service_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_chain_sets_soft_references() {
        let ev = Event::new(EventType::Info, "hello")
            .with_release("RE_AAAAAAAA")
            .with_task("TA_BBBBBBBB")
            .with_task_service("TS_CCCCCCCC");
        assert_eq!(ev.release_id.as_deref(), Some("RE_AAAAAAAA"));
        assert_eq!(ev.task_id.as_deref(), Some("TA_BBBBBBBB"));
        assert_eq!(ev.task_service_id.as_deref(), Some("TS_CCCCCCCC"));
    }

    #[test]
    fn fresh_event_has_no_references() {
        let ev = Event::new(EventType::Error, "boom");
        assert!(ev.release_id.is_none());
        assert!(ev.task_id.is_none());
        assert!(ev.task_service_id.is_none());
    }
}
