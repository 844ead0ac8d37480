//! # Task-Service Protocol Client
//!
//! The outbound bit-level protocol from spec §4.5/§6: `GET <base>/status` for
//! health, `POST <base>/tasks` for phase/poll commands. Modeled as an
//! injectable trait (spec §9's "replace the global request client with an
//! injected HTTP client interface") so tests can run deterministically
//! without a live task service.

pub mod fake;
pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RemoteResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteAction {
    Initialize,
    Start,
    Publish,
    Cancel,
    GetStatus,
}

impl RemoteAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::Start => "start",
            Self::Publish => "publish",
            Self::Cancel => "cancel",
            Self::GetStatus => "get_status",
        }
    }
}

/// Body of `POST <base>/tasks` (spec §4.5).
#[derive(Debug, Clone, Serialize)]
pub struct TaskCommand {
    pub task_id: String,
    pub release_id: String,
    pub action: RemoteAction,
}

/// Response body, all fields optional per spec §4.5.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskCommandResponse {
    pub state: Option<String>,
    pub progress: Option<i64>,
}

/// Client seam over a single task service's base URL.
#[async_trait]
pub trait TaskServiceClient: Send + Sync {
    /// `GET <base>/status`; returns `Ok(())` on 2xx, `Err` otherwise
    /// (spec §4.2).
    async fn check_status(&self, base_url: &str) -> RemoteResult<()>;

    /// `POST <base>/tasks` with the given command (spec §4.5).
    async fn send_command(
        &self,
        base_url: &str,
        command: TaskCommand,
    ) -> RemoteResult<TaskCommandResponse>;
}
