//! In-memory fake task service client for deterministic tests (spec §9's
//! injected HTTP client interface). Canned replies are queued per base URL;
//! an empty queue defaults to success.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::{RemoteError, RemoteResult};

use super::{TaskCommand, TaskCommandResponse, TaskServiceClient};

#[derive(Debug, Clone)]
pub enum CannedStatus {
    Ok,
    Failure,
}

#[derive(Debug, Clone)]
pub enum CannedCommand {
    Reply(TaskCommandResponse),
    Failure(String),
}

#[derive(Debug, Default)]
pub struct FakeTaskServiceClient {
    status_queue: DashMap<String, Mutex<VecDeque<CannedStatus>>>,
    command_queue: DashMap<String, Mutex<VecDeque<CannedCommand>>>,
    pub sent_commands: Mutex<Vec<(String, TaskCommand)>>,
}

impl FakeTaskServiceClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_status(&self, base_url: impl Into<String>, status: CannedStatus) {
        self.status_queue
            .entry(base_url.into())
            .or_default()
            .lock()
            .unwrap()
            .push_back(status);
    }

    pub fn queue_command_reply(&self, base_url: impl Into<String>, reply: TaskCommandResponse) {
        self.command_queue
            .entry(base_url.into())
            .or_default()
            .lock()
            .unwrap()
            .push_back(CannedCommand::Reply(reply));
    }

    pub fn queue_command_failure(&self, base_url: impl Into<String>, reason: impl Into<String>) {
        self.command_queue
            .entry(base_url.into())
            .or_default()
            .lock()
            .unwrap()
            .push_back(CannedCommand::Failure(reason.into()));
    }
}

#[async_trait]
impl TaskServiceClient for FakeTaskServiceClient {
    async fn check_status(&self, base_url: &str) -> RemoteResult<()> {
        let next = self
            .status_queue
            .get(base_url)
            .and_then(|q| q.lock().unwrap().pop_front());
        match next {
            None | Some(CannedStatus::Ok) => Ok(()),
            Some(CannedStatus::Failure) => Err(RemoteError::Status {
                url: format!("{base_url}/status"),
                status: 503,
            }),
        }
    }

    async fn send_command(
        &self,
        base_url: &str,
        command: TaskCommand,
    ) -> RemoteResult<TaskCommandResponse> {
        self.sent_commands
            .lock()
            .unwrap()
            .push((base_url.to_string(), command.clone()));

        let next = self
            .command_queue
            .get(base_url)
            .and_then(|q| q.lock().unwrap().pop_front());
        match next {
            None => Ok(TaskCommandResponse::default()),
            Some(CannedCommand::Reply(r)) => Ok(r),
            Some(CannedCommand::Failure(reason)) => Err(RemoteError::Http(reason)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::RemoteAction;

    #[tokio::test]
    async fn default_check_status_succeeds() {
        let fake = FakeTaskServiceClient::new();
        assert!(fake.check_status("http://ts.com").await.is_ok());
    }

    #[tokio::test]
    async fn queued_failure_is_returned_once() {
        let fake = FakeTaskServiceClient::new();
        fake.queue_status("http://ts.com", CannedStatus::Failure);
        assert!(fake.check_status("http://ts.com").await.is_err());
        assert!(fake.check_status("http://ts.com").await.is_ok());
    }

    #[tokio::test]
    async fn send_command_records_call_and_returns_queued_reply() {
        let fake = FakeTaskServiceClient::new();
        fake.queue_command_reply(
            "http://ts.com",
            TaskCommandResponse {
                state: Some("running".to_string()),
                progress: Some(0),
            },
        );
        let reply = fake
            .send_command(
                "http://ts.com",
                TaskCommand {
                    task_id: "TA_X".to_string(),
                    release_id: "RE_X".to_string(),
                    action: RemoteAction::Start,
                },
            )
            .await
            .unwrap();
        assert_eq!(reply.state.as_deref(), Some("running"));
        assert_eq!(fake.sent_commands.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn queued_command_failure_surfaces_as_error() {
        let fake = FakeTaskServiceClient::new();
        fake.queue_command_failure("http://ts.com", "connection refused");
        let err = fake
            .send_command(
                "http://ts.com",
                TaskCommand {
                    task_id: "TA_X".to_string(),
                    release_id: "RE_X".to_string(),
                    action: RemoteAction::GetStatus,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Http(_)));
    }
}
