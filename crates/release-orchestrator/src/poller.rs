//! # Status Poller (E) — spec §4.5
//!
//! Periodically polls each in-flight task for progress/state and enforces
//! the per-task inactivity timeout. Individual polls are independent jobs
//! on G (spec §4.5 "may run in parallel").

use std::sync::Arc;

use chrono::Utc;
use release_shared::config::CoordinatorConfig;
use release_shared::emitter::EventEmitter;
use release_shared::error::CoordinatorResult;
use release_shared::remote::{RemoteAction, TaskCommand, TaskServiceClient};
use release_shared::state_machine::events::TaskEvent;
use release_shared::state_machine::machine::StateMachine;
use release_shared::store::Store;
use tracing::{info, warn};

use crate::jobs::{Job, JobDispatcher};
use crate::release_engine::ReleaseEngine;

pub struct StatusPoller {
    store: Arc<dyn Store>,
    emitter: Arc<dyn EventEmitter>,
    client: Arc<dyn TaskServiceClient>,
    dispatcher: Arc<dyn JobDispatcher>,
    config: CoordinatorConfig,
}

impl StatusPoller {
    pub fn new(
        store: Arc<dyn Store>,
        emitter: Arc<dyn EventEmitter>,
        client: Arc<dyn TaskServiceClient>,
        dispatcher: Arc<dyn JobDispatcher>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            store,
            emitter,
            client,
            dispatcher,
            config,
        }
    }

    /// Handler for the `status_poll(task_id)` job — spec §4.5 poll loop.
    pub async fn poll_one(&self, task_id: &str, release_engine: &ReleaseEngine) -> CoordinatorResult<()> {
        let task = self.store.get_task(task_id).await?;
        if task.state.is_terminal_for_poll() {
            return Ok(());
        }
        let service = self.store.get_task_service(&task.task_service_id).await?;

        // Step 1: GET status via the get_status command; any transport error
        // cancels the owning release.
        let reply = match self
            .client
            .send_command(
                &service.url,
                TaskCommand {
                    task_id: task.kf_id.clone(),
                    release_id: task.release_id.clone(),
                    action: RemoteAction::GetStatus,
                },
            )
            .await
        {
            Ok(reply) => reply,
            Err(err) => {
                warn!(task_id, error = %err, "status poll failed, cancelling release");
                self.dispatcher
                    .enqueue(Job::CancelRelease {
                        release_id: task.release_id.clone(),
                    })
                    .await;
                return Ok(());
            }
        };

        // Step 2: canceled/failed replies transition the task directly here
        // (these are failure signals the poller itself must act on); any
        // other reported value is routed through the same gather-aware path
        // PATCH uses, so `staged`/`published` still promote the release.
        if let Some(reported) = reply.state.as_deref() {
            if reported != task.state.as_str() {
                match reported {
                    "canceled" => {
                        let machine = StateMachine::new(self.store.as_ref(), self.emitter.as_ref());
                        machine
                            .transition_task(task_id, TaskEvent::Cancel, "task reported canceled")
                            .await?;
                        return Ok(());
                    }
                    "failed" => {
                        let machine = StateMachine::new(self.store.as_ref(), self.emitter.as_ref());
                        machine
                            .transition_task(task_id, TaskEvent::Fail, "task reported failed")
                            .await?;
                        release_engine.fail_release(&task.release_id).await?;
                        return Ok(());
                    }
                    _ => {
                        release_engine
                            .report_task_update(task_id, Some(reported), reply.progress)
                            .await?;
                        return Ok(());
                    }
                }
            }
        }

        // Step 3: inactivity timeout, measured from the task's most recent
        // Event (spec §4.5 step 3, §4 clarification).
        if !task.state.is_terminal_for_poll() {
            if let Some(last_event) = self.store.last_event_for_task(task_id).await? {
                let inactive_for = Utc::now().signed_duration_since(last_event.created_at);
                if inactive_for.num_seconds() as u64 > self.config.task_timeout_secs {
                    warn!(task_id, inactive_for_secs = inactive_for.num_seconds(), "task timed out");
                    self.dispatcher
                        .enqueue(Job::CancelRelease {
                            release_id: task.release_id.clone(),
                        })
                        .await;
                    return Ok(());
                }
            }
        }

        // Step 4-5: progress update (coerced to 0 when missing/null), persisted.
        if reply.progress.unwrap_or(0) != task.progress as i64 {
            let progress = reply.progress.unwrap_or(0);
            self.store
                .update_task(task_id, Box::new(move |t| {
                    t.set_progress(progress);
                    Ok(())
                }))
                .await?;
        }

        info!(task_id, "status poll completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::JobDispatcher;
    use release_shared::emitter::NoopEmitter;
    use release_shared::ids::StudyId;
    use release_shared::models::{Release, Task, TaskService};
    use release_shared::remote::fake::FakeTaskServiceClient;
    use release_shared::remote::TaskCommandResponse;
    use release_shared::store::memory::InMemoryStore;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct RecordingDispatcher {
        jobs: StdMutex<Vec<Job>>,
    }

    #[async_trait::async_trait]
    impl JobDispatcher for RecordingDispatcher {
        async fn enqueue(&self, job: Job) {
            self.jobs.lock().unwrap().push(job);
        }
    }

    fn release_engine(
        store: Arc<dyn Store>,
        emitter: Arc<dyn EventEmitter>,
        client: Arc<dyn TaskServiceClient>,
        dispatcher: Arc<dyn JobDispatcher>,
    ) -> ReleaseEngine {
        ReleaseEngine::new(store, emitter, client, dispatcher)
    }

    #[tokio::test]
    async fn connection_error_cancels_release() {
        let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
        let client = Arc::new(FakeTaskServiceClient::new());
        let emitter: Arc<dyn EventEmitter> = Arc::new(NoopEmitter);
        let dispatcher = Arc::new(RecordingDispatcher::default());

        let service = TaskService::register("svc", "http://ts.com", "admin");
        store.put_task_service(service.clone()).await.unwrap();
        let release = Release::new(
            "R",
            "",
            "admin",
            vec![],
            vec![StudyId::parse("SD_00000001").unwrap()],
        )
        .unwrap();
        store.put_release(release.clone()).await.unwrap();
        let task = Task::new(release.kf_id.clone(), service.kf_id.clone());
        store.put_task(task.clone()).await.unwrap();

        client.queue_command_failure("http://ts.com", "connection refused");

        let poller = StatusPoller::new(
            store.clone(),
            emitter.clone(),
            client.clone() as Arc<dyn TaskServiceClient>,
            dispatcher.clone() as Arc<dyn JobDispatcher>,
            CoordinatorConfig::default(),
        );
        let engine = release_engine(
            store.clone(),
            emitter,
            client as Arc<dyn TaskServiceClient>,
            dispatcher.clone() as Arc<dyn JobDispatcher>,
        );

        poller.poll_one(&task.kf_id, &engine).await.unwrap();

        let jobs = dispatcher.jobs.lock().unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(
            jobs[0],
            Job::CancelRelease {
                release_id: release.kf_id
            }
        );
    }

    #[tokio::test]
    async fn progress_update_is_persisted() {
        let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
        let client = Arc::new(FakeTaskServiceClient::new());
        let emitter: Arc<dyn EventEmitter> = Arc::new(NoopEmitter);
        let dispatcher = Arc::new(RecordingDispatcher::default());

        let service = TaskService::register("svc", "http://ts.com", "admin");
        store.put_task_service(service.clone()).await.unwrap();
        let release = Release::new(
            "R",
            "",
            "admin",
            vec![],
            vec![StudyId::parse("SD_00000001").unwrap()],
        )
        .unwrap();
        store.put_release(release.clone()).await.unwrap();
        let mut task = Task::new(release.kf_id.clone(), service.kf_id.clone());
        task.state = release_shared::state_machine::states::TaskState::Running;
        store.put_task(task.clone()).await.unwrap();

        client.queue_command_reply(
            "http://ts.com",
            TaskCommandResponse {
                state: Some("running".to_string()),
                progress: Some(42),
            },
        );

        let poller = StatusPoller::new(
            store.clone(),
            emitter.clone(),
            client.clone() as Arc<dyn TaskServiceClient>,
            dispatcher.clone() as Arc<dyn JobDispatcher>,
            CoordinatorConfig::default(),
        );
        let engine = release_engine(
            store.clone(),
            emitter,
            client as Arc<dyn TaskServiceClient>,
            dispatcher as Arc<dyn JobDispatcher>,
        );

        poller.poll_one(&task.kf_id, &engine).await.unwrap();

        let reloaded = store.get_task(&task.kf_id).await.unwrap();
        assert_eq!(reloaded.progress, 42);
    }
}
