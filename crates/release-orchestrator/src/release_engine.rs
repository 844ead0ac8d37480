//! # Release State Machine (D) — spec §4.4
//!
//! The fan-out/gather protocol proper. `init_release` and `publish_release`
//! each drive a synchronous fan-out of one remote command + task transition
//! across every task of the release, finishing with the release's own
//! transition. `staged` and `published` are reached autonomously by task
//! services (reported via [`Self::report_task_update`], mirroring the
//! service-pushed `PATCH /tasks/{kf_id}` surface named in spec §6) and
//! gathered here once every task has caught up.

use std::sync::Arc;

use release_shared::emitter::EventEmitter;
use release_shared::error::{CoordinatorError, CoordinatorResult};
use release_shared::ids;
use release_shared::models::{Release, Task};
use release_shared::remote::{RemoteAction, TaskServiceClient};
use release_shared::state_machine::events::{ReleaseEvent, TaskEvent};
use release_shared::state_machine::machine::StateMachine;
use release_shared::state_machine::states::{ReleaseState, TaskState};
use release_shared::store::Store;
use tracing::{info, warn};

use crate::jobs::{Job, JobDispatcher};
use crate::task_engine::TaskEngine;

pub struct ReleaseEngine {
    store: Arc<dyn Store>,
    emitter: Arc<dyn EventEmitter>,
    dispatcher: Arc<dyn JobDispatcher>,
    task_engine: TaskEngine,
}

impl ReleaseEngine {
    pub fn new(
        store: Arc<dyn Store>,
        emitter: Arc<dyn EventEmitter>,
        client: Arc<dyn TaskServiceClient>,
        dispatcher: Arc<dyn JobDispatcher>,
    ) -> Self {
        let task_engine = TaskEngine::new(store.clone(), emitter.clone(), client);
        Self {
            store,
            emitter,
            dispatcher,
            task_engine,
        }
    }

    /// Validates `studies`, persists the release in `waiting`. Tasks are not
    /// created here — they are snapshotted when the release leaves
    /// `waiting` (spec §4.4 step 1, §9 "snapshot of participants").
    pub async fn create_release(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
        author: impl Into<String>,
        tags: Vec<String>,
        raw_studies: &[String],
    ) -> CoordinatorResult<Release> {
        let studies = ids::validate_studies(raw_studies).map_err(CoordinatorError::validation)?;
        let release = Release::new(name, description, author, tags, studies)
            .map_err(CoordinatorError::validation)?;
        self.store.put_release(release.clone()).await?;
        info!(release_id = %release.kf_id, "release created");
        Ok(release)
    }

    /// Handler for the `init_release(release_id)` job: snapshots enabled
    /// task services, fans out `initialize` then `start`, and lands the
    /// release on `running` (spec §4.4 step 1-2, table rows 1-2).
    pub async fn init_release(&self, release_id: &str) -> CoordinatorResult<()> {
        let machine = StateMachine::new(self.store.as_ref(), self.emitter.as_ref());
        if let Err(e) = machine
            .transition_release(release_id, ReleaseEvent::Initialize, "release initializing")
            .await
        {
            return self.handle_noop_or_propagate(e);
        }

        let mut tasks = Vec::new();
        for service in self.store.list_task_services().await? {
            if !service.enabled {
                continue;
            }
            let task = Task::new(release_id, service.kf_id.clone());
            self.store.put_task(task.clone()).await?;
            tasks.push(task);
        }
        info!(release_id, task_count = tasks.len(), "tasks snapshotted for release");

        for task in &tasks {
            if let Err(e) = self
                .task_engine
                .send_command_and_transition(&task.kf_id, RemoteAction::Initialize, TaskEvent::Initialize)
                .await
            {
                return self.cancel_on_remote_failure(release_id, e).await;
            }
        }

        for task in &tasks {
            if let Err(e) = self
                .task_engine
                .send_command_and_transition(&task.kf_id, RemoteAction::Start, TaskEvent::Start)
                .await
            {
                return self.cancel_on_remote_failure(release_id, e).await;
            }
        }

        if let Err(e) = machine
            .transition_release(release_id, ReleaseEvent::Start, "all tasks running")
            .await
        {
            return self.handle_noop_or_propagate(e);
        }
        Ok(())
    }

    /// Handler for the `publish_release(release_id)` job: valid only from
    /// `staged` (spec §4.4 "publish is user-initiated"). Fans out `publish`
    /// to every task, landing the release on `publishing`.
    pub async fn publish_release(&self, release_id: &str) -> CoordinatorResult<()> {
        let machine = StateMachine::new(self.store.as_ref(), self.emitter.as_ref());
        machine
            .transition_release(release_id, ReleaseEvent::Publish, "release publishing")
            .await?;

        let tasks = self.store.list_tasks_for_release(release_id).await?;
        for task in &tasks {
            if let Err(e) = self
                .task_engine
                .send_command_and_transition(&task.kf_id, RemoteAction::Publish, TaskEvent::Publish)
                .await
            {
                return self.cancel_on_remote_failure(release_id, e).await;
            }
        }
        Ok(())
    }

    /// Handler for the `cancel_release(release_id)` job (spec §4.4 "cancel
    /// propagation"). Idempotent against a release already `canceling` or
    /// terminal (spec §9 open question).
    pub async fn cancel_release(&self, release_id: &str) -> CoordinatorResult<()> {
        let release = self.store.get_release(release_id).await?;
        if release.state != ReleaseState::Canceling {
            let machine = StateMachine::new(self.store.as_ref(), self.emitter.as_ref());
            if let Err(e) = machine
                .transition_release(release_id, ReleaseEvent::Cancel, "release canceling")
                .await
            {
                return self.handle_noop_or_propagate(e);
            }
        }

        let tasks = self.store.list_tasks_for_release(release_id).await?;
        for task in &tasks {
            if task.state.is_terminal() {
                continue;
            }
            self.task_engine.cancel(&task.kf_id).await?;
        }
        let tasks_after = self.store.list_tasks_for_release(release_id).await?;
        let all_terminal = tasks_after.iter().all(|t| t.state.is_terminal());

        // A release driven here by `fail_release` is already terminal
        // (`failed`) by the time its tasks finish cancelling; only land on
        // `canceled` when the release is still actually `canceling`.
        if all_terminal {
            let release_now = self.store.get_release(release_id).await?;
            if release_now.state == ReleaseState::Canceling {
                let machine = StateMachine::new(self.store.as_ref(), self.emitter.as_ref());
                machine
                    .transition_release(release_id, ReleaseEvent::Canceled, "release canceled")
                    .await?;
            }
        }
        Ok(())
    }

    /// Forces the release to `failed` and enqueues the cancel-propagation
    /// job (spec §4.4 step 4: "Any task entering `failed` forces the release
    /// to `failed` and enqueues a cancel job for the release"). Idempotent:
    /// a release already `failed` (or otherwise past the point `fail` is
    /// legal from) is a no-op here, since a concurrent task failure may have
    /// already forced it.
    pub async fn fail_release(&self, release_id: &str) -> CoordinatorResult<()> {
        let machine = StateMachine::new(self.store.as_ref(), self.emitter.as_ref());
        if let Err(e) = machine
            .transition_release(release_id, ReleaseEvent::Fail, "task entered failed")
            .await
        {
            self.handle_noop_or_propagate(e)?;
        }
        self.dispatcher
            .enqueue(Job::CancelRelease {
                release_id: release_id.to_string(),
            })
            .await;
        Ok(())
    }

    /// Public entry point for user/administrative cancellation (e.g. `DELETE
    /// /releases/{kf_id}` in spec §6, scenario 3): marks the release
    /// canceling immediately (cooperative cancellation, spec §5) and
    /// enqueues the fan-out job.
    pub async fn cancel(&self, release_id: &str) -> CoordinatorResult<()> {
        self.dispatcher
            .enqueue(Job::CancelRelease {
                release_id: release_id.to_string(),
            })
            .await;
        Ok(())
    }

    /// Applies a state/progress report from a task service — whether
    /// pushed via `PATCH /tasks/{kf_id}` or pulled by the Status Poller
    /// (spec §4.5 step 2, §6). `canceled` transitions just the task;
    /// `failed` transitions the task and forces the owning release to
    /// `failed` too (spec §4.4 step 4); `staged`/`published` transition the
    /// task only when it is the task's legal next step; any other reported
    /// value is informational only, per spec §4.5 step 2 ("the coordinator
    /// does not unilaterally fast-forward, it waits for the phase driver") —
    /// this is the documented resolution of that clause's ambiguity (see
    /// DESIGN.md).
    pub async fn report_task_update(
        &self,
        task_id: &str,
        reported_state: Option<&str>,
        reported_progress: Option<i64>,
    ) -> CoordinatorResult<Task> {
        let task = self.store.get_task(task_id).await?;
        let progress = reported_progress.unwrap_or(0);

        let task_after_progress = self
            .store
            .update_task(
                task_id,
                Box::new(move |t| {
                    t.set_progress(progress);
                    Ok(())
                }),
            )
            .await?;

        let reported = reported_state.unwrap_or(task_after_progress.state.as_str());
        if reported == task_after_progress.state.as_str() {
            return Ok(task_after_progress);
        }

        let event = match reported {
            "canceled" => Some(TaskEvent::Cancel),
            "failed" => Some(TaskEvent::Fail),
            "staged" if task_after_progress.state == TaskState::Running => Some(TaskEvent::Stage),
            "published" if task_after_progress.state == TaskState::Publishing => {
                Some(TaskEvent::Complete)
            }
            _ => None,
        };

        let Some(event) = event else {
            return Ok(task_after_progress);
        };

        let machine = StateMachine::new(self.store.as_ref(), self.emitter.as_ref());
        let updated = machine
            .transition_task(task_id, event, format!("task reported state {reported}"))
            .await?;

        if event == TaskEvent::Fail {
            warn!(task_id, "task reported failure, forcing release to failed");
            self.fail_release(&updated.release_id).await?;
        } else if matches!(event, TaskEvent::Stage | TaskEvent::Complete) {
            self.try_promote(&updated.release_id).await?;
        }

        Ok(updated)
    }

    /// Gather step (spec §4.4 step 3): promotes the release once every task
    /// has independently reached the phase's target state.
    async fn try_promote(&self, release_id: &str) -> CoordinatorResult<()> {
        let release = self.store.get_release(release_id).await?;
        let tasks = self.store.list_tasks_for_release(release_id).await?;
        if tasks.is_empty() {
            return Ok(());
        }

        let (target_event, target_state) = match release.state {
            ReleaseState::Running => (ReleaseEvent::Staged, TaskState::Staged),
            ReleaseState::Publishing => (ReleaseEvent::Complete, TaskState::Published),
            _ => return Ok(()),
        };

        if tasks.iter().all(|t| t.state == target_state) {
            let machine = StateMachine::new(self.store.as_ref(), self.emitter.as_ref());
            machine
                .transition_release(release_id, target_event, "all tasks reached target state")
                .await?;
        }
        Ok(())
    }

    async fn cancel_on_remote_failure(
        &self,
        release_id: &str,
        error: CoordinatorError,
    ) -> CoordinatorResult<()> {
        warn!(release_id, error = %error, "remote call failed during fan-out, cancelling release");
        self.dispatcher
            .enqueue(Job::CancelRelease {
                release_id: release_id.to_string(),
            })
            .await;
        Ok(())
    }

    /// Background-job handlers must treat an already-satisfied or illegal
    /// transition as a no-op + log rather than an error (spec §4.7, §9).
    fn handle_noop_or_propagate(&self, error: CoordinatorError) -> CoordinatorResult<()> {
        match &error {
            CoordinatorError::InvalidTransition { .. } => {
                info!(error = %error, "job is a no-op against current state");
                Ok(())
            }
            _ => Err(error),
        }
    }
}
