//! # Task State Machine (C) — spec §4.3
//!
//! Owns the one remote call a task makes per phase transition. The generic
//! `transition()` primitive (validate/persist/journal) lives in
//! `release_shared::state_machine::machine::StateMachine`; this module wraps
//! it with the remote side effect spec §4.3 describes for the
//! release-driven phase commands.

use std::sync::Arc;

use release_shared::emitter::EventEmitter;
use release_shared::error::CoordinatorResult;
use release_shared::models::Task;
use release_shared::remote::{RemoteAction, TaskCommand, TaskServiceClient};
use release_shared::state_machine::machine::StateMachine;
use release_shared::state_machine::events::TaskEvent;
use release_shared::store::Store;
use tracing::info;

pub struct TaskEngine {
    store: Arc<dyn Store>,
    emitter: Arc<dyn EventEmitter>,
    client: Arc<dyn TaskServiceClient>,
}

impl TaskEngine {
    pub fn new(
        store: Arc<dyn Store>,
        emitter: Arc<dyn EventEmitter>,
        client: Arc<dyn TaskServiceClient>,
    ) -> Self {
        Self {
            store,
            emitter,
            client,
        }
    }

    /// Sends `action` to the task's service, then transitions the task on
    /// success. A remote failure here is propagated for the caller (the
    /// Release State Machine's phase driver) to turn into a release cancel
    /// — the task itself is left in its prior state (spec §7: remote
    /// unavailability cancels the owning release, it does not itself fail
    /// the task).
    pub async fn send_command_and_transition(
        &self,
        task_id: &str,
        action: RemoteAction,
        event: TaskEvent,
    ) -> CoordinatorResult<Task> {
        let task = self.store.get_task(task_id).await?;
        let service = self.store.get_task_service(&task.task_service_id).await?;

        self.client
            .send_command(
                &service.url,
                TaskCommand {
                    task_id: task.kf_id.clone(),
                    release_id: task.release_id.clone(),
                    action,
                },
            )
            .await?;

        let machine = StateMachine::new(self.store.as_ref(), self.emitter.as_ref());
        let message = format!("task {task_id} changed via {action:?}");
        let updated = machine.transition_task(task_id, event, message).await?;
        info!(task_id, event = %event, "task command delivered and transitioned");
        Ok(updated)
    }

    /// Cancel propagation's per-task step (spec §4.4): best-effort cancel
    /// command, then the task is transitioned to `canceled` regardless of
    /// whether the remote call succeeded — cancellation is cooperative, not
    /// acknowledged (spec §5).
    pub async fn cancel(&self, task_id: &str) -> CoordinatorResult<Task> {
        let task = self.store.get_task(task_id).await?;
        if let Ok(service) = self.store.get_task_service(&task.task_service_id).await {
            let _ = self
                .client
                .send_command(
                    &service.url,
                    TaskCommand {
                        task_id: task.kf_id.clone(),
                        release_id: task.release_id.clone(),
                        action: RemoteAction::Cancel,
                    },
                )
                .await;
        }

        let machine = StateMachine::new(self.store.as_ref(), self.emitter.as_ref());
        machine
            .transition_task(task_id, TaskEvent::Cancel, "task canceled")
            .await
    }

    /// Forces a task to `failed` without a remote side effect (spec §4.3:
    /// "terminal failures/cancels do not send a command").
    pub async fn fail(&self, task_id: &str, reason: impl Into<String>) -> CoordinatorResult<Task> {
        let machine = StateMachine::new(self.store.as_ref(), self.emitter.as_ref());
        machine.transition_task(task_id, TaskEvent::Fail, reason).await
    }
}
