//! # Task Service Registry (A) — spec §4.1

use std::sync::Arc;

use release_shared::error::CoordinatorResult;
use release_shared::models::TaskService;
use release_shared::store::Store;
use tracing::info;

use crate::jobs::{Job, JobDispatcher};

pub struct TaskServiceRegistry {
    store: Arc<dyn Store>,
    dispatcher: Arc<dyn JobDispatcher>,
}

impl TaskServiceRegistry {
    pub fn new(store: Arc<dyn Store>, dispatcher: Arc<dyn JobDispatcher>) -> Self {
        Self { store, dispatcher }
    }

    /// Persists a new service with `consecutive_failures = 0`, `enabled =
    /// true`. Does not probe synchronously (spec §4.1).
    pub async fn register(
        &self,
        name: impl Into<String>,
        url: impl Into<String>,
        author: impl Into<String>,
    ) -> CoordinatorResult<TaskService> {
        let service = TaskService::register(name, url, author);
        self.store.put_task_service(service.clone()).await?;
        info!(service_id = %service.kf_id, url = %service.url, "task service registered");
        Ok(service)
    }

    pub async fn get(&self, id: &str) -> CoordinatorResult<TaskService> {
        self.store.get_task_service(id).await
    }

    pub async fn list(&self) -> CoordinatorResult<Vec<TaskService>> {
        self.store.list_task_services().await
    }

    /// Administrative edits (name/description/url/enabled). The health
    /// counter is mutated only by the Health Monitor (spec §4.1).
    pub async fn update(
        &self,
        id: &str,
        f: Box<dyn FnOnce(&mut TaskService) + Send>,
    ) -> CoordinatorResult<TaskService> {
        self.store.update_task_service(id, f).await
    }

    /// Deletes the service and cascades to any Tasks referencing it; any
    /// release left with a dangling task is cancelled (spec §4.1).
    pub async fn delete(&self, id: &str) -> CoordinatorResult<()> {
        let Some(_service) = self.store.delete_task_service(id).await? else {
            return Ok(());
        };

        let mut affected_releases = std::collections::HashSet::new();
        for release in self.store.list_releases().await? {
            let tasks = self.store.list_tasks_for_release(&release.kf_id).await?;
            if tasks.iter().any(|t| t.task_service_id == id) && !release.state.is_terminal() {
                affected_releases.insert(release.kf_id);
            }
        }

        for release_id in affected_releases {
            info!(
                service_id = id,
                release_id = %release_id,
                "cascading task-service deletion into release cancellation"
            );
            self.dispatcher
                .enqueue(Job::CancelRelease { release_id })
                .await;
        }

        Ok(())
    }

    /// Enqueues one health-check job per registered service and returns
    /// immediately (spec §4.1).
    pub async fn trigger_health_sweep(&self) -> CoordinatorResult<()> {
        for service in self.store.list_task_services().await? {
            self.dispatcher
                .enqueue(Job::HealthCheck {
                    service_id: service.kf_id,
                })
                .await;
        }
        Ok(())
    }
}
