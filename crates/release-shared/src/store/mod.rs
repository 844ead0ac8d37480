//! # Persistent Store Seam
//!
//! The relational store is an external collaborator (spec §1, §6); this
//! module defines the trait boundary the orchestration engine depends on
//! instead of embedding SQL, mirroring how `tasker_shared::system_context`
//! hides pool access behind domain methods. [`memory::InMemoryStore`] is the
//! only implementation shipped here — it is both the default runtime store
//! and the store used in tests, since real persistence is out of scope.

pub mod memory;

use async_trait::async_trait;

use crate::error::CoordinatorResult;
use crate::models::{Event, Release, ReleaseNote, Task, TaskService};

/// Repository seam for every entity the engine mutates. Implementations must
/// serialize concurrent mutation of a single row (spec §5) — the `update_*`
/// methods take a synchronous closure that runs with exclusive access to the
/// row, so "check source state, assign target, done" happens as one
/// uninterruptible step.
#[async_trait]
pub trait Store: Send + Sync {
    async fn put_task_service(&self, service: TaskService) -> CoordinatorResult<()>;
    async fn get_task_service(&self, id: &str) -> CoordinatorResult<TaskService>;
    async fn list_task_services(&self) -> CoordinatorResult<Vec<TaskService>>;
    async fn delete_task_service(&self, id: &str) -> CoordinatorResult<Option<TaskService>>;
    async fn update_task_service(
        &self,
        id: &str,
        f: Box<dyn FnOnce(&mut TaskService) + Send>,
    ) -> CoordinatorResult<TaskService>;

    async fn put_release(&self, release: Release) -> CoordinatorResult<()>;
    async fn get_release(&self, id: &str) -> CoordinatorResult<Release>;
    async fn list_releases(&self) -> CoordinatorResult<Vec<Release>>;
    async fn update_release(
        &self,
        id: &str,
        f: Box<dyn FnOnce(&mut Release) -> CoordinatorResult<()> + Send>,
    ) -> CoordinatorResult<Release>;

    async fn put_task(&self, task: Task) -> CoordinatorResult<()>;
    async fn get_task(&self, id: &str) -> CoordinatorResult<Task>;
    async fn list_tasks_for_release(&self, release_id: &str) -> CoordinatorResult<Vec<Task>>;
    async fn update_task(
        &self,
        id: &str,
        f: Box<dyn FnOnce(&mut Task) -> CoordinatorResult<()> + Send>,
    ) -> CoordinatorResult<Task>;

    async fn append_event(&self, event: Event) -> CoordinatorResult<()>;
    async fn list_events_for_release(&self, release_id: &str) -> CoordinatorResult<Vec<Event>>;
    async fn list_events_for_task(&self, task_id: &str) -> CoordinatorResult<Vec<Event>>;
    /// Most recent event for a task, used to measure inactivity timeout
    /// (spec §4.5 step 3 / §5: "measured from its most recent Event").
    async fn last_event_for_task(&self, task_id: &str) -> CoordinatorResult<Option<Event>>;

    async fn put_release_note(&self, note: ReleaseNote) -> CoordinatorResult<()>;
    async fn list_release_notes(&self, release_id: &str) -> CoordinatorResult<Vec<ReleaseNote>>;
}
