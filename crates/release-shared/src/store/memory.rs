//! `dashmap`-backed store. Per-key mutation is serialized by `DashMap`'s
//! shard locking, giving the "row-level lock" option spec §5 names without
//! standing up a real database.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::{CoordinatorError, CoordinatorResult};
use crate::models::{Event, Release, ReleaseNote, Task, TaskService};

use super::Store;

#[derive(Debug, Default)]
pub struct InMemoryStore {
    task_services: DashMap<String, TaskService>,
    releases: DashMap<String, Release>,
    tasks: DashMap<String, Task>,
    events: DashMap<String, Event>,
    release_notes: DashMap<String, ReleaseNote>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn put_task_service(&self, service: TaskService) -> CoordinatorResult<()> {
        self.task_services.insert(service.kf_id.clone(), service);
        Ok(())
    }

    async fn get_task_service(&self, id: &str) -> CoordinatorResult<TaskService> {
        self.task_services
            .get(id)
            .map(|r| r.clone())
            .ok_or_else(|| CoordinatorError::not_found("TaskService", id))
    }

    async fn list_task_services(&self) -> CoordinatorResult<Vec<TaskService>> {
        Ok(self.task_services.iter().map(|r| r.clone()).collect())
    }

    async fn delete_task_service(&self, id: &str) -> CoordinatorResult<Option<TaskService>> {
        Ok(self.task_services.remove(id).map(|(_, v)| v))
    }

    async fn update_task_service(
        &self,
        id: &str,
        f: Box<dyn FnOnce(&mut TaskService) + Send>,
    ) -> CoordinatorResult<TaskService> {
        let mut entry = self
            .task_services
            .get_mut(id)
            .ok_or_else(|| CoordinatorError::not_found("TaskService", id))?;
        f(&mut entry);
        Ok(entry.clone())
    }

    async fn put_release(&self, release: Release) -> CoordinatorResult<()> {
        self.releases.insert(release.kf_id.clone(), release);
        Ok(())
    }

    async fn get_release(&self, id: &str) -> CoordinatorResult<Release> {
        self.releases
            .get(id)
            .map(|r| r.clone())
            .ok_or_else(|| CoordinatorError::not_found("Release", id))
    }

    async fn list_releases(&self) -> CoordinatorResult<Vec<Release>> {
        Ok(self.releases.iter().map(|r| r.clone()).collect())
    }

    async fn update_release(
        &self,
        id: &str,
        f: Box<dyn FnOnce(&mut Release) -> CoordinatorResult<()> + Send>,
    ) -> CoordinatorResult<Release> {
        let mut entry = self
            .releases
            .get_mut(id)
            .ok_or_else(|| CoordinatorError::not_found("Release", id))?;
        f(&mut entry)?;
        Ok(entry.clone())
    }

    async fn put_task(&self, task: Task) -> CoordinatorResult<()> {
        self.tasks.insert(task.kf_id.clone(), task);
        Ok(())
    }

    async fn get_task(&self, id: &str) -> CoordinatorResult<Task> {
        self.tasks
            .get(id)
            .map(|r| r.clone())
            .ok_or_else(|| CoordinatorError::not_found("Task", id))
    }

    async fn list_tasks_for_release(&self, release_id: &str) -> CoordinatorResult<Vec<Task>> {
        Ok(self
            .tasks
            .iter()
            .filter(|r| r.release_id == release_id)
            .map(|r| r.clone())
            .collect())
    }

    async fn update_task(
        &self,
        id: &str,
        f: Box<dyn FnOnce(&mut Task) -> CoordinatorResult<()> + Send>,
    ) -> CoordinatorResult<Task> {
        let mut entry = self
            .tasks
            .get_mut(id)
            .ok_or_else(|| CoordinatorError::not_found("Task", id))?;
        f(&mut entry)?;
        Ok(entry.clone())
    }

    async fn append_event(&self, event: Event) -> CoordinatorResult<()> {
        self.events.insert(event.kf_id.clone(), event);
        Ok(())
    }

    async fn list_events_for_release(&self, release_id: &str) -> CoordinatorResult<Vec<Event>> {
        let mut events: Vec<_> = self
            .events
            .iter()
            .filter(|e| e.release_id.as_deref() == Some(release_id))
            .map(|e| e.clone())
            .collect();
        events.sort_by_key(|e| e.created_at);
        Ok(events)
    }

    async fn list_events_for_task(&self, task_id: &str) -> CoordinatorResult<Vec<Event>> {
        let mut events: Vec<_> = self
            .events
            .iter()
            .filter(|e| e.task_id.as_deref() == Some(task_id))
            .map(|e| e.clone())
            .collect();
        events.sort_by_key(|e| e.created_at);
        Ok(events)
    }

    async fn last_event_for_task(&self, task_id: &str) -> CoordinatorResult<Option<Event>> {
        Ok(self
            .events
            .iter()
            .filter(|e| e.task_id.as_deref() == Some(task_id))
            .map(|e| e.clone())
            .max_by_key(|e| e.created_at))
    }

    async fn put_release_note(&self, note: ReleaseNote) -> CoordinatorResult<()> {
        self.release_notes.insert(note.kf_id.clone(), note);
        Ok(())
    }

    async fn list_release_notes(&self, release_id: &str) -> CoordinatorResult<Vec<ReleaseNote>> {
        let mut notes: Vec<_> = self
            .release_notes
            .iter()
            .filter(|n| n.release_id == release_id)
            .map(|n| n.clone())
            .collect();
        notes.sort_by_key(|n| n.created_at);
        Ok(notes)
    }
}
