//! Atomic transition primitive shared by both state machines.

use crate::emitter::EventEmitter;
use crate::error::{CoordinatorError, CoordinatorResult};
use crate::models::{Event, EventType, Release, Task};
use crate::store::Store;

use super::events::{ReleaseEvent, TaskEvent};

/// Drives both the Release and Task state machines against a [`Store`],
/// journaling every transition to an [`EventEmitter`]. Holding both seams
/// behind one small struct keeps callers (component C/D in the
/// orchestrator) from having to thread store and emitter through every call
/// site separately.
pub struct StateMachine<'a> {
    store: &'a dyn Store,
    emitter: &'a dyn EventEmitter,
}

impl<'a> StateMachine<'a> {
    pub fn new(store: &'a dyn Store, emitter: &'a dyn EventEmitter) -> Self {
        Self { store, emitter }
    }

    /// Validate `event` is legal from the release's current state, persist
    /// the target state, and append a journal Event — all as one logical
    /// step (spec §9). Emission to the bus happens after the commit and
    /// never rolls it back (spec §4.6).
    pub async fn transition_release(
        &self,
        release_id: &str,
        event: ReleaseEvent,
        message: impl Into<String>,
    ) -> CoordinatorResult<Release> {
        let sources = event.allowed_sources();
        let updated = self
            .store
            .update_release(
                release_id,
                Box::new(move |r| {
                    if !sources.contains(&r.state) {
                        return Err(CoordinatorError::invalid_transition(
                            "Release",
                            r.kf_id.clone(),
                            event.name(),
                            r.state.as_str(),
                        ));
                    }
                    r.state = event.target();
                    Ok(())
                }),
            )
            .await?;

        self.journal_release(release_id, event, message).await?;
        Ok(updated)
    }

    /// Same as [`Self::transition_release`] but for tasks. `Fail` and
    /// `Cancel` are legal from any non-terminal task state (spec §4.3);
    /// every other event has a fixed source list.
    pub async fn transition_task(
        &self,
        task_id: &str,
        event: TaskEvent,
        message: impl Into<String>,
    ) -> CoordinatorResult<Task> {
        let sources = event.allowed_sources();
        let updated = self
            .store
            .update_task(
                task_id,
                Box::new(move |t| {
                    let legal = match sources {
                        Some(sources) => sources.contains(&t.state),
                        None => !t.state.is_terminal(),
                    };
                    if !legal {
                        return Err(CoordinatorError::invalid_transition(
                            "Task",
                            t.kf_id.clone(),
                            event.name(),
                            t.state.as_str(),
                        ));
                    }
                    t.state = event.target();
                    Ok(())
                }),
            )
            .await?;

        self.journal_task(
            task_id,
            &updated.release_id,
            &updated.task_service_id,
            event,
            message,
        )
        .await?;
        Ok(updated)
    }

    async fn journal_release(
        &self,
        release_id: &str,
        event: ReleaseEvent,
        message: impl Into<String>,
    ) -> CoordinatorResult<()> {
        let event_type = if event.is_error_event() {
            EventType::Error
        } else {
            EventType::Info
        };
        let journaled = Event::new(event_type, message).with_release(release_id);
        self.store.append_event(journaled.clone()).await?;
        self.emitter.emit(&journaled).await;
        Ok(())
    }

    async fn journal_task(
        &self,
        task_id: &str,
        release_id: &str,
        task_service_id: &str,
        event: TaskEvent,
        message: impl Into<String>,
    ) -> CoordinatorResult<()> {
        let event_type = if event.is_error_event() {
            EventType::Error
        } else {
            EventType::Info
        };
        let journaled = Event::new(event_type, message)
            .with_task(task_id)
            .with_release(release_id)
            .with_task_service(task_service_id);
        self.store.append_event(journaled.clone()).await?;
        self.emitter.emit(&journaled).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::ChannelEmitter;
    use crate::ids::StudyId;
    use crate::store::memory::InMemoryStore;

    async fn seeded_release(store: &InMemoryStore) -> Release {
        let release = Release::new(
            "R",
            "",
            "admin",
            vec![],
            vec![StudyId::parse("SD_00000001").unwrap()],
        )
        .unwrap();
        store.put_release(release.clone()).await.unwrap();
        release
    }

    #[tokio::test]
    async fn legal_transition_persists_and_journals() {
        let store = InMemoryStore::new();
        let release = seeded_release(&store).await;
        let (emitter, mut rx) = ChannelEmitter::new();
        let machine = StateMachine::new(&store, &emitter);

        let updated = machine
            .transition_release(&release.kf_id, ReleaseEvent::Initialize, "starting init")
            .await
            .unwrap();
        assert_eq!(updated.state, ReleaseState::Initializing);

        let journaled = rx.recv().await.unwrap();
        assert_eq!(journaled.release_id.as_deref(), Some(release.kf_id.as_str()));
        assert_eq!(journaled.event_type, EventType::Info);

        let events = store.list_events_for_release(&release.kf_id).await.unwrap();
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn illegal_transition_is_rejected_and_not_journaled() {
        let store = InMemoryStore::new();
        let release = seeded_release(&store).await;
        let emitter = crate::emitter::NoopEmitter;
        let machine = StateMachine::new(&store, &emitter);

        let err = machine
            .transition_release(&release.kf_id, ReleaseEvent::Publish, "too soon")
            .await
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::InvalidTransition { .. }));

        let events = store.list_events_for_release(&release.kf_id).await.unwrap();
        assert!(events.is_empty());

        let reloaded = store.get_release(&release.kf_id).await.unwrap();
        assert_eq!(reloaded.state, ReleaseState::Waiting);
    }

    #[tokio::test]
    async fn fail_event_journals_as_error_type() {
        let store = InMemoryStore::new();
        let release = seeded_release(&store).await;
        let emitter = crate::emitter::NoopEmitter;
        let machine = StateMachine::new(&store, &emitter);

        machine
            .transition_release(&release.kf_id, ReleaseEvent::Fail, "remote unreachable")
            .await
            .unwrap();

        let events = store.list_events_for_release(&release.kf_id).await.unwrap();
        assert_eq!(events[0].event_type, EventType::Error);
    }

    #[tokio::test]
    async fn task_fail_is_legal_from_any_non_terminal_state() {
        let store = InMemoryStore::new();
        let task = Task::new("RE_AAAAAAAA", "TS_BBBBBBBB");
        store.put_task(task.clone()).await.unwrap();
        let emitter = crate::emitter::NoopEmitter;
        let machine = StateMachine::new(&store, &emitter);

        let updated = machine
            .transition_task(&task.kf_id, TaskEvent::Fail, "service rejected command")
            .await
            .unwrap();
        assert_eq!(updated.state, TaskState::Failed);
    }

    #[tokio::test]
    async fn task_transition_event_carries_release_and_task_service_ids() {
        let store = InMemoryStore::new();
        let release = seeded_release(&store).await;
        let task = Task::new(release.kf_id.clone(), "TS_BBBBBBBB");
        store.put_task(task.clone()).await.unwrap();
        let emitter = crate::emitter::NoopEmitter;
        let machine = StateMachine::new(&store, &emitter);

        machine
            .transition_task(&task.kf_id, TaskEvent::Initialize, "task initializing")
            .await
            .unwrap();

        let events = store.list_events_for_release(&release.kf_id).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].task_id.as_deref(), Some(task.kf_id.as_str()));
        assert_eq!(
            events[0].task_service_id.as_deref(),
            Some("TS_BBBBBBBB")
        );
    }

    #[tokio::test]
    async fn task_fail_rejected_once_already_terminal() {
        let store = InMemoryStore::new();
        let task = Task::new("RE_AAAAAAAA", "TS_BBBBBBBB");
        store.put_task(task.clone()).await.unwrap();
        let emitter = crate::emitter::NoopEmitter;
        let machine = StateMachine::new(&store, &emitter);

        machine
            .transition_task(&task.kf_id, TaskEvent::Fail, "first failure")
            .await
            .unwrap();
        let err = machine
            .transition_task(&task.kf_id, TaskEvent::Fail, "second failure")
            .await
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::InvalidTransition { .. }));
    }
}
