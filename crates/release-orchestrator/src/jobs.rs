//! # Job Dispatcher (G) — contract only
//!
//! The real background-queue runtime (PGMQ/RabbitMQ in the teacher's stack,
//! via `tasker_shared::messaging`) is an external collaborator (spec §1,
//! §4.7). What lives here is the *contract*: a tagged job variant, an
//! `enqueue` trait, and one in-process `tokio::mpsc` worker pool that
//! satisfies it — enough to drive the engine end-to-end in tests and in the
//! demo binary without standing up real infrastructure.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// The five job kinds named in spec §4.7.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    HealthCheck { service_id: String },
    InitRelease { release_id: String },
    PublishRelease { release_id: String },
    CancelRelease { release_id: String },
    StatusPoll { task_id: String },
}

impl Job {
    pub fn name(&self) -> &'static str {
        match self {
            Self::HealthCheck { .. } => "health_check",
            Self::InitRelease { .. } => "init_release",
            Self::PublishRelease { .. } => "publish_release",
            Self::CancelRelease { .. } => "cancel_release",
            Self::StatusPoll { .. } => "status_poll",
        }
    }
}

/// Enqueue-only interface to a background worker pool (spec §4.7). Jobs are
/// at-least-once; handlers must treat a disallowed transition as a no-op
/// rather than an error (spec §4.7, §9).
#[async_trait]
pub trait JobDispatcher: Send + Sync {
    async fn enqueue(&self, job: Job);
}

/// Anything that can execute a [`Job`]. The in-process dispatcher below
/// drives one of these per worker; `release_orchestrator::Engine` is the
/// production implementation.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, job: Job);
}

/// `tokio::mpsc`-backed worker pool standing in for the real queue runtime.
/// Jobs are handed to a fixed number of workers pulling from one channel —
/// the closest in-process analog to the teacher's `tasker-pgmq` consumers.
pub struct InProcessDispatcher {
    sender: mpsc::UnboundedSender<Job>,
}

/// The receiving half of an [`InProcessDispatcher`]'s channel, handed to
/// [`InProcessDispatcher::spawn_workers`] once a [`JobHandler`] exists.
/// Kept separate from construction so a dispatcher can be built — and given
/// to things that need to enqueue — before the handler it will eventually
/// feed is assembled (the handler typically needs `Arc<dyn JobDispatcher>`
/// itself, e.g. the Release Engine enqueuing follow-up jobs).
pub struct JobQueue {
    receiver: mpsc::UnboundedReceiver<Job>,
}

impl InProcessDispatcher {
    /// Create a dispatcher and its matching queue with no workers attached
    /// yet.
    pub fn new() -> (Self, JobQueue) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, JobQueue { receiver })
    }

    /// Spawn `worker_count` tasks pulling from `queue`, each delegating to
    /// `handler`. Returns the join handles so callers can await graceful
    /// shutdown.
    pub fn spawn_workers(
        queue: JobQueue,
        handler: Arc<dyn JobHandler>,
        worker_count: usize,
    ) -> Vec<tokio::task::JoinHandle<()>> {
        let receiver = Arc::new(tokio::sync::Mutex::new(queue.receiver));

        (0..worker_count.max(1))
            .map(|worker_id| {
                let receiver = Arc::clone(&receiver);
                let handler = Arc::clone(&handler);
                tokio::spawn(async move {
                    loop {
                        let job = {
                            let mut rx = receiver.lock().await;
                            rx.recv().await
                        };
                        match job {
                            Some(job) => {
                                info!(worker_id, job = job.name(), "dispatching job");
                                handler.handle(job).await;
                            }
                            None => {
                                warn!(worker_id, "job queue closed, worker exiting");
                                break;
                            }
                        }
                    }
                })
            })
            .collect()
    }
}

#[async_trait]
impl JobDispatcher for InProcessDispatcher {
    async fn enqueue(&self, job: Job) {
        if self.sender.send(job).is_err() {
            error!("job dispatcher channel closed, dropping job");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHandler {
        count: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl JobHandler for CountingHandler {
        async fn handle(&self, _job: Job) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn enqueued_jobs_reach_a_worker() {
        let count = Arc::new(AtomicUsize::new(0));
        let handler = Arc::new(CountingHandler {
            count: Arc::clone(&count),
        });
        let (dispatcher, queue) = InProcessDispatcher::new();
        let _handles = InProcessDispatcher::spawn_workers(queue, handler, 2);

        dispatcher
            .enqueue(Job::HealthCheck {
                service_id: "TS_AAAAAAAA".to_string(),
            })
            .await;
        dispatcher
            .enqueue(Job::StatusPoll {
                task_id: "TA_AAAAAAAA".to_string(),
            })
            .await;

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn job_name_matches_spec_job_kinds() {
        assert_eq!(
            Job::HealthCheck {
                service_id: "x".into()
            }
            .name(),
            "health_check"
        );
        assert_eq!(
            Job::InitRelease {
                release_id: "x".into()
            }
            .name(),
            "init_release"
        );
        assert_eq!(
            Job::CancelRelease {
                release_id: "x".into()
            }
            .name(),
            "cancel_release"
        );
    }
}
