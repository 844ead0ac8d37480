//! Wires components A-E together behind the [`JobHandler`] contract so a
//! single [`InProcessDispatcher`](crate::jobs::InProcessDispatcher) can drive
//! every job kind named in spec §4.7.

use std::sync::Arc;

use async_trait::async_trait;
use release_shared::config::CoordinatorConfig;
use release_shared::emitter::EventEmitter;
use release_shared::remote::TaskServiceClient;
use release_shared::store::Store;
use tracing::error;

use crate::health::HealthMonitor;
use crate::jobs::{Job, JobDispatcher, JobHandler};
use crate::poller::StatusPoller;
use crate::registry::TaskServiceRegistry;
use crate::release_engine::ReleaseEngine;

pub struct Coordinator {
    pub registry: TaskServiceRegistry,
    pub release_engine: ReleaseEngine,
    health_monitor: HealthMonitor,
    status_poller: StatusPoller,
}

impl Coordinator {
    pub fn new(
        store: Arc<dyn Store>,
        emitter: Arc<dyn EventEmitter>,
        client: Arc<dyn TaskServiceClient>,
        dispatcher: Arc<dyn JobDispatcher>,
        config: CoordinatorConfig,
    ) -> Self {
        let registry = TaskServiceRegistry::new(store.clone(), dispatcher.clone());
        let release_engine = ReleaseEngine::new(
            store.clone(),
            emitter.clone(),
            client.clone(),
            dispatcher.clone(),
        );
        let health_monitor = HealthMonitor::new(store.clone(), client.clone(), config.clone());
        let status_poller =
            StatusPoller::new(store, emitter, client, dispatcher, config);

        Self {
            registry,
            release_engine,
            health_monitor,
            status_poller,
        }
    }
}

#[async_trait]
impl JobHandler for Coordinator {
    async fn handle(&self, job: Job) {
        let result = match &job {
            Job::HealthCheck { service_id } => self.health_monitor.check_one(service_id).await,
            Job::InitRelease { release_id } => self.release_engine.init_release(release_id).await,
            Job::PublishRelease { release_id } => {
                self.release_engine.publish_release(release_id).await
            }
            Job::CancelRelease { release_id } => {
                self.release_engine.cancel_release(release_id).await
            }
            Job::StatusPoll { task_id } => {
                self.status_poller
                    .poll_one(task_id, &self.release_engine)
                    .await
            }
        };

        if let Err(e) = result {
            error!(job = job.name(), error = %e, "job handler returned an error");
        }
    }
}
