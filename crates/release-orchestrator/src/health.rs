//! # Health Monitor (B) — spec §4.2
//!
//! One job per service per sweep. Increments/resets are last-write-wins;
//! concurrent sweeps on the same service are permitted (spec §4.2 Ordering).

use std::sync::Arc;

use release_shared::config::CoordinatorConfig;
use release_shared::error::CoordinatorResult;
use release_shared::remote::TaskServiceClient;
use release_shared::store::Store;
use tracing::{info, warn};

pub struct HealthMonitor {
    store: Arc<dyn Store>,
    client: Arc<dyn TaskServiceClient>,
    config: CoordinatorConfig,
}

impl HealthMonitor {
    pub fn new(
        store: Arc<dyn Store>,
        client: Arc<dyn TaskServiceClient>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            store,
            client,
            config,
        }
    }

    /// Handler for the `health_check(service_id)` job.
    pub async fn check_one(&self, service_id: &str) -> CoordinatorResult<()> {
        let service = self.store.get_task_service(service_id).await?;

        match self.client.check_status(&service.url).await {
            Ok(()) => {
                if service.consecutive_failures > 0 {
                    self.store
                        .update_task_service(
                            service_id,
                            Box::new(|s| s.record_success()),
                        )
                        .await?;
                    info!(service_id, "health check ok, failure counter reset");
                }
            }
            Err(err) => {
                let updated = self
                    .store
                    .update_task_service(service_id, Box::new(|s| s.record_failure()))
                    .await?;
                warn!(
                    service_id,
                    consecutive_failures = updated.consecutive_failures,
                    error = %err,
                    "health check failed"
                );
                if updated.health_status(self.config.health_down_threshold)
                    == release_shared::models::HealthStatus::Down
                {
                    warn!(service_id, "task service is now down");
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use release_shared::models::HealthStatus;
    use release_shared::remote::fake::{CannedStatus, FakeTaskServiceClient};
    use release_shared::store::memory::InMemoryStore;

    #[tokio::test]
    async fn successful_probe_resets_failure_counter() {
        let store = Arc::new(InMemoryStore::new());
        let client = Arc::new(FakeTaskServiceClient::new());
        let monitor = HealthMonitor::new(store.clone(), client.clone(), CoordinatorConfig::default());

        let svc = release_shared::models::TaskService::register("svc", "http://ts.com", "admin");
        let id = svc.kf_id.clone();
        store.put_task_service(svc).await.unwrap();

        client.queue_status("http://ts.com", CannedStatus::Failure);
        monitor.check_one(&id).await.unwrap();
        let after_failure = store.get_task_service(&id).await.unwrap();
        assert_eq!(after_failure.consecutive_failures, 1);

        monitor.check_one(&id).await.unwrap();
        let after_success = store.get_task_service(&id).await.unwrap();
        assert_eq!(after_success.consecutive_failures, 0);
        assert_eq!(after_success.health_status(3), HealthStatus::Ok);
    }

    #[tokio::test]
    async fn four_consecutive_failures_makes_service_down() {
        let store = Arc::new(InMemoryStore::new());
        let client = Arc::new(FakeTaskServiceClient::new());
        let monitor = HealthMonitor::new(store.clone(), client.clone(), CoordinatorConfig::default());

        let svc = release_shared::models::TaskService::register("svc", "http://ts.com", "admin");
        let id = svc.kf_id.clone();
        store.put_task_service(svc).await.unwrap();

        for _ in 0..4 {
            client.queue_status("http://ts.com", CannedStatus::Failure);
            monitor.check_one(&id).await.unwrap();
        }

        let reloaded = store.get_task_service(&id).await.unwrap();
        assert_eq!(reloaded.health_status(3), HealthStatus::Down);
    }
}
