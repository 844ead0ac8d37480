//! # Release Coordinator Server
//!
//! Thin wrapper binary that runs the release orchestration engine's
//! background loops: the health sweep cadence and the status-poll cadence
//! (spec §4.2, §4.5). The REST surface that would enqueue jobs in response
//! to API calls is an external collaborator (spec §1, §6) — this binary
//! only demonstrates the engine driving itself.

use std::sync::Arc;
use std::time::Duration;

use release_orchestrator::Coordinator;
use release_shared::config::CoordinatorConfig;
use release_shared::emitter::NoopEmitter;
use release_shared::remote::http::HttpTaskServiceClient;
use release_shared::store::memory::InMemoryStore;
use release_shared::store::Store;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    info!("Starting Release Coordinator...");
    info!("   Version: {}", env!("CARGO_PKG_VERSION"));

    let config = CoordinatorConfig::from_env()?;
    let store = Arc::new(InMemoryStore::new());
    let emitter = Arc::new(NoopEmitter);
    let client = Arc::new(HttpTaskServiceClient::new(Duration::from_millis(
        config.remote_http_timeout_ms,
    )));

    let (dispatcher, queue) = release_orchestrator::InProcessDispatcher::new();
    let dispatcher = Arc::new(dispatcher);

    let coordinator = Arc::new(Coordinator::new(
        store.clone(),
        emitter,
        client,
        dispatcher.clone(),
        config.clone(),
    ));
    let worker_handles = release_orchestrator::InProcessDispatcher::spawn_workers(
        queue,
        coordinator.clone(),
        4,
    );

    let health_sweep = {
        let coordinator = coordinator.clone();
        let interval_secs = config.health_sweep_interval_secs;
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(Duration::from_secs(interval_secs));
            loop {
                tick.tick().await;
                if let Err(e) = coordinator.registry.trigger_health_sweep().await {
                    error!(error = %e, "health sweep failed to enqueue");
                }
            }
        })
    };

    let status_poll = {
        let dispatcher = dispatcher.clone();
        let interval_secs = config.status_poll_interval_secs;
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(Duration::from_secs(interval_secs));
            loop {
                tick.tick().await;
                let releases = match store.list_releases().await {
                    Ok(releases) => releases,
                    Err(e) => {
                        error!(error = %e, "status poll tick failed to list releases");
                        continue;
                    }
                };
                for release in releases.iter().filter(|r| !r.state.is_terminal()) {
                    let Ok(tasks) = store.list_tasks_for_release(&release.kf_id).await else {
                        continue;
                    };
                    for task in tasks.into_iter().filter(|t| !t.state.is_terminal_for_poll()) {
                        dispatcher
                            .enqueue(release_orchestrator::Job::StatusPoll {
                                task_id: task.kf_id,
                            })
                            .await;
                    }
                }
            }
        })
    };

    info!(
        health_sweep_interval_secs = config.health_sweep_interval_secs,
        status_poll_interval_secs = config.status_poll_interval_secs,
        "Release Coordinator started"
    );
    info!("Press Ctrl+C to shutdown gracefully");

    shutdown_signal().await;
    info!("Shutdown signal received, stopping background loops...");

    health_sweep.abort();
    status_poll.abort();
    for handle in worker_handles {
        handle.abort();
    }

    info!("Release Coordinator shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
