//! # Coordinator Configuration
//!
//! Configuration for the release orchestration engine: task inactivity
//! timeout, background cadences, remote HTTP timeout, and the optional
//! external event bus, per spec §6's enumerated environment surface.

use serde::{Deserialize, Serialize};

/// Engine-wide configuration, loaded from environment variables with
/// `COORDINATOR_` prefix (see [`CoordinatorConfig::from_env`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Seconds of task inactivity (since its last Event) before the release
    /// is force-cancelled (spec §4.5 step 3, §5).
    #[serde(default = "default_task_timeout")]
    pub task_timeout_secs: u64,

    /// Cadence at which the Health Monitor sweeps registered task services.
    #[serde(default = "default_health_sweep_interval")]
    pub health_sweep_interval_secs: u64,

    /// Cadence at which the Status Poller ticks over in-flight tasks.
    #[serde(default = "default_status_poll_interval")]
    pub status_poll_interval_secs: u64,

    /// Fixed per-call timeout to a task service's `/status` and `/tasks`
    /// endpoints (spec §4.2, §4.5: 15s).
    #[serde(default = "default_remote_timeout_ms")]
    pub remote_http_timeout_ms: u64,

    /// Consecutive-failure threshold above which a task service is `down`
    /// (spec §3: `consecutive_failures > 3`).
    #[serde(default = "default_down_threshold")]
    pub health_down_threshold: u32,

    /// External bus topic; emission is skipped entirely when unset
    /// (spec §4.6, §6).
    #[serde(default)]
    pub bus_topic: Option<String>,
}

fn default_task_timeout() -> u64 {
    900
}

fn default_health_sweep_interval() -> u64 {
    60
}

fn default_status_poll_interval() -> u64 {
    10
}

fn default_remote_timeout_ms() -> u64 {
    15_000
}

fn default_down_threshold() -> u32 {
    3
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            task_timeout_secs: default_task_timeout(),
            health_sweep_interval_secs: default_health_sweep_interval(),
            status_poll_interval_secs: default_status_poll_interval(),
            remote_http_timeout_ms: default_remote_timeout_ms(),
            health_down_threshold: default_down_threshold(),
            bus_topic: None,
        }
    }
}

impl CoordinatorConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset. Mirrors the teacher's pattern of layering
    /// `config::Environment` over struct defaults rather than hand-rolling
    /// `env::var` parsing everywhere.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let _ = dotenvy::dotenv();
        config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?)
            .add_source(
                config::Environment::with_prefix("COORDINATOR")
                    .try_parsing(true)
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }

    /// Whether event emission to the external bus is configured at all.
    pub fn bus_enabled(&self) -> bool {
        self.bus_topic.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = CoordinatorConfig::default();
        assert_eq!(cfg.remote_http_timeout_ms, 15_000);
        assert_eq!(cfg.health_down_threshold, 3);
        assert!(!cfg.bus_enabled());
    }

    #[test]
    fn from_env_falls_back_to_defaults_when_unset() {
        std::env::remove_var("COORDINATOR__TASK_TIMEOUT_SECS");
        let cfg = CoordinatorConfig::from_env().expect("config loads");
        assert_eq!(cfg.task_timeout_secs, 900);
    }
}
