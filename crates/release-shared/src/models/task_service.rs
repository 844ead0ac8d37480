//! Task Service Registry entity (component A, spec §3, §4.1).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ids;

/// Derived health status (spec §3): `ok` while `consecutive_failures <= 3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Down,
}

/// A registered remote task service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskService {
    pub kf_id: String,
    pub uuid: Uuid,
    pub name: String,
    pub description: String,
    pub url: String,
    pub author: String,
    pub enabled: bool,
    pub consecutive_failures: u32,
    pub created_at: DateTime<Utc>,
}

impl TaskService {
    /// Register a new service. Does not probe synchronously (spec §4.1).
    pub fn register(name: impl Into<String>, url: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            kf_id: ids::generate("TS"),
            uuid: Uuid::new_v4(),
            name: name.into(),
            description: String::new(),
            url: url.into(),
            author: author.into(),
            enabled: true,
            consecutive_failures: 0,
            created_at: Utc::now(),
        }
    }

    /// `health_status = ok ⟺ consecutive_failures ≤ threshold` (spec §3, §8).
    pub fn health_status(&self, down_threshold: u32) -> HealthStatus {
        if self.consecutive_failures <= down_threshold {
            HealthStatus::Ok
        } else {
            HealthStatus::Down
        }
    }

    /// Record a successful `/status` probe: resets the failure counter
    /// (spec §4.2 step 2).
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    /// Record a failed `/status` probe: increments the failure counter
    /// (spec §4.2 step 3).
    pub fn record_failure(&mut self) {
        self.consecutive_failures += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_starts_enabled_with_zero_failures() {
        let svc = TaskService::register("svc", "http://ts.com", "admin");
        assert!(svc.enabled);
        assert_eq!(svc.consecutive_failures, 0);
        assert_eq!(svc.health_status(3), HealthStatus::Ok);
    }

    #[test]
    fn four_failures_makes_it_down() {
        let mut svc = TaskService::register("svc", "http://ts.com", "admin");
        for _ in 0..4 {
            svc.record_failure();
        }
        assert_eq!(svc.health_status(3), HealthStatus::Down);
    }

    #[test]
    fn three_failures_is_still_ok() {
        let mut svc = TaskService::register("svc", "http://ts.com", "admin");
        for _ in 0..3 {
            svc.record_failure();
        }
        assert_eq!(svc.health_status(3), HealthStatus::Ok);
    }

    #[test]
    fn success_resets_counter() {
        let mut svc = TaskService::register("svc", "http://ts.com", "admin");
        svc.record_failure();
        svc.record_failure();
        svc.record_success();
        assert_eq!(svc.consecutive_failures, 0);
        assert_eq!(svc.health_status(3), HealthStatus::Ok);
    }
}
