//! Release note entity — a passthrough record surfaced by `GET /release-notes`
//! (spec §6). No orchestration behavior touches it; it carries no state
//! machine of its own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ids;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseNote {
    pub kf_id: String,
    pub uuid: Uuid,
    pub release_id: String,
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl ReleaseNote {
    pub fn new(release_id: impl Into<String>, author: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kf_id: ids::generate("RN"),
            uuid: Uuid::new_v4(),
            release_id: release_id.into(),
            author: author.into(),
            body: body.into(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_note_carries_its_release_reference() {
        let note = ReleaseNote::new("RE_AAAAAAAA", "admin", "staged for review");
        assert_eq!(note.release_id, "RE_AAAAAAAA");
        assert!(note.kf_id.starts_with("RN_"));
    }
}
