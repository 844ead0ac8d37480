//! Release entity (spec §3, §4.4).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ids::{self, StudyId};
use crate::state_machine::states::ReleaseState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
    pub kf_id: String,
    pub uuid: Uuid,
    pub name: String,
    pub description: String,
    pub author: String,
    pub tags: Vec<String>,
    pub studies: Vec<StudyId>,
    pub state: ReleaseState,
    pub created_at: DateTime<Utc>,
}

impl Release {
    /// `studies` must be non-empty (spec §3 invariant, §8 scenario 2).
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        author: impl Into<String>,
        tags: Vec<String>,
        studies: Vec<StudyId>,
    ) -> Result<Self, String> {
        if studies.is_empty() {
            return Err("studies: at least 1 study is required".to_string());
        }
        Ok(Self {
            kf_id: ids::generate("RE"),
            uuid: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            author: author.into(),
            tags,
            studies,
            state: ReleaseState::Waiting,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_release_starts_waiting() {
        let r = Release::new(
            "R",
            "",
            "admin",
            vec![],
            vec![StudyId::parse("SD_00000001").unwrap()],
        )
        .unwrap();
        assert_eq!(r.state, ReleaseState::Waiting);
        assert!(r.kf_id.starts_with("RE_"));
    }

    #[test]
    fn empty_studies_is_rejected() {
        let err = Release::new("R", "", "admin", vec![], vec![]).unwrap_err();
        assert!(err.contains("at least 1"));
    }

    #[test]
    fn tags_are_stored_in_order() {
        let r = Release::new(
            "R",
            "",
            "admin",
            vec!["Needs Review".to_string(), "Data Fix".to_string()],
            vec![StudyId::parse("SD_00000001").unwrap()],
        )
        .unwrap();
        assert_eq!(r.tags, vec!["Needs Review".to_string(), "Data Fix".to_string()]);
    }
}
