//! # Identifier Scheme
//!
//! Short opaque ids of the form `<PREFIX>_[0-9A-HJ-NP-TV-Z]{8}`, 11 characters
//! total (spec §6). Generation lives here because the engine's own in-memory
//! store and test fixtures need to mint ids; the REST surface that would
//! normally own id assignment is out of scope.

use std::fmt;

/// Crockford-like base32 alphabet: digits plus uppercase letters minus
/// I, L, O, U (easily confused with 1, 1, 0, V).
const ALPHABET: &[u8] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Mint a short id with the given two-letter prefix, e.g. `RE_4F8K2QWX`.
pub fn generate(prefix: &str) -> String {
    let mut suffix = String::with_capacity(8);
    for _ in 0..8 {
        let idx = fastrand::usize(..ALPHABET.len());
        suffix.push(ALPHABET[idx] as char);
    }
    format!("{prefix}_{suffix}")
}

/// A validated study identifier (`SD_[0-9A-Z]{8}`), opaque to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StudyId(String);

#[derive(Debug, thiserror::Error)]
#[error("{0} is not a valid study kf_id")]
pub struct InvalidStudyId(pub String);

impl StudyId {
    pub fn parse(raw: impl Into<String>) -> Result<Self, InvalidStudyId> {
        let raw = raw.into();
        let valid = raw
            .strip_prefix("SD_")
            .is_some_and(|suffix| {
                suffix.len() == 8
                    && suffix
                        .bytes()
                        .all(|b| b.is_ascii_digit() || b.is_ascii_uppercase())
            });
        if valid {
            Ok(Self(raw))
        } else {
            Err(InvalidStudyId(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StudyId {
    type Error = InvalidStudyId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<StudyId> for String {
    fn from(value: StudyId) -> Self {
        value.0
    }
}

impl fmt::Display for StudyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate a non-empty list of raw study ids, collecting every failure the
/// way the REST validation layer would (spec §8 scenario 2: "error
/// enumerates `SD_000 is not a valid study kf_id`").
pub fn validate_studies(raw: &[String]) -> Result<Vec<StudyId>, String> {
    if raw.is_empty() {
        return Err("studies: at least 1 study is required".to_string());
    }
    let mut errors = Vec::new();
    let mut parsed = Vec::with_capacity(raw.len());
    for id in raw {
        match StudyId::parse(id.clone()) {
            Ok(sid) => parsed.push(sid),
            Err(e) => errors.push(e.to_string()),
        }
    }
    if errors.is_empty() {
        Ok(parsed)
    } else {
        Err(errors.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_id_has_expected_shape() {
        let id = generate("RE");
        assert_eq!(id.len(), 11);
        assert!(id.starts_with("RE_"));
    }

    #[test]
    fn generated_ids_are_unique_enough() {
        let a = generate("TA");
        let b = generate("TA");
        assert_ne!(a, b);
    }

    #[test]
    fn valid_study_id_parses() {
        assert!(StudyId::parse("SD_00000001").is_ok());
    }

    #[test]
    fn short_study_id_is_rejected() {
        let err = StudyId::parse("SD_000").unwrap_err();
        assert_eq!(err.to_string(), "SD_000 is not a valid study kf_id");
    }

    #[test]
    fn lowercase_study_id_is_rejected() {
        assert!(StudyId::parse("sd_00000000").is_err());
    }

    #[test]
    fn empty_study_list_is_rejected() {
        let err = validate_studies(&[]).unwrap_err();
        assert!(err.contains("at least 1"));
    }

    #[test]
    fn mixed_valid_and_invalid_collects_all_errors() {
        let raw = vec!["SD_000".to_string(), "SD_00000000".to_string()];
        let err = validate_studies(&raw).unwrap_err();
        assert!(err.contains("SD_000 is not a valid study kf_id"));
    }

    #[test]
    fn all_valid_studies_parse_in_order() {
        let raw = vec!["SD_00000001".to_string(), "SD_00000002".to_string()];
        let parsed = validate_studies(&raw).unwrap();
        assert_eq!(parsed[0].as_str(), "SD_00000001");
        assert_eq!(parsed[1].as_str(), "SD_00000002");
    }
}
