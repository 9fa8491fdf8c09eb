//! Domain identifier types with proper encapsulation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Patient identifier - the subscription key selecting a live stream.
///
/// The inner value is private so every identifier in the system has passed
/// the positivity check in [`PatientId::try_new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct PatientId(i64);

impl PatientId {
    /// Create a `PatientId`, rejecting zero and negative values.
    pub const fn try_new(id: i64) -> Result<Self, DomainError> {
        if id <= 0 {
            return Err(DomainError::NonPositivePatientId { id });
        }
        Ok(Self(id))
    }

    /// Get the raw identifier.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for PatientId {
    type Error = DomainError;

    fn try_from(id: i64) -> Result<Self, Self::Error> {
        Self::try_new(id)
    }
}

impl From<PatientId> for i64 {
    fn from(id: PatientId) -> Self {
        id.0
    }
}

impl FromStr for PatientId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: i64 = s
            .trim()
            .parse()
            .map_err(|e| format!("invalid patient id '{s}': {e}"))?;
        Self::try_new(raw).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_ids() {
        assert!(PatientId::try_new(0).is_err());
        assert!(PatientId::try_new(-4).is_err());
        assert_eq!(PatientId::try_new(7).map(PatientId::get), Ok(7));
    }

    #[test]
    fn parses_from_cli_text() {
        let id: PatientId = " 12 ".parse().unwrap();
        assert_eq!(id.get(), 12);
        assert!("abc".parse::<PatientId>().is_err());
        assert!("-1".parse::<PatientId>().is_err());
    }

    #[test]
    fn deserializes_through_validation() {
        let ok: PatientId = serde_json::from_str("3").unwrap();
        assert_eq!(ok.get(), 3);
        assert!(serde_json::from_str::<PatientId>("0").is_err());
    }
}
