//! The directory gateway: account and hospital facts owned by other services.
//!
//! Every call forwards the caller's bearer token. Absence (`Ok(None)`) is a
//! normal answer; transport failures and unexpected statuses surface as
//! [`ScheduleError::Upstream`](crate::errors::ScheduleError::Upstream).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::ScheduleResult;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DoctorRecord {
    pub id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HospitalRecord {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub rooms: Vec<String>,
}

impl HospitalRecord {
    pub fn has_room(&self, room: &str) -> bool {
        self.rooms.iter().any(|candidate| candidate == room)
    }
}

/// Token introspection result from the account service.
///
/// The issue and expiry stamps are kept as sent; the account service renders
/// them as `+00:00Z` suffixed strings that are not strict RFC 3339.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub username: String,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub issued_at: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
}

#[async_trait]
pub trait DirectoryGateway: Send + Sync {
    async fn resolve_doctor(&self, doctor_id: i64, token: &str) -> ScheduleResult<Option<DoctorRecord>>;

    async fn resolve_hospital(
        &self,
        hospital_id: i64,
        token: &str,
    ) -> ScheduleResult<Option<HospitalRecord>>;

    /// Returns `None` when the account service rejects the token.
    async fn introspect_token(&self, token: &str) -> ScheduleResult<Option<TokenInfo>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_hospital_record_rooms() {
        let hospital: HospitalRecord = serde_json::from_str(
            r#"{"id": 1, "name": "City", "address": "Main st", "contactPhone": "1", "rooms": ["101", "102"]}"#,
        )
        .unwrap();

        assert!(hospital.has_room("101"));
        assert!(!hospital.has_room("103"));
    }

    #[test]
    fn test_doctor_record_camel_case() {
        let doctor: DoctorRecord =
            serde_json::from_str(r#"{"firstName": "Ann", "lastName": "Lee"}"#).unwrap();

        assert_eq!(doctor.first_name.as_deref(), Some("Ann"));
        assert_eq!(doctor.id, None);
    }

    #[test]
    fn test_token_info_defaults() {
        let info: TokenInfo = serde_json::from_str(r#"{"username": "alice"}"#).unwrap();

        assert_eq!(info.username, "alice");
        assert!(info.roles.is_empty());
        assert_eq!(info.user_id, None);
        assert_eq!(info.expires_at, None);
    }

    #[test]
    fn test_token_info_from_validate_response() {
        let info: TokenInfo = serde_json::from_str(
            r#"{
                "username": "alice",
                "user_id": 42,
                "roles": ["User"],
                "issued_at": "2024-01-01T09:00:00+00:00Z",
                "expires_at": "2024-01-01T10:00:00+00:00Z",
                "token_is_valid": true
            }"#,
        )
        .unwrap();

        assert_eq!(info.user_id, Some(42));
        assert_eq!(info.issued_at.as_deref(), Some("2024-01-01T09:00:00+00:00Z"));
        assert_eq!(info.expires_at.as_deref(), Some("2024-01-01T10:00:00+00:00Z"));
    }
}
