#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use clinic_schedule_api::{middleware::auth::AuthContext, ApiState};
use clinic_schedule_core::{
    auth::{Principal, Role},
    directory::{DoctorRecord, HospitalRecord, TokenInfo},
    mock::MockDirectory,
    models::timetable::NewTimetable,
};
use clinic_schedule_db::memory::MemoryScheduleStore;

pub const HOSPITAL_ID: i64 = 1;
pub const DOCTOR_ID: i64 = 5;

pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, hour, minute, 0).unwrap()
}

pub fn new_timetable(room: &str, from_time: DateTime<Utc>, to_time: DateTime<Utc>) -> NewTimetable {
    NewTimetable {
        hospital_id: HOSPITAL_ID,
        doctor_id: DOCTOR_ID,
        room: room.to_string(),
        from_time,
        to_time,
    }
}

pub fn caller(username: &str, roles: &[Role]) -> AuthContext {
    AuthContext::new(
        Principal::new(None, username, roles.iter().copied()),
        format!("{}-token", username),
    )
}

pub fn admin() -> AuthContext {
    caller("admin", &[Role::Admin])
}

pub fn manager() -> AuthContext {
    caller("manager", &[Role::Manager])
}

pub fn user(username: &str) -> AuthContext {
    caller(username, &[Role::User])
}

fn token_info(username: &str, roles: &[&str]) -> TokenInfo {
    TokenInfo {
        username: username.to_string(),
        user_id: Some(1),
        roles: roles.iter().map(|role| role.to_string()).collect(),
        issued_at: None,
        expires_at: None,
    }
}

/// Directory with hospital 1 (rooms 101 and 102) and doctor 5. Tokens are
/// named `<username>-token`; `admin`, `manager` and `doctor` carry the role of
/// the same name, `nobody` has no roles, everyone else is a plain user.
pub fn directory() -> MockDirectory {
    let mut directory = MockDirectory::new();

    directory.expect_resolve_hospital().returning(|hospital_id, _| {
        Ok((hospital_id == HOSPITAL_ID).then(|| HospitalRecord {
            id: Some(HOSPITAL_ID),
            name: Some("City Hospital".to_string()),
            rooms: vec!["101".to_string(), "102".to_string()],
        }))
    });

    directory.expect_resolve_doctor().returning(|doctor_id, _| {
        Ok((doctor_id == DOCTOR_ID).then(|| DoctorRecord {
            id: Some(DOCTOR_ID),
            first_name: Some("Gregory".to_string()),
            last_name: Some("House".to_string()),
        }))
    });

    directory.expect_introspect_token().returning(|token| {
        let Some(username) = token.strip_suffix("-token") else {
            return Ok(None);
        };
        Ok(Some(match username {
            "admin" => token_info(username, &["Admin"]),
            "manager" => token_info(username, &["Manager"]),
            "doctor" => token_info(username, &["Doctor"]),
            "nobody" => token_info(username, &[]),
            _ => token_info(username, &["User"]),
        }))
    });

    directory
}

pub fn state_with(directory: MockDirectory) -> Arc<ApiState> {
    Arc::new(ApiState::new(
        Arc::new(MemoryScheduleStore::new()),
        Arc::new(directory),
    ))
}

pub fn state() -> Arc<ApiState> {
    state_with(directory())
}
