use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ScheduleResult;
use crate::grid::parse_instant;
use crate::models::appointment::Appointment;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timetable {
    pub id: Uuid,
    pub hospital_id: i64,
    pub doctor_id: i64,
    pub room: String,
    pub from_time: DateTime<Utc>,
    pub to_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Validated field set for inserting or rewriting a timetable row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTimetable {
    pub hospital_id: i64,
    pub doctor_id: i64,
    pub room: String,
    pub from_time: DateTime<Utc>,
    pub to_time: DateTime<Utc>,
}

impl From<&Timetable> for NewTimetable {
    fn from(timetable: &Timetable) -> Self {
        Self {
            hospital_id: timetable.hospital_id,
            doctor_id: timetable.doctor_id,
            room: timetable.room.clone(),
            from_time: timetable.from_time,
            to_time: timetable.to_time,
        }
    }
}

/// Partial update of a timetable. `None` means "leave unchanged"; none of the
/// timetable columns are nullable, so there is no "clear" state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimetablePatch {
    pub hospital_id: Option<i64>,
    pub doctor_id: Option<i64>,
    pub room: Option<String>,
    pub from_time: Option<DateTime<Utc>>,
    pub to_time: Option<DateTime<Utc>>,
}

impl TimetablePatch {
    pub fn is_empty(&self) -> bool {
        self.hospital_id.is_none()
            && self.doctor_id.is_none()
            && self.room.is_none()
            && self.from_time.is_none()
            && self.to_time.is_none()
    }

    /// Overlays the present fields onto `current`.
    pub fn apply_to(&self, current: &Timetable) -> NewTimetable {
        NewTimetable {
            hospital_id: self.hospital_id.unwrap_or(current.hospital_id),
            doctor_id: self.doctor_id.unwrap_or(current.doctor_id),
            room: self.room.clone().unwrap_or_else(|| current.room.clone()),
            from_time: self.from_time.unwrap_or(current.from_time),
            to_time: self.to_time.unwrap_or(current.to_time),
        }
    }
}

/// Which timetables a schedule query is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimetableScope {
    Hospital(i64),
    Doctor(i64),
    Room { hospital_id: i64, room: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTimetableRequest {
    pub hospital_id: i64,
    pub doctor_id: i64,
    pub room: String,
    pub from_time: String,
    pub to_time: String,
}

impl CreateTimetableRequest {
    pub fn parse(&self) -> ScheduleResult<NewTimetable> {
        Ok(NewTimetable {
            hospital_id: self.hospital_id,
            doctor_id: self.doctor_id,
            room: self.room.clone(),
            from_time: parse_instant(&self.from_time)?,
            to_time: parse_instant(&self.to_time)?,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateTimetableRequest {
    pub hospital_id: Option<i64>,
    pub doctor_id: Option<i64>,
    pub room: Option<String>,
    pub from_time: Option<String>,
    pub to_time: Option<String>,
}

impl UpdateTimetableRequest {
    pub fn parse(&self) -> ScheduleResult<TimetablePatch> {
        Ok(TimetablePatch {
            hospital_id: self.hospital_id,
            doctor_id: self.doctor_id,
            room: self.room.clone(),
            from_time: self.from_time.as_deref().map(parse_instant).transpose()?,
            to_time: self.to_time.as_deref().map(parse_instant).transpose()?,
        })
    }
}

/// Query string for schedule lookups; accepts both `from`/`to` and the
/// longer `from_time`/`to_time` spellings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeWindowQuery {
    #[serde(alias = "from_time")]
    pub from: String,
    #[serde(alias = "to_time")]
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableResponse {
    #[serde(flatten)]
    pub timetable: Timetable,
    pub appointments: Vec<Appointment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableSlotsResponse {
    pub timetable_id: Uuid,
    pub slots: Vec<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
    pub deleted: u64,
}
