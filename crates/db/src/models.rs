use chrono::{DateTime, Utc};
use clinic_schedule_core::models::{appointment::Appointment, timetable::Timetable};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct DbTimetable {
    pub id: Uuid,
    pub hospital_id: i64,
    pub doctor_id: i64,
    pub room: String,
    pub from_time: DateTime<Utc>,
    pub to_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbAppointment {
    pub id: Uuid,
    pub timetable_id: Uuid,
    pub username: String,
    pub time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<DbTimetable> for Timetable {
    fn from(row: DbTimetable) -> Self {
        Timetable {
            id: row.id,
            hospital_id: row.hospital_id,
            doctor_id: row.doctor_id,
            room: row.room,
            from_time: row.from_time,
            to_time: row.to_time,
            created_at: row.created_at,
        }
    }
}

impl From<DbAppointment> for Appointment {
    fn from(row: DbAppointment) -> Self {
        Appointment {
            id: row.id,
            timetable_id: row.timetable_id,
            username: row.username,
            time: row.time,
            created_at: row.created_at,
        }
    }
}
