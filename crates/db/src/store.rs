//! # Schedule storage seam
//!
//! [`ScheduleStore`] is what the service layer talks to. Each method is one
//! unit of work: implementations run the multi-step ones (create, update,
//! book) atomically and repeat the invariant checks that matter under
//! concurrency inside that unit, so the service's own checks only serve as a
//! fast path.
//!
//! Two implementations ship with the crate: [`PgScheduleStore`] for
//! production and [`MemoryScheduleStore`] for tests and local runs.
//!
//! [`PgScheduleStore`]: crate::postgres::PgScheduleStore
//! [`MemoryScheduleStore`]: crate::memory::MemoryScheduleStore

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clinic_schedule_core::{
    errors::ScheduleResult,
    models::{
        appointment::Appointment,
        timetable::{NewTimetable, Timetable, TimetableScope},
    },
};
use uuid::Uuid;

#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// Inserts a timetable unless it overlaps another one in the same room
    /// (`ScheduleError::Conflict`).
    async fn create_timetable(&self, timetable: &NewTimetable) -> ScheduleResult<Timetable>;

    async fn get_timetable(&self, id: Uuid) -> ScheduleResult<Option<Timetable>>;

    /// Rewrites a timetable that has no appointments.
    ///
    /// Fails with `NotFound` if the row is gone, `State` if it has bookings,
    /// and `Conflict` if the new range overlaps another timetable in the
    /// target room.
    async fn update_timetable(&self, id: Uuid, revised: &NewTimetable) -> ScheduleResult<Timetable>;

    /// Deletes a timetable together with its appointments. Returns the number
    /// of timetables removed.
    async fn delete_timetable(&self, id: Uuid) -> ScheduleResult<u64>;

    async fn delete_timetables_by_doctor(&self, doctor_id: i64) -> ScheduleResult<u64>;

    async fn delete_timetables_by_hospital(&self, hospital_id: i64) -> ScheduleResult<u64>;

    async fn has_conflict(
        &self,
        hospital_id: i64,
        room: &str,
        from_time: DateTime<Utc>,
        to_time: DateTime<Utc>,
        excluding: Option<Uuid>,
    ) -> ScheduleResult<bool>;

    /// Timetables of `scope` fully contained in `[from_time, to_time]`,
    /// ordered by start.
    async fn find_timetables(
        &self,
        scope: &TimetableScope,
        from_time: DateTime<Utc>,
        to_time: DateTime<Utc>,
    ) -> ScheduleResult<Vec<Timetable>>;

    /// Appointments of the given timetables, ordered by time.
    async fn list_appointments(&self, timetable_ids: &[Uuid]) -> ScheduleResult<Vec<Appointment>>;

    async fn count_appointments(&self, timetable_id: Uuid) -> ScheduleResult<i64>;

    /// Reserves `time` on a timetable for `username`.
    ///
    /// The slot must be a grid point of the timetable as it is at commit
    /// time (`Validation` otherwise). A second reservation of the same slot
    /// fails with `Conflict`; a vanished timetable with `NotFound`.
    async fn book_appointment(
        &self,
        timetable_id: Uuid,
        username: &str,
        time: DateTime<Utc>,
    ) -> ScheduleResult<Appointment>;

    async fn get_appointment(&self, id: Uuid) -> ScheduleResult<Option<Appointment>>;

    /// Returns the number of appointments removed.
    async fn delete_appointment(&self, id: Uuid) -> ScheduleResult<u64>;
}
