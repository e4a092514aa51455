use std::sync::Arc;

use chrono::{DateTime, Utc};
use clinic_schedule_core::errors::{ScheduleError, ScheduleResult};
use clinic_schedule_db::store::ScheduleStore;
use uuid::Uuid;

/// Answers whether a room is already taken for part of a time range.
#[derive(Clone)]
pub struct ConflictChecker {
    store: Arc<dyn ScheduleStore>,
}

impl ConflictChecker {
    pub fn new(store: Arc<dyn ScheduleStore>) -> Self {
        Self { store }
    }

    pub async fn has_conflict(
        &self,
        hospital_id: i64,
        room: &str,
        from_time: DateTime<Utc>,
        to_time: DateTime<Utc>,
        excluding: Option<Uuid>,
    ) -> ScheduleResult<bool> {
        self.store
            .has_conflict(hospital_id, room, from_time, to_time, excluding)
            .await
    }

    /// Fails with `Conflict` if the range overlaps another timetable of the
    /// same room. `excluding` leaves one timetable out of the comparison.
    pub async fn ensure_free(
        &self,
        hospital_id: i64,
        room: &str,
        from_time: DateTime<Utc>,
        to_time: DateTime<Utc>,
        excluding: Option<Uuid>,
    ) -> ScheduleResult<()> {
        if self
            .has_conflict(hospital_id, room, from_time, to_time, excluding)
            .await?
        {
            return Err(ScheduleError::Conflict(format!(
                "Room '{}' of hospital {} is already scheduled within this time range",
                room, hospital_id
            )));
        }
        Ok(())
    }
}
