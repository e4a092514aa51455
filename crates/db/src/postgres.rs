use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clinic_schedule_core::{
    errors::{ScheduleError, ScheduleResult},
    grid,
    models::{
        appointment::Appointment,
        timetable::{NewTimetable, Timetable, TimetableScope},
    },
};
use sqlx::{Postgres, Transaction};
use tracing::{info, warn};
use uuid::Uuid;

use crate::repositories::{appointment, timetable};
use crate::store::ScheduleStore;
use crate::DbPool;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Postgres-backed [`ScheduleStore`].
#[derive(Clone)]
pub struct PgScheduleStore {
    pool: DbPool,
}

impl PgScheduleStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> ScheduleResult<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|e| ScheduleError::Database(e.into()))
    }
}

async fn commit(tx: Transaction<'static, Postgres>) -> ScheduleResult<()> {
    tx.commit()
        .await
        .map_err(|e| ScheduleError::Database(e.into()))
}

/// SQLSTATE of the database error behind a repository failure, if any.
fn sqlstate(report: &eyre::Report) -> Option<String> {
    match report.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::Database(db_error)) => db_error.code().map(|code| code.into_owned()),
        _ => None,
    }
}

#[async_trait]
impl ScheduleStore for PgScheduleStore {
    async fn create_timetable(&self, new: &NewTimetable) -> ScheduleResult<Timetable> {
        let mut tx = self.begin().await?;

        timetable::lock_room(&mut tx, new.hospital_id, &new.room).await?;
        if timetable::has_conflict(&mut tx, new.hospital_id, &new.room, new.from_time, new.to_time, None)
            .await?
        {
            warn!(
                "Rejected timetable for hospital {} room {}: overlaps an existing timetable",
                new.hospital_id, new.room
            );
            return Err(ScheduleError::Conflict(format!(
                "Room '{}' of hospital {} is already scheduled within this time range",
                new.room, new.hospital_id
            )));
        }

        let created = timetable::create_timetable(&mut tx, new).await?;
        commit(tx).await?;

        info!("Created timetable {}", created.id);
        Ok(created.into())
    }

    async fn get_timetable(&self, id: Uuid) -> ScheduleResult<Option<Timetable>> {
        let row = timetable::get_timetable_by_id(&self.pool, id).await?;
        Ok(row.map(Into::into))
    }

    async fn update_timetable(&self, id: Uuid, revised: &NewTimetable) -> ScheduleResult<Timetable> {
        let mut tx = self.begin().await?;

        // The exclusive row lock makes concurrent bookings wait for this
        // transaction, so the count below stays true until commit.
        timetable::lock_timetable(&mut tx, id, true)
            .await?
            .ok_or_else(|| ScheduleError::NotFound(format!("Timetable with ID {} not found", id)))?;

        if appointment::count_appointments(&mut tx, id).await? > 0 {
            return Err(ScheduleError::State(format!(
                "Timetable {} has bookings and cannot be changed",
                id
            )));
        }

        timetable::lock_room(&mut tx, revised.hospital_id, &revised.room).await?;
        if timetable::has_conflict(
            &mut tx,
            revised.hospital_id,
            &revised.room,
            revised.from_time,
            revised.to_time,
            Some(id),
        )
        .await?
        {
            return Err(ScheduleError::Conflict(format!(
                "Room '{}' of hospital {} is already scheduled within this time range",
                revised.room, revised.hospital_id
            )));
        }

        let updated = timetable::update_timetable(&mut tx, id, revised).await?;
        commit(tx).await?;

        info!("Updated timetable {}", id);
        Ok(updated.into())
    }

    async fn delete_timetable(&self, id: Uuid) -> ScheduleResult<u64> {
        Ok(timetable::delete_timetable(&self.pool, id).await?)
    }

    async fn delete_timetables_by_doctor(&self, doctor_id: i64) -> ScheduleResult<u64> {
        Ok(timetable::delete_timetables_by_doctor(&self.pool, doctor_id).await?)
    }

    async fn delete_timetables_by_hospital(&self, hospital_id: i64) -> ScheduleResult<u64> {
        Ok(timetable::delete_timetables_by_hospital(&self.pool, hospital_id).await?)
    }

    async fn has_conflict(
        &self,
        hospital_id: i64,
        room: &str,
        from_time: DateTime<Utc>,
        to_time: DateTime<Utc>,
        excluding: Option<Uuid>,
    ) -> ScheduleResult<bool> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| ScheduleError::Database(e.into()))?;

        Ok(timetable::has_conflict(&mut conn, hospital_id, room, from_time, to_time, excluding).await?)
    }

    async fn find_timetables(
        &self,
        scope: &TimetableScope,
        from_time: DateTime<Utc>,
        to_time: DateTime<Utc>,
    ) -> ScheduleResult<Vec<Timetable>> {
        let rows = timetable::find_timetables(&self.pool, scope, from_time, to_time).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_appointments(&self, timetable_ids: &[Uuid]) -> ScheduleResult<Vec<Appointment>> {
        if timetable_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = appointment::get_appointments_by_timetable_ids(&self.pool, timetable_ids).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count_appointments(&self, timetable_id: Uuid) -> ScheduleResult<i64> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| ScheduleError::Database(e.into()))?;

        Ok(appointment::count_appointments(&mut conn, timetable_id).await?)
    }

    async fn book_appointment(
        &self,
        timetable_id: Uuid,
        username: &str,
        time: DateTime<Utc>,
    ) -> ScheduleResult<Appointment> {
        let mut tx = self.begin().await?;

        // A shared lock keeps the range fixed while we insert; updates take
        // the exclusive lock and wait for us.
        let locked = timetable::lock_timetable(&mut tx, timetable_id, false)
            .await?
            .ok_or_else(|| {
                ScheduleError::NotFound(format!("Timetable with ID {} not found", timetable_id))
            })?;

        if !grid::is_grid_point(locked.from_time, locked.to_time, time) {
            return Err(ScheduleError::Validation(format!(
                "{} is not a bookable slot of timetable {}",
                time, timetable_id
            )));
        }

        let created = match appointment::create_appointment(&mut tx, timetable_id, username, time).await {
            Ok(row) => row,
            Err(report) => {
                return Err(match sqlstate(&report).as_deref() {
                    Some(UNIQUE_VIOLATION) => {
                        warn!("Slot {} of timetable {} was booked concurrently", time, timetable_id);
                        ScheduleError::Conflict(format!(
                            "Slot {} of timetable {} is already booked",
                            time, timetable_id
                        ))
                    }
                    Some(FOREIGN_KEY_VIOLATION) => ScheduleError::NotFound(format!(
                        "Timetable with ID {} not found",
                        timetable_id
                    )),
                    _ => ScheduleError::Database(report),
                });
            }
        };
        commit(tx).await?;

        info!("Booked slot {} of timetable {} for {}", time, timetable_id, username);
        Ok(created.into())
    }

    async fn get_appointment(&self, id: Uuid) -> ScheduleResult<Option<Appointment>> {
        let row = appointment::get_appointment_by_id(&self.pool, id).await?;
        Ok(row.map(Into::into))
    }

    async fn delete_appointment(&self, id: Uuid) -> ScheduleResult<u64> {
        Ok(appointment::delete_appointment(&self.pool, id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_test_pool;
    use chrono::{Duration, TimeZone};

    fn new_timetable(room: &str, start_hour: u32, hours: i64) -> NewTimetable {
        let from_time = Utc.with_ymd_and_hms(2031, 3, 3, start_hour, 0, 0).unwrap();
        NewTimetable {
            hospital_id: 900_001,
            doctor_id: 5,
            room: room.to_string(),
            from_time,
            to_time: from_time + Duration::hours(hours),
        }
    }

    // Needs a running Postgres: TEST_DATABASE_URL=... cargo test -- --ignored
    #[tokio::test]
    #[ignore]
    async fn test_concurrent_bookings_of_one_slot() {
        let store = PgScheduleStore::new(create_test_pool().await);
        store.delete_timetables_by_hospital(900_001).await.unwrap();

        let created = store.create_timetable(&new_timetable("race", 9, 1)).await.unwrap();
        let slot = created.from_time;

        let (first, second) = tokio::join!(
            store.book_appointment(created.id, "alice", slot),
            store.book_appointment(created.id, "bob", slot),
        );

        let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        assert!(
            matches!(first, Err(ScheduleError::Conflict(_))) || matches!(second, Err(ScheduleError::Conflict(_)))
        );
        assert_eq!(store.count_appointments(created.id).await.unwrap(), 1);

        store.delete_timetables_by_hospital(900_001).await.unwrap();
    }

    #[tokio::test]
    #[ignore]
    async fn test_cascade_and_room_conflict() {
        let store = PgScheduleStore::new(create_test_pool().await);
        store.delete_timetables_by_hospital(900_001).await.unwrap();

        let created = store.create_timetable(&new_timetable("cascade", 9, 1)).await.unwrap();
        let overlapping = store.create_timetable(&new_timetable("cascade", 9, 2)).await;
        assert!(matches!(overlapping, Err(ScheduleError::Conflict(_))));

        let booked = store.book_appointment(created.id, "alice", created.from_time).await.unwrap();
        assert_eq!(store.delete_timetable(created.id).await.unwrap(), 1);
        assert!(store.get_appointment(booked.id).await.unwrap().is_none());
    }
}
