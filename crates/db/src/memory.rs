//! In-process [`ScheduleStore`] with the same invariants as the Postgres one.
//!
//! Every method does its work under a single mutex and never awaits while
//! holding it, which makes each call atomic the way a transaction is.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

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
use tracing::{debug, warn};
use uuid::Uuid;

use crate::store::ScheduleStore;

#[derive(Default)]
struct MemoryState {
    timetables: HashMap<Uuid, Timetable>,
    appointments: HashMap<Uuid, Appointment>,
    // (timetable_id, time) uniqueness, as enforced by the database constraint.
    booked_slots: HashSet<(Uuid, DateTime<Utc>)>,
}

impl MemoryState {
    fn has_conflict(
        &self,
        hospital_id: i64,
        room: &str,
        from_time: DateTime<Utc>,
        to_time: DateTime<Utc>,
        excluding: Option<Uuid>,
    ) -> bool {
        self.timetables.values().any(|existing| {
            Some(existing.id) != excluding
                && existing.hospital_id == hospital_id
                && existing.room == room
                && grid::ranges_overlap(existing.from_time, existing.to_time, from_time, to_time)
        })
    }

    fn remove_timetables(&mut self, matches: impl Fn(&Timetable) -> bool) -> u64 {
        let doomed: Vec<Uuid> = self
            .timetables
            .values()
            .filter(|timetable| matches(timetable))
            .map(|timetable| timetable.id)
            .collect();

        for id in &doomed {
            self.timetables.remove(id);
        }
        self.appointments
            .retain(|_, appointment| !doomed.contains(&appointment.timetable_id));
        self.booked_slots
            .retain(|(timetable_id, _)| !doomed.contains(timetable_id));

        doomed.len() as u64
    }
}

#[derive(Default)]
pub struct MemoryScheduleStore {
    state: Mutex<MemoryState>,
}

impl MemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> ScheduleResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| ScheduleError::Internal("memory store lock poisoned".into()))
    }
}

fn room_conflict(room: &str, hospital_id: i64) -> ScheduleError {
    ScheduleError::Conflict(format!(
        "Room '{}' of hospital {} is already scheduled within this time range",
        room, hospital_id
    ))
}

#[async_trait]
impl ScheduleStore for MemoryScheduleStore {
    async fn create_timetable(&self, new: &NewTimetable) -> ScheduleResult<Timetable> {
        let mut state = self.state()?;

        if state.has_conflict(new.hospital_id, &new.room, new.from_time, new.to_time, None) {
            warn!("Rejected overlapping timetable in room {}", new.room);
            return Err(room_conflict(&new.room, new.hospital_id));
        }

        let timetable = Timetable {
            id: Uuid::new_v4(),
            hospital_id: new.hospital_id,
            doctor_id: new.doctor_id,
            room: new.room.clone(),
            from_time: new.from_time,
            to_time: new.to_time,
            created_at: Utc::now(),
        };
        state.timetables.insert(timetable.id, timetable.clone());

        debug!("Stored timetable {}", timetable.id);
        Ok(timetable)
    }

    async fn get_timetable(&self, id: Uuid) -> ScheduleResult<Option<Timetable>> {
        Ok(self.state()?.timetables.get(&id).cloned())
    }

    async fn update_timetable(&self, id: Uuid, revised: &NewTimetable) -> ScheduleResult<Timetable> {
        let mut state = self.state()?;

        if !state.timetables.contains_key(&id) {
            return Err(ScheduleError::NotFound(format!("Timetable with ID {} not found", id)));
        }
        if state.booked_slots.iter().any(|(timetable_id, _)| *timetable_id == id) {
            return Err(ScheduleError::State(format!(
                "Timetable {} has bookings and cannot be changed",
                id
            )));
        }
        if state.has_conflict(
            revised.hospital_id,
            &revised.room,
            revised.from_time,
            revised.to_time,
            Some(id),
        ) {
            return Err(room_conflict(&revised.room, revised.hospital_id));
        }

        let timetable = state
            .timetables
            .get_mut(&id)
            .ok_or_else(|| ScheduleError::NotFound(format!("Timetable with ID {} not found", id)))?;
        timetable.hospital_id = revised.hospital_id;
        timetable.doctor_id = revised.doctor_id;
        timetable.room = revised.room.clone();
        timetable.from_time = revised.from_time;
        timetable.to_time = revised.to_time;

        Ok(timetable.clone())
    }

    async fn delete_timetable(&self, id: Uuid) -> ScheduleResult<u64> {
        Ok(self.state()?.remove_timetables(|timetable| timetable.id == id))
    }

    async fn delete_timetables_by_doctor(&self, doctor_id: i64) -> ScheduleResult<u64> {
        Ok(self
            .state()?
            .remove_timetables(|timetable| timetable.doctor_id == doctor_id))
    }

    async fn delete_timetables_by_hospital(&self, hospital_id: i64) -> ScheduleResult<u64> {
        Ok(self
            .state()?
            .remove_timetables(|timetable| timetable.hospital_id == hospital_id))
    }

    async fn has_conflict(
        &self,
        hospital_id: i64,
        room: &str,
        from_time: DateTime<Utc>,
        to_time: DateTime<Utc>,
        excluding: Option<Uuid>,
    ) -> ScheduleResult<bool> {
        Ok(self
            .state()?
            .has_conflict(hospital_id, room, from_time, to_time, excluding))
    }

    async fn find_timetables(
        &self,
        scope: &TimetableScope,
        from_time: DateTime<Utc>,
        to_time: DateTime<Utc>,
    ) -> ScheduleResult<Vec<Timetable>> {
        let state = self.state()?;

        let mut found: Vec<Timetable> = state
            .timetables
            .values()
            .filter(|timetable| match scope {
                TimetableScope::Hospital(hospital_id) => timetable.hospital_id == *hospital_id,
                TimetableScope::Doctor(doctor_id) => timetable.doctor_id == *doctor_id,
                TimetableScope::Room { hospital_id, room } => {
                    timetable.hospital_id == *hospital_id && timetable.room == *room
                }
            })
            .filter(|timetable| timetable.from_time >= from_time && timetable.to_time <= to_time)
            .cloned()
            .collect();

        found.sort_by(|a, b| a.from_time.cmp(&b.from_time).then_with(|| a.room.cmp(&b.room)));
        Ok(found)
    }

    async fn list_appointments(&self, timetable_ids: &[Uuid]) -> ScheduleResult<Vec<Appointment>> {
        let state = self.state()?;

        let mut appointments: Vec<Appointment> = state
            .appointments
            .values()
            .filter(|appointment| timetable_ids.contains(&appointment.timetable_id))
            .cloned()
            .collect();

        appointments.sort_by_key(|appointment| appointment.time);
        Ok(appointments)
    }

    async fn count_appointments(&self, timetable_id: Uuid) -> ScheduleResult<i64> {
        let state = self.state()?;
        let count = state
            .booked_slots
            .iter()
            .filter(|(id, _)| *id == timetable_id)
            .count();
        Ok(count as i64)
    }

    async fn book_appointment(
        &self,
        timetable_id: Uuid,
        username: &str,
        time: DateTime<Utc>,
    ) -> ScheduleResult<Appointment> {
        let mut state = self.state()?;

        let timetable = state.timetables.get(&timetable_id).ok_or_else(|| {
            ScheduleError::NotFound(format!("Timetable with ID {} not found", timetable_id))
        })?;

        if !grid::is_grid_point(timetable.from_time, timetable.to_time, time) {
            return Err(ScheduleError::Validation(format!(
                "{} is not a bookable slot of timetable {}",
                time, timetable_id
            )));
        }

        if !state.booked_slots.insert((timetable_id, time)) {
            warn!("Slot {} of timetable {} was booked concurrently", time, timetable_id);
            return Err(ScheduleError::Conflict(format!(
                "Slot {} of timetable {} is already booked",
                time, timetable_id
            )));
        }

        let appointment = Appointment {
            id: Uuid::new_v4(),
            timetable_id,
            username: username.to_string(),
            time,
            created_at: Utc::now(),
        };
        state.appointments.insert(appointment.id, appointment.clone());

        Ok(appointment)
    }

    async fn get_appointment(&self, id: Uuid) -> ScheduleResult<Option<Appointment>> {
        Ok(self.state()?.appointments.get(&id).cloned())
    }

    async fn delete_appointment(&self, id: Uuid) -> ScheduleResult<u64> {
        let mut state = self.state()?;

        match state.appointments.remove(&id) {
            Some(appointment) => {
                state
                    .booked_slots
                    .remove(&(appointment.timetable_id, appointment.time));
                Ok(1)
            }
            None => Ok(0),
        }
    }
}
