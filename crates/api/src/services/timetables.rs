use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clinic_schedule_core::{
    auth::{authorize, Operation},
    directory::{DirectoryGateway, HospitalRecord},
    errors::{ScheduleError, ScheduleResult},
    grid,
    models::{
        appointment::Appointment,
        timetable::{
            DeleteResponse, NewTimetable, Timetable, TimetablePatch, TimetableResponse, TimetableScope,
            TimeWindowQuery,
        },
    },
};
use clinic_schedule_db::store::ScheduleStore;
use tracing::{info, warn};
use uuid::Uuid;

use crate::middleware::auth::AuthContext;
use crate::services::conflict::ConflictChecker;

/// Lifecycle and queries of doctors' timetables.
#[derive(Clone)]
pub struct TimetableService {
    store: Arc<dyn ScheduleStore>,
    directory: Arc<dyn DirectoryGateway>,
    conflicts: ConflictChecker,
}

impl TimetableService {
    pub fn new(store: Arc<dyn ScheduleStore>, directory: Arc<dyn DirectoryGateway>) -> Self {
        Self {
            conflicts: ConflictChecker::new(Arc::clone(&store)),
            store,
            directory,
        }
    }

    pub async fn create(&self, ctx: &AuthContext, new: NewTimetable) -> ScheduleResult<Timetable> {
        authorize(&ctx.principal, Operation::ManageTimetables)?;

        grid::validate_range(new.from_time, new.to_time)?;
        self.require_room(new.hospital_id, &new.room, &ctx.token).await?;
        self.require_doctor(new.doctor_id, &ctx.token).await?;
        self.conflicts
            .ensure_free(new.hospital_id, &new.room, new.from_time, new.to_time, None)
            .await?;

        let created = self.store.create_timetable(&new).await?;
        info!("{} created timetable {}", ctx.username(), created.id);
        Ok(created)
    }

    pub async fn get(&self, ctx: &AuthContext, id: Uuid) -> ScheduleResult<TimetableResponse> {
        authorize(&ctx.principal, Operation::ReadTimetables)?;

        let timetable = self.load(id).await?;
        let appointments = self.store.list_appointments(&[id]).await?;
        Ok(TimetableResponse {
            timetable,
            appointments,
        })
    }

    /// Applies `patch` to a timetable without bookings. Only the fields the
    /// patch carries are checked against the directory again.
    pub async fn update(
        &self,
        ctx: &AuthContext,
        id: Uuid,
        patch: TimetablePatch,
    ) -> ScheduleResult<Timetable> {
        authorize(&ctx.principal, Operation::ManageTimetables)?;

        let current = self.load(id).await?;
        if self.store.count_appointments(id).await? > 0 {
            warn!("Refused to update timetable {} with bookings", id);
            return Err(ScheduleError::State(format!(
                "Timetable {} has bookings and cannot be changed",
                id
            )));
        }
        if patch.is_empty() {
            return Ok(current);
        }

        let revised = patch.apply_to(&current);

        if patch.hospital_id.is_some() || patch.room.is_some() {
            self.require_room(revised.hospital_id, &revised.room, &ctx.token)
                .await?;
        }
        if patch.doctor_id.is_some() {
            self.require_doctor(revised.doctor_id, &ctx.token).await?;
        }
        grid::validate_range(revised.from_time, revised.to_time)?;
        self.conflicts
            .ensure_free(
                revised.hospital_id,
                &revised.room,
                revised.from_time,
                revised.to_time,
                Some(id),
            )
            .await?;

        let updated = self.store.update_timetable(id, &revised).await?;
        info!("{} updated timetable {}", ctx.username(), id);
        Ok(updated)
    }

    pub async fn delete(&self, ctx: &AuthContext, id: Uuid) -> ScheduleResult<DeleteResponse> {
        authorize(&ctx.principal, Operation::ManageTimetables)?;

        let deleted = self.store.delete_timetable(id).await?;
        if deleted == 0 {
            return Err(ScheduleError::NotFound(format!("Timetable with ID {} not found", id)));
        }

        info!("{} deleted timetable {}", ctx.username(), id);
        Ok(DeleteResponse {
            message: format!("Timetable {} deleted", id),
            deleted,
        })
    }

    pub async fn delete_by_doctor(
        &self,
        ctx: &AuthContext,
        doctor_id: i64,
    ) -> ScheduleResult<DeleteResponse> {
        authorize(&ctx.principal, Operation::ManageTimetables)?;

        let deleted = self.store.delete_timetables_by_doctor(doctor_id).await?;
        if deleted == 0 {
            return Err(ScheduleError::NotFound(format!(
                "No timetables found for doctor {}",
                doctor_id
            )));
        }

        info!("{} deleted {} timetables of doctor {}", ctx.username(), deleted, doctor_id);
        Ok(DeleteResponse {
            message: format!("Deleted {} timetables of doctor {}", deleted, doctor_id),
            deleted,
        })
    }

    pub async fn delete_by_hospital(
        &self,
        ctx: &AuthContext,
        hospital_id: i64,
    ) -> ScheduleResult<DeleteResponse> {
        authorize(&ctx.principal, Operation::ManageTimetables)?;

        let deleted = self.store.delete_timetables_by_hospital(hospital_id).await?;
        if deleted == 0 {
            return Err(ScheduleError::NotFound(format!(
                "No timetables found for hospital {}",
                hospital_id
            )));
        }

        info!("{} deleted {} timetables of hospital {}", ctx.username(), deleted, hospital_id);
        Ok(DeleteResponse {
            message: format!("Deleted {} timetables of hospital {}", deleted, hospital_id),
            deleted,
        })
    }

    pub async fn find_by_hospital(
        &self,
        ctx: &AuthContext,
        hospital_id: i64,
        window: &TimeWindowQuery,
    ) -> ScheduleResult<Vec<TimetableResponse>> {
        authorize(&ctx.principal, Operation::ReadTimetables)?;

        let (from_time, to_time) = parse_window(window)?;
        self.require_hospital(hospital_id, &ctx.token).await?;

        self.find(&TimetableScope::Hospital(hospital_id), from_time, to_time)
            .await
    }

    pub async fn find_by_doctor(
        &self,
        ctx: &AuthContext,
        doctor_id: i64,
        window: &TimeWindowQuery,
    ) -> ScheduleResult<Vec<TimetableResponse>> {
        authorize(&ctx.principal, Operation::ReadTimetables)?;

        let (from_time, to_time) = parse_window(window)?;
        self.require_doctor(doctor_id, &ctx.token).await?;

        self.find(&TimetableScope::Doctor(doctor_id), from_time, to_time)
            .await
    }

    /// Unlike the other lookups, an empty room schedule is `NotFound`.
    pub async fn find_by_room(
        &self,
        ctx: &AuthContext,
        hospital_id: i64,
        room: &str,
        window: &TimeWindowQuery,
    ) -> ScheduleResult<Vec<TimetableResponse>> {
        authorize(&ctx.principal, Operation::ReadRoomSchedule)?;

        let (from_time, to_time) = parse_window(window)?;
        self.require_room(hospital_id, room, &ctx.token).await?;

        let scope = TimetableScope::Room {
            hospital_id,
            room: room.to_string(),
        };
        let found = self.find(&scope, from_time, to_time).await?;
        if found.is_empty() {
            return Err(ScheduleError::NotFound(format!(
                "No timetables for room '{}' of hospital {} in this period",
                room, hospital_id
            )));
        }
        Ok(found)
    }

    async fn load(&self, id: Uuid) -> ScheduleResult<Timetable> {
        self.store
            .get_timetable(id)
            .await?
            .ok_or_else(|| ScheduleError::NotFound(format!("Timetable with ID {} not found", id)))
    }

    async fn find(
        &self,
        scope: &TimetableScope,
        from_time: DateTime<Utc>,
        to_time: DateTime<Utc>,
    ) -> ScheduleResult<Vec<TimetableResponse>> {
        let timetables = self.store.find_timetables(scope, from_time, to_time).await?;
        let ids: Vec<Uuid> = timetables.iter().map(|timetable| timetable.id).collect();

        let mut by_timetable: HashMap<Uuid, Vec<Appointment>> = HashMap::new();
        for appointment in self.store.list_appointments(&ids).await? {
            by_timetable
                .entry(appointment.timetable_id)
                .or_default()
                .push(appointment);
        }

        Ok(timetables
            .into_iter()
            .map(|timetable| TimetableResponse {
                appointments: by_timetable.remove(&timetable.id).unwrap_or_default(),
                timetable,
            })
            .collect())
    }

    async fn require_hospital(&self, hospital_id: i64, token: &str) -> ScheduleResult<HospitalRecord> {
        self.directory
            .resolve_hospital(hospital_id, token)
            .await?
            .ok_or_else(|| {
                ScheduleError::Reference(format!("Hospital with ID {} does not exist", hospital_id))
            })
    }

    async fn require_room(&self, hospital_id: i64, room: &str, token: &str) -> ScheduleResult<()> {
        let hospital = self.require_hospital(hospital_id, token).await?;
        if !hospital.has_room(room) {
            return Err(ScheduleError::Reference(format!(
                "Room '{}' does not belong to hospital {}",
                room, hospital_id
            )));
        }
        Ok(())
    }

    async fn require_doctor(&self, doctor_id: i64, token: &str) -> ScheduleResult<()> {
        self.directory
            .resolve_doctor(doctor_id, token)
            .await?
            .map(|_| ())
            .ok_or_else(|| {
                ScheduleError::Reference(format!("Doctor with ID {} does not exist", doctor_id))
            })
    }
}

fn parse_window(window: &TimeWindowQuery) -> ScheduleResult<(DateTime<Utc>, DateTime<Utc>)> {
    let from_time = grid::parse_instant(&window.from)?;
    let to_time = grid::parse_instant(&window.to)?;
    if from_time > to_time {
        return Err(ScheduleError::Validation(
            "'from' must not be later than 'to'".to_string(),
        ));
    }
    Ok((from_time, to_time))
}
