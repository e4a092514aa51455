use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use clinic_schedule_core::{
    auth::{authorize, authorize_owner, Operation},
    errors::{ScheduleError, ScheduleResult},
    models::{appointment::Appointment, timetable::DeleteResponse},
};
use clinic_schedule_db::store::ScheduleStore;
use tracing::{info, warn};
use uuid::Uuid;

use crate::middleware::auth::AuthContext;
use crate::services::slots::SlotGenerator;

/// Books and cancels appointments.
#[derive(Clone)]
pub struct BookingEngine {
    store: Arc<dyn ScheduleStore>,
    slots: SlotGenerator,
}

impl BookingEngine {
    pub fn new(store: Arc<dyn ScheduleStore>, slots: SlotGenerator) -> Self {
        Self { store, slots }
    }

    /// Reserves `time` for the caller.
    ///
    /// A slot that is off the grid, outside the timetable or already taken is
    /// rejected with `Validation`. Two callers racing past that check are
    /// settled by the store: the loser gets `Conflict`.
    pub async fn book(
        &self,
        ctx: &AuthContext,
        timetable_id: Uuid,
        time: DateTime<Utc>,
    ) -> ScheduleResult<Appointment> {
        authorize(&ctx.principal, Operation::BookAppointment)?;

        let timetable = self.store.get_timetable(timetable_id).await?.ok_or_else(|| {
            ScheduleError::NotFound(format!("Timetable with ID {} not found", timetable_id))
        })?;

        let time = time.trunc_subsecs(0);
        if !self.slots.free_slots(&timetable).await?.contains(&time) {
            warn!("{} asked for unavailable slot {} of timetable {}", ctx.username(), time, timetable_id);
            return Err(ScheduleError::Validation(format!(
                "Slot {} is not available in timetable {}",
                time.to_rfc3339(),
                timetable_id
            )));
        }

        let appointment = self
            .store
            .book_appointment(timetable_id, ctx.username(), time)
            .await?;

        info!("{} booked appointment {}", ctx.username(), appointment.id);
        Ok(appointment)
    }

    /// Admins and managers may cancel anything, everyone else only their own
    /// bookings.
    pub async fn cancel(&self, ctx: &AuthContext, appointment_id: Uuid) -> ScheduleResult<DeleteResponse> {
        let appointment = self.load(appointment_id).await?;
        authorize_owner(&ctx.principal, &appointment.username, Operation::ManageAppointments)?;

        let deleted = self.store.delete_appointment(appointment_id).await?;
        if deleted == 0 {
            return Err(ScheduleError::NotFound(format!(
                "Appointment with ID {} not found",
                appointment_id
            )));
        }

        info!("{} cancelled appointment {}", ctx.username(), appointment_id);
        Ok(DeleteResponse {
            message: format!("Appointment {} cancelled", appointment_id),
            deleted,
        })
    }

    pub async fn get_appointment(&self, ctx: &AuthContext, appointment_id: Uuid) -> ScheduleResult<Appointment> {
        let appointment = self.load(appointment_id).await?;
        authorize_owner(&ctx.principal, &appointment.username, Operation::ManageAppointments)?;
        Ok(appointment)
    }

    async fn load(&self, appointment_id: Uuid) -> ScheduleResult<Appointment> {
        self.store.get_appointment(appointment_id).await?.ok_or_else(|| {
            ScheduleError::NotFound(format!("Appointment with ID {} not found", appointment_id))
        })
    }
}
