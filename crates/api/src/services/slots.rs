use std::sync::Arc;

use chrono::{DateTime, Utc};
use clinic_schedule_core::{
    auth::{authorize, Operation},
    errors::{ScheduleError, ScheduleResult},
    grid,
    models::timetable::{AvailableSlotsResponse, Timetable},
};
use clinic_schedule_db::store::ScheduleStore;
use uuid::Uuid;

use crate::middleware::auth::AuthContext;

/// Computes the free 30-minute slots of a timetable from its current bookings.
#[derive(Clone)]
pub struct SlotGenerator {
    store: Arc<dyn ScheduleStore>,
}

impl SlotGenerator {
    pub fn new(store: Arc<dyn ScheduleStore>) -> Self {
        Self { store }
    }

    pub async fn available_slots(
        &self,
        ctx: &AuthContext,
        timetable_id: Uuid,
    ) -> ScheduleResult<AvailableSlotsResponse> {
        authorize(&ctx.principal, Operation::ViewSlots)?;

        let timetable = self.store.get_timetable(timetable_id).await?.ok_or_else(|| {
            ScheduleError::NotFound(format!("Timetable with ID {} not found", timetable_id))
        })?;

        Ok(AvailableSlotsResponse {
            timetable_id,
            slots: self.free_slots(&timetable).await?,
        })
    }

    pub async fn free_slots(&self, timetable: &Timetable) -> ScheduleResult<Vec<DateTime<Utc>>> {
        let booked: Vec<DateTime<Utc>> = self
            .store
            .list_appointments(&[timetable.id])
            .await?
            .into_iter()
            .map(|appointment| appointment.time)
            .collect();

        Ok(grid::free_slots(timetable.from_time, timetable.to_time, &booked))
    }
}
