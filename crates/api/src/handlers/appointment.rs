use axum::{
    extract::State,
    Json,
};
use clinic_schedule_core::models::{appointment::Appointment, timetable::DeleteResponse};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    extract::ValidPath,
    middleware::{auth::AuthContext, error_handling::AppError},
    ApiState,
};

pub async fn get_appointment(
    State(state): State<Arc<ApiState>>,
    auth: AuthContext,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<Json<Appointment>, AppError> {
    Ok(Json(state.booking.get_appointment(&auth, id).await?))
}

pub async fn cancel_appointment(
    State(state): State<Arc<ApiState>>,
    auth: AuthContext,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<Json<DeleteResponse>, AppError> {
    Ok(Json(state.booking.cancel(&auth, id).await?))
}
