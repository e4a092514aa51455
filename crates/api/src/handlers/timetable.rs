use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use clinic_schedule_core::{
    grid,
    models::{
        appointment::{Appointment, BookAppointmentRequest},
        timetable::{
            AvailableSlotsResponse, CreateTimetableRequest, DeleteResponse, Timetable, TimetableResponse,
            TimeWindowQuery, UpdateTimetableRequest,
        },
    },
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    extract::{ValidJson, ValidPath, ValidQuery},
    middleware::{auth::AuthContext, error_handling::AppError},
    ApiState,
};

#[axum::debug_handler(state = Arc<ApiState>)]
pub async fn create_timetable(
    State(state): State<Arc<ApiState>>,
    auth: AuthContext,
    ValidJson(payload): ValidJson<CreateTimetableRequest>,
) -> Result<(StatusCode, Json<Timetable>), AppError> {
    let new = payload.parse()?;
    let timetable = state.timetables.create(&auth, new).await?;

    Ok((StatusCode::CREATED, Json(timetable)))
}

#[axum::debug_handler(state = Arc<ApiState>)]
pub async fn get_timetable(
    State(state): State<Arc<ApiState>>,
    auth: AuthContext,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<Json<TimetableResponse>, AppError> {
    Ok(Json(state.timetables.get(&auth, id).await?))
}

#[axum::debug_handler(state = Arc<ApiState>)]
pub async fn update_timetable(
    State(state): State<Arc<ApiState>>,
    auth: AuthContext,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(payload): ValidJson<UpdateTimetableRequest>,
) -> Result<Json<Timetable>, AppError> {
    let patch = payload.parse()?;
    Ok(Json(state.timetables.update(&auth, id, patch).await?))
}

pub async fn delete_timetable(
    State(state): State<Arc<ApiState>>,
    auth: AuthContext,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<Json<DeleteResponse>, AppError> {
    Ok(Json(state.timetables.delete(&auth, id).await?))
}

pub async fn delete_doctor_timetables(
    State(state): State<Arc<ApiState>>,
    auth: AuthContext,
    ValidPath(doctor_id): ValidPath<i64>,
) -> Result<Json<DeleteResponse>, AppError> {
    Ok(Json(state.timetables.delete_by_doctor(&auth, doctor_id).await?))
}

pub async fn delete_hospital_timetables(
    State(state): State<Arc<ApiState>>,
    auth: AuthContext,
    ValidPath(hospital_id): ValidPath<i64>,
) -> Result<Json<DeleteResponse>, AppError> {
    Ok(Json(state.timetables.delete_by_hospital(&auth, hospital_id).await?))
}

pub async fn hospital_timetables(
    State(state): State<Arc<ApiState>>,
    auth: AuthContext,
    ValidPath(hospital_id): ValidPath<i64>,
    ValidQuery(window): ValidQuery<TimeWindowQuery>,
) -> Result<Json<Vec<TimetableResponse>>, AppError> {
    Ok(Json(
        state
            .timetables
            .find_by_hospital(&auth, hospital_id, &window)
            .await?,
    ))
}

pub async fn doctor_timetables(
    State(state): State<Arc<ApiState>>,
    auth: AuthContext,
    ValidPath(doctor_id): ValidPath<i64>,
    ValidQuery(window): ValidQuery<TimeWindowQuery>,
) -> Result<Json<Vec<TimetableResponse>>, AppError> {
    Ok(Json(
        state
            .timetables
            .find_by_doctor(&auth, doctor_id, &window)
            .await?,
    ))
}

pub async fn room_timetables(
    State(state): State<Arc<ApiState>>,
    auth: AuthContext,
    ValidPath((hospital_id, room)): ValidPath<(i64, String)>,
    ValidQuery(window): ValidQuery<TimeWindowQuery>,
) -> Result<Json<Vec<TimetableResponse>>, AppError> {
    Ok(Json(
        state
            .timetables
            .find_by_room(&auth, hospital_id, &room, &window)
            .await?,
    ))
}

pub async fn available_slots(
    State(state): State<Arc<ApiState>>,
    auth: AuthContext,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<Json<AvailableSlotsResponse>, AppError> {
    Ok(Json(state.slots.available_slots(&auth, id).await?))
}

#[axum::debug_handler(state = Arc<ApiState>)]
pub async fn book_appointment(
    State(state): State<Arc<ApiState>>,
    auth: AuthContext,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(payload): ValidJson<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    let time = grid::parse_instant(&payload.time)?;
    let appointment = state.booking.book(&auth, id, time).await?;

    Ok((StatusCode::CREATED, Json(appointment)))
}
