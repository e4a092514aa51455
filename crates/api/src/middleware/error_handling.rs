//! # Error Handling Middleware
//!
//! Maps [`ScheduleError`] onto HTTP status codes and a JSON body of the form
//! `{"error": <message>, "kind": <variant>}`. Server-side failures are logged
//! before they leave the process.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use clinic_schedule_core::errors::ScheduleError;
use serde_json::json;
use tracing::error;

/// Application error wrapper that provides HTTP status code mapping
///
/// Handlers return `Result<_, AppError>` and use `?` on anything that yields
/// a `ScheduleError` or an `eyre::Report`.
#[derive(Debug)]
pub struct AppError(pub ScheduleError);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ScheduleError::NotFound(_) => StatusCode::NOT_FOUND,
            ScheduleError::Validation(_) | ScheduleError::Reference(_) => StatusCode::BAD_REQUEST,
            ScheduleError::Conflict(_) | ScheduleError::State(_) => StatusCode::CONFLICT,
            ScheduleError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ScheduleError::Authorization(_) => StatusCode::FORBIDDEN,
            ScheduleError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ScheduleError::Database(_) | ScheduleError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.0.to_string();

        if status.is_server_error() {
            error!("{} {}: {:?}", status.as_u16(), self.0.kind(), self.0);
        }

        let body = Json(json!({ "error": message, "kind": self.0.kind() }));
        (status, body).into_response()
    }
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        AppError(err)
    }
}

/// Infrastructure failures surface as database errors.
impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(ScheduleError::Database(err))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError(ScheduleError::Validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError(ScheduleError::Validation(rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError(ScheduleError::Validation(rejection.body_text()))
    }
}

/// Maps a ScheduleError to an HTTP response
pub fn map_error(err: ScheduleError) -> Response {
    AppError(err).into_response()
}
