use axum::{routing::get, Router};
use std::sync::Arc;

use super::route_with_slash;
use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    route_with_slash(
        Router::new(),
        "/api/Appointment/:id",
        get(handlers::appointment::get_appointment).delete(handlers::appointment::cancel_appointment),
    )
}
