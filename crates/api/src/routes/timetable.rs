use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::route_with_slash;
use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    let router = Router::new();
    let router = route_with_slash(
        router,
        "/api/Timetable",
        post(handlers::timetable::create_timetable),
    );
    let router = route_with_slash(
        router,
        "/api/Timetable/:id",
        get(handlers::timetable::get_timetable)
            .put(handlers::timetable::update_timetable)
            .delete(handlers::timetable::delete_timetable),
    );
    let router = route_with_slash(
        router,
        "/api/Timetable/Doctor/:doctor_id",
        get(handlers::timetable::doctor_timetables)
            .delete(handlers::timetable::delete_doctor_timetables),
    );
    let router = route_with_slash(
        router,
        "/api/Timetable/Hospital/:hospital_id",
        get(handlers::timetable::hospital_timetables)
            .delete(handlers::timetable::delete_hospital_timetables),
    );
    let router = route_with_slash(
        router,
        "/api/Timetable/Hospital/:hospital_id/Room/:room",
        get(handlers::timetable::room_timetables),
    );
    route_with_slash(
        router,
        "/api/Timetable/:id/Appointments",
        get(handlers::timetable::available_slots).post(handlers::timetable::book_appointment),
    )
}
