pub mod appointment;
pub mod health;
pub mod timetable;

use axum::{routing::MethodRouter, Router};
use std::sync::Arc;

use crate::ApiState;

/// Mounts `method_router` at `path` and at `path/`; clients use both forms.
fn route_with_slash(
    router: Router<Arc<ApiState>>,
    path: &str,
    method_router: MethodRouter<Arc<ApiState>>,
) -> Router<Arc<ApiState>> {
    router
        .route(&format!("{}/", path), method_router.clone())
        .route(path, method_router)
}
