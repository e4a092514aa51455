//! # Clinic Schedule API
//!
//! The HTTP surface of the timetable and appointment service.
//!
//! ## Architecture
//!
//! - **Routes**: URL structure, one module per resource
//! - **Handlers**: Extract the request, call a service, shape the response
//! - **Services**: Authorization, directory checks and the scheduling rules
//! - **Middleware**: Bearer authentication and error-to-response mapping
//! - **Config**: Environment configuration
//!
//! Storage and the account/hospital directory are injected as trait objects,
//! so the same router runs against Postgres in production and against the
//! in-memory store in tests.

/// Configuration module for API settings
pub mod config;
/// Extractors that reject through `AppError`
pub mod extract;
/// Request handlers
pub mod handlers;
/// Authentication extractor and error mapping
pub mod middleware;
/// Route definitions and API endpoint structure
pub mod routes;
/// Scheduling services used by the handlers
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    error_handling::HandleErrorLayer,
    http::{header, HeaderValue, Method, StatusCode},
    BoxError, Router,
};
use clinic_schedule_core::directory::DirectoryGateway;
use clinic_schedule_db::store::ScheduleStore;
use eyre::Result;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use services::{
    booking::BookingEngine, slots::SlotGenerator, timetables::TimetableService,
};

/// Shared application state that is accessible to all request handlers
pub struct ApiState {
    pub timetables: TimetableService,
    pub slots: SlotGenerator,
    pub booking: BookingEngine,
    /// Used by the authentication extractor for token introspection
    pub directory: Arc<dyn DirectoryGateway>,
}

impl ApiState {
    /// Wires the services around one store and one directory gateway.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use clinic_schedule_api::ApiState;
    /// use clinic_schedule_core::mock::MockDirectory;
    /// use clinic_schedule_db::memory::MemoryScheduleStore;
    ///
    /// let state = ApiState::new(
    ///     Arc::new(MemoryScheduleStore::new()),
    ///     Arc::new(MockDirectory::new()),
    /// );
    /// let app = clinic_schedule_api::router(Arc::new(state));
    /// ```
    pub fn new(store: Arc<dyn ScheduleStore>, directory: Arc<dyn DirectoryGateway>) -> Self {
        let slots = SlotGenerator::new(Arc::clone(&store));
        Self {
            timetables: TimetableService::new(Arc::clone(&store), Arc::clone(&directory)),
            booking: BookingEngine::new(store, slots.clone()),
            slots,
            directory,
        }
    }
}

/// Builds the application router with all routes attached.
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        // Banner, health and version
        .merge(routes::health::routes())
        // Timetables, slots and booking
        .merge(routes::timetable::routes())
        // Single appointments
        .merge(routes::appointment::routes())
        .with_state(state)
}

/// Starts the API server
///
/// Installs the tracing subscriber, applies CORS and the request timeout, and
/// serves until the listener fails.
pub async fn start_server(config: config::ApiConfig, state: ApiState) -> Result<()> {
    // Initialize tracing for logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let app = router(Arc::new(state)).layer(TraceLayer::new_for_http());

    // Apply CORS configuration if origins are specified
    let app = if let Some(origins) = &config.cors_origins {
        let origins = origins
            .iter()
            .map(|origin| origin.parse::<HeaderValue>())
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let cors = CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
            .allow_origin(origins)
            .allow_credentials(true);

        app.layer(cors)
    } else {
        app
    };

    // Dropping the handler future on timeout rolls back any open transaction.
    let app = app.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(|_: BoxError| async { StatusCode::REQUEST_TIMEOUT }))
            .timeout(Duration::from_secs(config.request_timeout)),
    );

    // Start the HTTP server
    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
