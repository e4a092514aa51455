use std::sync::Arc;

use clinic_schedule_api::{config::ApiConfig, ApiState};
use clinic_schedule_db::{create_pool, postgres::PgScheduleStore, schema::initialize_database};
use clinic_schedule_directory::{config::DirectoryConfig, HttpDirectory};
use color_eyre::eyre::Result;
use dotenv::dotenv;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Load environment variables
    dotenv().ok();

    // Load configuration
    let config = ApiConfig::from_env()?;
    let directory_config = DirectoryConfig::from_env()?;

    // Create database connection pool
    let db_pool = create_pool(&config.database_url, config.database_max_connections).await?;

    // Initialize database schema
    initialize_database(&db_pool).await?;

    // Wire storage and the account/hospital directory into the services
    let store = Arc::new(PgScheduleStore::new(db_pool));
    let directory = Arc::new(HttpDirectory::new(directory_config)?);
    let state = ApiState::new(store, directory);

    // Start API server
    clinic_schedule_api::start_server(config, state).await?;

    Ok(())
}
