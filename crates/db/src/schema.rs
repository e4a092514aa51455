use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    // Hospital and doctor ids belong to other services, so they carry no
    // foreign keys here.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS timetables (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            hospital_id BIGINT NOT NULL,
            doctor_id BIGINT NOT NULL,
            room VARCHAR(255) NOT NULL,
            from_time TIMESTAMP WITH TIME ZONE NOT NULL,
            to_time TIMESTAMP WITH TIME ZONE NOT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_time_range CHECK (to_time > from_time)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // One appointment per slot. Booking relies on this constraint, not on the
    // availability read that precedes the insert.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS appointments (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            timetable_id UUID NOT NULL REFERENCES timetables(id) ON DELETE CASCADE,
            username VARCHAR(255) NOT NULL,
            time TIMESTAMP WITH TIME ZONE NOT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT appointments_timetable_time_key UNIQUE (timetable_id, time)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes
    for statement in [
        "CREATE INDEX IF NOT EXISTS idx_timetables_hospital_room ON timetables(hospital_id, room)",
        "CREATE INDEX IF NOT EXISTS idx_timetables_doctor_id ON timetables(doctor_id)",
        "CREATE INDEX IF NOT EXISTS idx_timetables_from_time ON timetables(from_time)",
        "CREATE INDEX IF NOT EXISTS idx_appointments_timetable_id ON appointments(timetable_id)",
        "CREATE INDEX IF NOT EXISTS idx_appointments_username ON appointments(username)",
    ] {
        sqlx::query(statement).execute(pool).await?;
    }

    info!("Database schema initialized successfully.");
    Ok(())
}
