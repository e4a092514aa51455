use crate::models::DbAppointment;
use chrono::{DateTime, Utc};
use eyre::Result;
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

pub async fn create_appointment(
    conn: &mut PgConnection,
    timetable_id: Uuid,
    username: &str,
    time: DateTime<Utc>,
) -> Result<DbAppointment> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let appointment = sqlx::query_as::<_, DbAppointment>(
        r#"
        INSERT INTO appointments (id, timetable_id, username, time, created_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, timetable_id, username, time, created_at
        "#,
    )
    .bind(id)
    .bind(timetable_id)
    .bind(username)
    .bind(time)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    Ok(appointment)
}

pub async fn get_appointment_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbAppointment>> {
    let appointment = sqlx::query_as::<_, DbAppointment>(
        r#"
        SELECT id, timetable_id, username, time, created_at
        FROM appointments
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(appointment)
}

pub async fn get_appointments_by_timetable_ids(
    pool: &Pool<Postgres>,
    timetable_ids: &[Uuid],
) -> Result<Vec<DbAppointment>> {
    let appointments = sqlx::query_as::<_, DbAppointment>(
        r#"
        SELECT id, timetable_id, username, time, created_at
        FROM appointments
        WHERE timetable_id = ANY($1)
        ORDER BY time ASC
        "#,
    )
    .bind(timetable_ids)
    .fetch_all(pool)
    .await?;

    Ok(appointments)
}

pub async fn count_appointments(conn: &mut PgConnection, timetable_id: Uuid) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM appointments WHERE timetable_id = $1",
    )
    .bind(timetable_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(count)
}

pub async fn delete_appointment(pool: &Pool<Postgres>, id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM appointments WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
