use crate::models::DbTimetable;
use chrono::{DateTime, Utc};
use clinic_schedule_core::models::timetable::{NewTimetable, TimetableScope};
use eyre::Result;
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

const TIMETABLE_COLUMNS: &str = "id, hospital_id, doctor_id, room, from_time, to_time, created_at";

pub async fn create_timetable(conn: &mut PgConnection, timetable: &NewTimetable) -> Result<DbTimetable> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    tracing::debug!(
        "Creating timetable: id={}, hospital_id={}, room={}, from={}, to={}",
        id, timetable.hospital_id, timetable.room, timetable.from_time, timetable.to_time
    );

    let created = sqlx::query_as::<_, DbTimetable>(
        r#"
        INSERT INTO timetables (id, hospital_id, doctor_id, room, from_time, to_time, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, hospital_id, doctor_id, room, from_time, to_time, created_at
        "#,
    )
    .bind(id)
    .bind(timetable.hospital_id)
    .bind(timetable.doctor_id)
    .bind(&timetable.room)
    .bind(timetable.from_time)
    .bind(timetable.to_time)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    Ok(created)
}

pub async fn get_timetable_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbTimetable>> {
    let timetable = sqlx::query_as::<_, DbTimetable>(&format!(
        "SELECT {} FROM timetables WHERE id = $1",
        TIMETABLE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(timetable)
}

/// Loads a timetable and takes a row lock on it for the rest of the
/// transaction. `exclusive` selects `FOR UPDATE` over `FOR SHARE`.
pub async fn lock_timetable(
    conn: &mut PgConnection,
    id: Uuid,
    exclusive: bool,
) -> Result<Option<DbTimetable>> {
    let lock = if exclusive { "FOR UPDATE" } else { "FOR SHARE" };

    let timetable = sqlx::query_as::<_, DbTimetable>(&format!(
        "SELECT {} FROM timetables WHERE id = $1 {}",
        TIMETABLE_COLUMNS, lock
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(timetable)
}

/// Serializes writers of one hospital room until the transaction ends.
pub async fn lock_room(conn: &mut PgConnection, hospital_id: i64, room: &str) -> Result<()> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
        .bind(format!("timetable-room:{}:{}", hospital_id, room))
        .execute(&mut *conn)
        .await?;

    Ok(())
}

pub async fn has_conflict(
    conn: &mut PgConnection,
    hospital_id: i64,
    room: &str,
    from_time: DateTime<Utc>,
    to_time: DateTime<Utc>,
    excluding: Option<Uuid>,
) -> Result<bool> {
    let conflict = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM timetables
            WHERE hospital_id = $1
              AND room = $2
              AND from_time < $4
              AND to_time > $3
              AND ($5::uuid IS NULL OR id <> $5)
        )
        "#,
    )
    .bind(hospital_id)
    .bind(room)
    .bind(from_time)
    .bind(to_time)
    .bind(excluding)
    .fetch_one(&mut *conn)
    .await?;

    Ok(conflict)
}

pub async fn update_timetable(
    conn: &mut PgConnection,
    id: Uuid,
    timetable: &NewTimetable,
) -> Result<DbTimetable> {
    let updated = sqlx::query_as::<_, DbTimetable>(
        r#"
        UPDATE timetables
        SET hospital_id = $2, doctor_id = $3, room = $4, from_time = $5, to_time = $6
        WHERE id = $1
        RETURNING id, hospital_id, doctor_id, room, from_time, to_time, created_at
        "#,
    )
    .bind(id)
    .bind(timetable.hospital_id)
    .bind(timetable.doctor_id)
    .bind(&timetable.room)
    .bind(timetable.from_time)
    .bind(timetable.to_time)
    .fetch_one(&mut *conn)
    .await?;

    Ok(updated)
}

pub async fn delete_timetable(pool: &Pool<Postgres>, id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM timetables WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn delete_timetables_by_doctor(pool: &Pool<Postgres>, doctor_id: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM timetables WHERE doctor_id = $1")
        .bind(doctor_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn delete_timetables_by_hospital(pool: &Pool<Postgres>, hospital_id: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM timetables WHERE hospital_id = $1")
        .bind(hospital_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Timetables of `scope` lying entirely inside `[from_time, to_time]`.
pub async fn find_timetables(
    pool: &Pool<Postgres>,
    scope: &TimetableScope,
    from_time: DateTime<Utc>,
    to_time: DateTime<Utc>,
) -> Result<Vec<DbTimetable>> {
    let (hospital_id, doctor_id, room) = match scope {
        TimetableScope::Hospital(hospital_id) => (Some(*hospital_id), None, None),
        TimetableScope::Doctor(doctor_id) => (None, Some(*doctor_id), None),
        TimetableScope::Room { hospital_id, room } => (Some(*hospital_id), None, Some(room.as_str())),
    };

    let timetables = sqlx::query_as::<_, DbTimetable>(
        r#"
        SELECT id, hospital_id, doctor_id, room, from_time, to_time, created_at
        FROM timetables
        WHERE ($1::bigint IS NULL OR hospital_id = $1)
          AND ($2::bigint IS NULL OR doctor_id = $2)
          AND ($3::text IS NULL OR room = $3)
          AND from_time >= $4
          AND to_time <= $5
        ORDER BY from_time ASC, room ASC
        "#,
    )
    .bind(hospital_id)
    .bind(doctor_id)
    .bind(room)
    .bind(from_time)
    .bind(to_time)
    .fetch_all(pool)
    .await?;

    Ok(timetables)
}
