//! The booking grid.
//!
//! A timetable is cut into fixed 30-minute slots anchored at its `from_time`.
//! Everything here is a pure function of its inputs so the same rules apply
//! to the HTTP fast path and to the checks the storage layer repeats inside
//! its transactions.

use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SubsecRound, Utc};

use crate::errors::{ScheduleError, ScheduleResult};

/// Length of one bookable slot.
pub const SLOT_MINUTES: i64 = 30;

/// Longest timetable that may be created (12 hours).
pub const MAX_TIMETABLE_MINUTES: i64 = 720;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y%m%dT%H%M%S%.f",
    "%Y%m%dT%H%M",
];

// `%#z` takes `+03`, `+0300` and `+03:00` alike.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M%#z",
    "%Y%m%dT%H%M%S%.f%#z",
    "%Y%m%dT%H%M%#z",
];

pub fn slot_length() -> Duration {
    Duration::minutes(SLOT_MINUTES)
}

/// Parses an ISO-8601 timestamp into a UTC instant truncated to seconds.
///
/// Values carrying an offset are converted to UTC; values without one are
/// taken to already be UTC. A bare date means midnight.
pub fn parse_instant(value: &str) -> ScheduleResult<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc).trunc_subsecs(0));
    }

    if let Some(parsed) = OFFSET_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(value, format).ok())
    {
        return Ok(parsed.with_timezone(&Utc).trunc_subsecs(0));
    }

    let naive = value
        .strip_suffix('Z')
        .or_else(|| value.strip_suffix('z'))
        .unwrap_or(value);

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(naive, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(naive, "%Y-%m-%d")
                .or_else(|_| NaiveDate::parse_from_str(naive, "%Y%m%d"))
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|parsed| parsed.and_utc().trunc_subsecs(0))
        .ok_or_else(|| {
            ScheduleError::Validation(format!("'{}' must be an ISO 8601 timestamp", value))
        })
}

/// Checks the timetable range invariants: non-empty, at most 12 hours, and a
/// whole number of slots long.
pub fn validate_range(from_time: DateTime<Utc>, to_time: DateTime<Utc>) -> ScheduleResult<()> {
    if from_time >= to_time {
        return Err(ScheduleError::Validation(
            "from_time must be earlier than to_time".to_string(),
        ));
    }

    let span = to_time - from_time;
    if span > Duration::minutes(MAX_TIMETABLE_MINUTES) {
        return Err(ScheduleError::Validation(format!(
            "Timetable may not be longer than {} minutes",
            MAX_TIMETABLE_MINUTES
        )));
    }

    if span.num_seconds() % slot_length().num_seconds() != 0 {
        return Err(ScheduleError::Validation(format!(
            "Timetable duration must be a multiple of {} minutes",
            SLOT_MINUTES
        )));
    }

    Ok(())
}

/// Half-open interval overlap: `[a_from, a_to)` and `[b_from, b_to)` share at
/// least one instant. Touching endpoints do not overlap.
pub fn ranges_overlap(
    a_from: DateTime<Utc>,
    a_to: DateTime<Utc>,
    b_from: DateTime<Utc>,
    b_to: DateTime<Utc>,
) -> bool {
    a_from < b_to && b_from < a_to
}

/// Every slot start in `[from_time, to_time)`, in order.
pub fn slot_grid(from_time: DateTime<Utc>, to_time: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    let mut slots = Vec::new();
    let mut current = from_time;
    while current < to_time {
        slots.push(current);
        current += slot_length();
    }
    slots
}

/// Grid points of `[from_time, to_time)` that nobody has booked yet.
pub fn free_slots(
    from_time: DateTime<Utc>,
    to_time: DateTime<Utc>,
    booked: &[DateTime<Utc>],
) -> Vec<DateTime<Utc>> {
    let booked: HashSet<_> = booked.iter().collect();
    slot_grid(from_time, to_time)
        .into_iter()
        .filter(|slot| !booked.contains(slot))
        .collect()
}

/// Whether `time` is the start of a slot in `[from_time, to_time)`.
pub fn is_grid_point(from_time: DateTime<Utc>, to_time: DateTime<Utc>, time: DateTime<Utc>) -> bool {
    if time < from_time || time >= to_time {
        return false;
    }
    let offset = time - from_time;
    offset == Duration::seconds(offset.num_seconds())
        && offset.num_seconds() % slot_length().num_seconds() == 0
}
