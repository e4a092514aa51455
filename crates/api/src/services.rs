//! Domain operations behind the HTTP handlers.
//!
//! Each service checks the caller's role first, then runs its fast-path
//! validations and hands the write to the [`ScheduleStore`], which repeats
//! the checks that must hold under concurrency.
//!
//! [`ScheduleStore`]: clinic_schedule_db::store::ScheduleStore

pub mod booking;
pub mod conflict;
pub mod slots;
pub mod timetables;
