pub mod appointment;
pub mod timetable;
