//! # Clinic Schedule Core
//!
//! Domain types shared by every crate of the scheduling service: timetables
//! and appointments, the error taxonomy, the 30-minute slot grid, the typed
//! caller identity with its role policy, and the directory gateway seam.

pub mod auth;
pub mod directory;
pub mod errors;
pub mod grid;
pub mod mock;
pub mod models;
