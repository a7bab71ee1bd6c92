//! Geotagged workout log: running and cycling sessions picked on a map,
//! kept across sessions.
//!
//! [`controller::WorkoutController`] is the entry point. It owns a
//! [`store::WorkoutStore`] and drives the collaborators in [`ports`].

pub mod cli;
pub mod controller;
pub mod database;
pub mod error;
pub mod gpx;
pub mod ports;
pub mod storage;
pub mod store;
pub mod term;
pub mod types;
pub mod utils;
