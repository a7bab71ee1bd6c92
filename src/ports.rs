//! Collaborators the controller talks to.
//!
//! Presentation and platform code implements these; the controller only
//! requests side effects through them. Events flowing the other way (map
//! clicks, form submits, list clicks) are delivered as
//! [`crate::controller::Event`] values.

use crate::error::{LocationError, PersistenceError};
use crate::store::Snapshot;
use crate::types::{Coordinates, WorkoutKind, WorkoutSummary};
use chrono::{DateTime, Utc};

/// Single-shot source of the starting location. Consumed by the call.
pub trait LocationProvider {
    fn current_position(self) -> Result<Coordinates, LocationError>;
}

impl<F> LocationProvider for F
where
    F: FnOnce() -> Result<Coordinates, LocationError>,
{
    fn current_position(self) -> Result<Coordinates, LocationError> {
        self()
    }
}

pub trait MapView {
    fn center_on(&mut self, coordinates: Coordinates, zoom_level: f64);

    fn place_marker(&mut self, coordinates: Coordinates, label: &str);
}

pub trait ListView {
    fn append_entry(&mut self, summary: &WorkoutSummary);
}

pub trait FormView {
    fn show(&mut self);

    fn hide(&mut self);

    fn clear(&mut self);

    /// Swap between the cadence and elevation inputs.
    fn show_fields_for(&mut self, kind: WorkoutKind);
}

/// Where snapshots live between sessions.
pub trait PersistenceStore {
    fn save(&mut self, snapshot: &Snapshot) -> Result<(), PersistenceError>;

    /// `Ok(None)` when nothing was ever saved (or it was cleared).
    fn load(&mut self) -> Result<Option<Snapshot>, PersistenceError>;

    fn clear(&mut self) -> Result<(), PersistenceError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// The hosting application: user-visible alerts and restart.
pub trait AppShell {
    fn alert(&mut self, severity: Severity, message: &str);

    fn reload(&mut self);
}

/// Everything a [`crate::controller::WorkoutController`] drives.
pub struct Collaborators {
    pub map: Box<dyn MapView>,
    pub list: Box<dyn ListView>,
    pub form: Box<dyn FormView>,
    pub storage: Box<dyn PersistenceStore>,
    pub shell: Box<dyn AppShell>,
}

/// Source of creation timestamps (and therefore workout ids).
pub trait Clock {
    fn now(&mut self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&mut self) -> DateTime<Utc> {
        Utc::now()
    }
}
