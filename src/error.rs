//! Error taxonomy for the workout core.
//!
//! None of these are fatal: each one degrades a feature and the session goes on.

use thiserror::Error;

/// Bad or missing numeric input. Recovered locally, the store is untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} is missing")]
    Missing { field: &'static str },

    #[error("{field} is not a number: {raw:?}")]
    NotANumber { field: &'static str, raw: String },

    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("{field} must be positive (got {value})")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{field} out of range (got {value})")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("unknown workout kind: {0:?}")]
    UnknownKind(String),
}

/// The starting location could not be obtained.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    #[error("location unavailable: {0}")]
    Unavailable(String),

    #[error("location permission denied")]
    PermissionDenied,
}

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("malformed snapshot: {0}")]
    Malformed(String),

    #[error("encoding snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Snapshot integrity problems found while rebuilding a store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("duplicate workout id {0} in snapshot")]
    DuplicateId(String),

    #[error("invalid snapshot record {id}: {source}")]
    InvalidRecord {
        id: String,
        #[source]
        source: ValidationError,
    },

    #[error("unreadable snapshot entry #{position}: {reason}")]
    UnreadableRecord { position: usize, reason: String },
}

#[derive(Error, Debug)]
pub enum ControllerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("workout creation is disabled until a location is available")]
    CreationDisabled,

    #[error("no location chosen for the new workout")]
    NotAwaitingInput,

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
