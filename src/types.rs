use crate::error::ValidationError;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    lat: f64,
    lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Result<Self, ValidationError> {
        let lat = finite("latitude", lat)?;
        let lng = finite("longitude", lng)?;
        if !(-90.0..=90.0).contains(&lat) {
            return Err(ValidationError::OutOfRange {
                field: "latitude",
                value: lat,
            });
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(ValidationError::OutOfRange {
                field: "longitude",
                value: lng,
            });
        }
        Ok(Self { lat, lng })
    }

    pub const fn lat(&self) -> f64 {
        self.lat
    }

    pub const fn lng(&self) -> f64 {
        self.lng
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5},{:.5}", self.lat, self.lng)
    }
}

/// Accepts `LAT,LON`, e.g. `48.8566,2.3522`.
impl FromStr for Coordinates {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lng) = s.split_once(',').ok_or(ValidationError::Missing {
            field: "longitude",
        })?;
        Self::new(parse_number("latitude", lat)?, parse_number("longitude", lng)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutKind {
    Running,
    Cycling,
}

impl WorkoutKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Cycling => "cycling",
        }
    }

    pub const fn icon(self) -> &'static str {
        match self {
            Self::Running => "🏃",
            Self::Cycling => "🚴‍♀️",
        }
    }
}

impl fmt::Display for WorkoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkoutKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "running" => Ok(Self::Running),
            "cycling" => Ok(Self::Cycling),
            _ => Err(ValidationError::UnknownKind(s.to_string())),
        }
    }
}

/// Activity-specific input plus its derived metric, computed once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Activity {
    Running {
        cadence_spm: f64,
        pace_min_per_km: f64,
    },
    Cycling {
        elevation_gain_m: f64,
        speed_km_per_h: f64,
    },
}

impl Activity {
    pub const fn kind(&self) -> WorkoutKind {
        match self {
            Self::Running { .. } => WorkoutKind::Running,
            Self::Cycling { .. } => WorkoutKind::Cycling,
        }
    }
}

/// One exercise session. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Workout {
    id: String,
    created_at: DateTime<Utc>,
    coordinates: Coordinates,
    distance_km: f64,
    duration_min: f64,
    activity: Activity,
    description: String,
}

impl Workout {
    /// Builds the variant named by `kind`. `specific` is the cadence for
    /// running and the elevation gain for cycling.
    pub fn new(
        kind: WorkoutKind,
        coordinates: Coordinates,
        distance_km: f64,
        duration_min: f64,
        specific: f64,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        match kind {
            WorkoutKind::Running => {
                Self::running(coordinates, distance_km, duration_min, specific, created_at)
            }
            WorkoutKind::Cycling => {
                Self::cycling(coordinates, distance_km, duration_min, specific, created_at)
            }
        }
    }

    pub fn running(
        coordinates: Coordinates,
        distance_km: f64,
        duration_min: f64,
        cadence_spm: f64,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let distance_km = positive("distance", distance_km)?;
        let duration_min = positive("duration", duration_min)?;
        let cadence_spm = positive("cadence", cadence_spm)?;

        let activity = Activity::Running {
            cadence_spm,
            pace_min_per_km: duration_min / distance_km,
        };
        Ok(Self::assemble(
            coordinates,
            distance_km,
            duration_min,
            activity,
            created_at,
        ))
    }

    /// Elevation gain may be zero or negative (net downhill).
    pub fn cycling(
        coordinates: Coordinates,
        distance_km: f64,
        duration_min: f64,
        elevation_gain_m: f64,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let distance_km = positive("distance", distance_km)?;
        let duration_min = positive("duration", duration_min)?;
        let elevation_gain_m = finite("elevation", elevation_gain_m)?;

        let activity = Activity::Cycling {
            elevation_gain_m,
            speed_km_per_h: distance_km / (duration_min / 60.0),
        };
        Ok(Self::assemble(
            coordinates,
            distance_km,
            duration_min,
            activity,
            created_at,
        ))
    }

    fn assemble(
        coordinates: Coordinates,
        distance_km: f64,
        duration_min: f64,
        activity: Activity,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id_from_timestamp(created_at),
            description: describe(activity.kind(), created_at),
            created_at,
            coordinates,
            distance_km,
            duration_min,
            activity,
        }
    }

    /// Same as the constructors but keeps a previously minted id.
    pub(crate) fn with_id(mut self, id: String) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub const fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    pub const fn distance_km(&self) -> f64 {
        self.distance_km
    }

    pub const fn duration_min(&self) -> f64 {
        self.duration_min
    }

    pub const fn activity(&self) -> &Activity {
        &self.activity
    }

    pub const fn kind(&self) -> WorkoutKind {
        self.activity.kind()
    }

    pub fn describe(&self) -> &str {
        &self.description
    }

    /// Minutes per km, running only.
    pub const fn pace(&self) -> Option<f64> {
        match self.activity {
            Activity::Running {
                pace_min_per_km, ..
            } => Some(pace_min_per_km),
            Activity::Cycling { .. } => None,
        }
    }

    /// km/h, cycling only.
    pub const fn speed(&self) -> Option<f64> {
        match self.activity {
            Activity::Cycling { speed_km_per_h, .. } => Some(speed_km_per_h),
            Activity::Running { .. } => None,
        }
    }

    pub fn marker_label(&self) -> String {
        format!("{} {}", self.kind().icon(), self.description)
    }
}

/// What a list entry shows for one workout.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutSummary {
    pub id: String,
    pub kind: WorkoutKind,
    pub title: String,
    pub distance_km: f64,
    pub duration_min: f64,
    pub metric: f64,
    pub metric_unit: &'static str,
    pub detail: f64,
    pub detail_unit: &'static str,
}

impl From<&Workout> for WorkoutSummary {
    fn from(w: &Workout) -> Self {
        let (metric, metric_unit, detail, detail_unit) = match *w.activity() {
            Activity::Running {
                cadence_spm,
                pace_min_per_km,
            } => (pace_min_per_km, "min/km", cadence_spm, "spm"),
            Activity::Cycling {
                elevation_gain_m,
                speed_km_per_h,
            } => (speed_km_per_h, "km/h", elevation_gain_m, "m"),
        };

        Self {
            id: w.id().to_string(),
            kind: w.kind(),
            title: w.describe().to_string(),
            distance_km: w.distance_km(),
            duration_min: w.duration_min(),
            metric,
            metric_unit,
            detail,
            detail_unit,
        }
    }
}

impl fmt::Display for WorkoutSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}  {} km  {} min  {:.1} {}  {} {}",
            self.id,
            self.kind.icon(),
            self.title,
            self.distance_km,
            self.duration_min,
            self.metric,
            self.metric_unit,
            self.detail,
            self.detail_unit
        )
    }
}

/// Text typed into the workout form, before parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFields {
    pub distance: String,
    pub duration: String,
    pub cadence: String,
    pub elevation: String,
}

impl RawFields {
    /// Returns `(distance_km, duration_min, activity-specific field)` for `kind`.
    /// Fields that belong to the other kind are ignored.
    pub fn parse(&self, kind: WorkoutKind) -> Result<(f64, f64, f64), ValidationError> {
        let distance = parse_number("distance", &self.distance)?;
        let duration = parse_number("duration", &self.duration)?;
        let specific = match kind {
            WorkoutKind::Running => parse_number("cadence", &self.cadence)?,
            WorkoutKind::Cycling => parse_number("elevation", &self.elevation)?,
        };
        Ok((distance, duration, specific))
    }
}

fn parse_number(field: &'static str, raw: &str) -> Result<f64, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::Missing { field });
    }
    raw.parse::<f64>()
        .map_err(|_| ValidationError::NotANumber {
            field,
            raw: raw.to_string(),
        })
}

fn finite(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValidationError::NotFinite { field })
    }
}

fn positive(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    let value = finite(field, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(ValidationError::NotPositive { field, value })
    }
}

/// Last 10 digits of the epoch milliseconds.
fn id_from_timestamp(created_at: DateTime<Utc>) -> String {
    let ms = created_at.timestamp_millis().to_string();
    ms[ms.len().saturating_sub(10)..].to_string()
}

/// Month and day are taken in the local time zone, as the user saw the clock.
fn describe(kind: WorkoutKind, created_at: DateTime<Utc>) -> String {
    let local = created_at.with_timezone(&Local);
    format!("{kind} on {}", local.format("%B %-d"))
}
