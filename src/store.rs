use crate::error::{PersistenceError, StoreError, ValidationError};
use crate::ports::PersistenceStore;
use crate::types::{Activity, Coordinates, Workout, WorkoutKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Flat persisted form of one workout. `kind` selects the variant on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutRecord {
    pub id: String,
    #[serde(rename = "createdAtISO")]
    pub created_at_iso: DateTime<Utc>,
    pub kind: String,
    pub latitude: f64,
    pub longitude: f64,
    pub distance_km: f64,
    pub duration_min: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cadence_spm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation_gain_m: Option<f64>,
}

impl From<&Workout> for WorkoutRecord {
    fn from(w: &Workout) -> Self {
        let (cadence_spm, elevation_gain_m) = match *w.activity() {
            Activity::Running { cadence_spm, .. } => (Some(cadence_spm), None),
            Activity::Cycling {
                elevation_gain_m, ..
            } => (None, Some(elevation_gain_m)),
        };
        Self {
            id: w.id().to_string(),
            created_at_iso: w.created_at(),
            kind: w.kind().as_str().to_string(),
            latitude: w.coordinates().lat(),
            longitude: w.coordinates().lng(),
            distance_km: w.distance_km(),
            duration_min: w.duration_min(),
            cadence_spm,
            elevation_gain_m,
        }
    }
}

impl TryFrom<&WorkoutRecord> for Workout {
    type Error = ValidationError;

    fn try_from(r: &WorkoutRecord) -> Result<Self, Self::Error> {
        let kind: WorkoutKind = r.kind.parse()?;
        let coordinates = Coordinates::new(r.latitude, r.longitude)?;
        let specific = match kind {
            WorkoutKind::Running => r
                .cadence_spm
                .ok_or(ValidationError::Missing { field: "cadence" })?,
            WorkoutKind::Cycling => r
                .elevation_gain_m
                .ok_or(ValidationError::Missing { field: "elevation" })?,
        };
        let workout = Self::new(
            kind,
            coordinates,
            r.distance_km,
            r.duration_min,
            specific,
            r.created_at_iso,
        )?;
        Ok(workout.with_id(r.id.clone()))
    }
}

/// Ordered sequence of records, the shape handed to a [`PersistenceStore`].
///
/// Entries a backend could not even read as a record land in `unreadable`
/// and are never written back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub records: Vec<WorkoutRecord>,
    pub unreadable: Vec<StoreError>,
}

impl Snapshot {
    pub const fn new(records: Vec<WorkoutRecord>) -> Self {
        Self {
            records,
            unreadable: Vec::new(),
        }
    }

    pub fn to_json(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string_pretty(&self.records)?)
    }

    /// Only a document that is not a JSON array is malformed as a whole;
    /// a broken element costs just that element.
    pub fn from_json(raw: &str) -> Result<Self, PersistenceError> {
        let entries: Vec<serde_json::Value> =
            serde_json::from_str(raw).map_err(|e| PersistenceError::Malformed(e.to_string()))?;

        let mut snapshot = Self::default();
        for (position, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<WorkoutRecord>(entry) {
                Ok(record) => snapshot.records.push(record),
                Err(e) => {
                    tracing::warn!(position, err = %e, "skipping unreadable snapshot entry");
                    snapshot.unreadable.push(StoreError::UnreadableRecord {
                        position,
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(snapshot)
    }
}

/// In-memory workouts, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct WorkoutStore {
    workouts: Vec<Workout>,
}

impl WorkoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends without checking ids; freshly minted ids are taken as unique.
    pub fn add(&mut self, workout: Workout) {
        self.workouts.push(workout);
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Workout> {
        self.workouts.iter().find(|w| w.id() == id)
    }

    pub fn all(&self) -> &[Workout] {
        &self.workouts
    }

    pub fn len(&self) -> usize {
        self.workouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workouts.is_empty()
    }

    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot::new(self.workouts.iter().map(WorkoutRecord::from).collect())
    }

    /// Rebuilds each record as its proper variant. Records that repeat an
    /// earlier id or fail validation are dropped and reported along with
    /// the snapshot's unreadable entries; the rest load.
    pub fn from_snapshot(snapshot: &Snapshot) -> (Self, Vec<StoreError>) {
        let mut store = Self::new();
        let mut rejected = snapshot.unreadable.clone();
        let mut seen: HashSet<&str> = HashSet::with_capacity(snapshot.records.len());

        for record in &snapshot.records {
            if !seen.insert(record.id.as_str()) {
                tracing::warn!(id = %record.id, "dropping duplicate workout id from snapshot");
                rejected.push(StoreError::DuplicateId(record.id.clone()));
                continue;
            }

            match Workout::try_from(record) {
                Ok(w) => store.add(w),
                Err(source) => {
                    tracing::warn!(id = %record.id, err = %source, "dropping invalid snapshot record");
                    rejected.push(StoreError::InvalidRecord {
                        id: record.id.clone(),
                        source,
                    });
                }
            }
        }

        crate::dlog!(
            "snapshot loaded records={} kept={} rejected={}",
            snapshot.records.len(),
            store.len(),
            rejected.len()
        );
        (store, rejected)
    }

    /// Empties the collection and deletes the persisted snapshot.
    pub fn reset(&mut self, storage: &mut dyn PersistenceStore) -> Result<(), PersistenceError> {
        self.workouts.clear();
        storage.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::TimeZone;

    fn at(sec: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 14, 9, 30, sec).unwrap()
    }

    fn sample() -> WorkoutStore {
        let here = Coordinates::new(10.0, 20.0).unwrap();
        let mut store = WorkoutStore::new();
        store.add(Workout::running(here, 5.0, 25.0, 180.0, at(1)).unwrap());
        store.add(Workout::cycling(here, 20.0, 60.0, 150.0, at(2)).unwrap());
        store.add(Workout::running(here, 3.3, 19.1, 172.0, at(3)).unwrap());
        store
    }

    #[test]
    fn find_by_id_returns_none_for_unknown_ids() {
        let store = sample();
        let first = store.all()[0].id().to_string();
        assert_eq!(store.find_by_id(&first).map(Workout::kind), Some(WorkoutKind::Running));
        assert!(store.find_by_id("0000000000").is_none());
    }

    #[test]
    fn snapshot_round_trip_keeps_order_kinds_and_metrics() {
        let store = sample();
        let json = store.to_snapshot().to_json().unwrap();
        let (back, rejected) = WorkoutStore::from_snapshot(&Snapshot::from_json(&json).unwrap());

        assert!(rejected.is_empty());
        assert_eq!(back.all(), store.all());
        assert_eq!(back.all()[1].speed(), Some(20.0));
        assert_eq!(back.all()[0].pace(), Some(5.0));
    }

    #[test]
    fn record_fields_use_the_persisted_names() {
        let json = sample().to_snapshot().to_json().unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        let first = &v[0];
        assert_eq!(first["kind"], "running");
        assert_eq!(first["cadenceSpm"], 180.0);
        assert!(first.get("elevationGainM").is_none());
        assert!(first["createdAtISO"].as_str().unwrap().starts_with("2024-04-14T09:30:01"));
        assert_eq!(v[1]["elevationGainM"], 150.0);
    }

    #[test]
    fn duplicate_ids_are_dropped_and_reported() {
        let mut snapshot = sample().to_snapshot();
        let mut dup = snapshot.records[0].clone();
        dup.distance_km = 99.0;
        snapshot.records.insert(1, dup);

        let (store, rejected) = WorkoutStore::from_snapshot(&snapshot);
        assert_eq!(store.len(), 3);
        assert_eq!(store.all()[0].distance_km(), 5.0);
        assert_eq!(
            rejected,
            vec![StoreError::DuplicateId(snapshot.records[0].id.clone())]
        );
    }

    #[test]
    fn invalid_records_are_skipped() {
        let mut snapshot = sample().to_snapshot();
        snapshot.records[0].kind = "swimming".into();
        snapshot.records[1].elevation_gain_m = None;

        let (store, rejected) = WorkoutStore::from_snapshot(&snapshot);
        assert_eq!(store.len(), 1);
        assert_eq!(rejected.len(), 2);
    }

    #[test]
    fn malformed_json_is_reported_as_malformed() {
        assert!(matches!(
            Snapshot::from_json("{not json"),
            Err(PersistenceError::Malformed(_))
        ));
        assert!(matches!(
            Snapshot::from_json(r#"{"id": "1"}"#),
            Err(PersistenceError::Malformed(_))
        ));
    }

    #[test]
    fn a_structurally_broken_entry_costs_only_itself() {
        let json = sample().to_snapshot().to_json().unwrap();
        let mut v: serde_json::Value = serde_json::from_str(&json).unwrap();
        v[1]["durationMin"] = serde_json::Value::Null;

        let snapshot = Snapshot::from_json(&v.to_string()).unwrap();
        assert_eq!(snapshot.records.len(), 2);
        assert!(matches!(
            snapshot.unreadable.as_slice(),
            [StoreError::UnreadableRecord { position: 1, .. }]
        ));

        let (store, rejected) = WorkoutStore::from_snapshot(&snapshot);
        assert_eq!(store.len(), 2);
        assert_eq!(store.all()[1].distance_km(), 3.3);
        assert_eq!(rejected.len(), 1);

        let rewritten: serde_json::Value =
            serde_json::from_str(&store.to_snapshot().to_json().unwrap()).unwrap();
        assert_eq!(rewritten.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn reset_clears_memory_and_storage() {
        let mut store = sample();
        let mut storage = MemoryStore::default();
        storage.save(&store.to_snapshot()).unwrap();

        store.reset(&mut storage).unwrap();
        assert!(store.is_empty());
        assert!(storage.load().unwrap().is_none());
    }
}
