use crate::dlog;
use crate::error::{PersistenceError, StoreError};
use crate::ports::PersistenceStore;
use crate::store::{Snapshot, WorkoutRecord};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use std::path::Path;

/// Snapshot persisted as rows of a SQLite `workouts` table.
///
/// A missing table means nothing was saved; `clear` drops it.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, PersistenceError> {
        let conn = Connection::open(path)?;
        tracing::info!(path = %path.display(), "opened sqlite store");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, PersistenceError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }
}

impl PersistenceStore for SqliteStore {
    fn save(&mut self, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        let tx = self.conn.transaction()?;

        tx.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS workouts (
              position          INTEGER PRIMARY KEY,
              id                TEXT NOT NULL,
              created_at        TEXT NOT NULL,
              kind              TEXT NOT NULL,
              latitude          REAL NOT NULL,
              longitude         REAL NOT NULL,
              distance_km       REAL NOT NULL,
              duration_min      REAL NOT NULL,
              cadence_spm       REAL,
              elevation_gain_m  REAL
            );
            DELETE FROM workouts;
            ",
        )?;

        {
            let mut stmt = tx.prepare(
                r"
                INSERT INTO workouts (
                  position, id, created_at, kind,
                  latitude, longitude, distance_km, duration_min,
                  cadence_spm, elevation_gain_m
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                ",
            )?;

            for (position, r) in snapshot.records.iter().enumerate() {
                let position = i64::try_from(position).unwrap_or(i64::MAX);
                stmt.execute(params![
                    position,
                    r.id,
                    r.created_at_iso.to_rfc3339(),
                    r.kind,
                    r.latitude,
                    r.longitude,
                    r.distance_km,
                    r.duration_min,
                    r.cadence_spm,
                    r.elevation_gain_m,
                ])?;
            }
        }

        tx.commit()?;
        dlog!("sqlite snapshot saved records={}", snapshot.records.len());
        Ok(())
    }

    fn load(&mut self) -> Result<Option<Snapshot>, PersistenceError> {
        if !table_exists(&self.conn, "workouts")? {
            return Ok(None);
        }

        let mut stmt = self.conn.prepare(
            r"
            SELECT
              id, created_at, kind,
              latitude, longitude, distance_km, duration_min,
              cadence_spm, elevation_gain_m
            FROM workouts
            ORDER BY position ASC
            ",
        )?;
        let mut rows = stmt.query([])?;

        let mut snapshot = Snapshot::default();
        let mut position = 0;
        while let Some(row) = rows.next()? {
            let id: String = row.get(0)?;
            let created_raw: String = row.get(1)?;
            let created_at_iso = match DateTime::parse_from_rfc3339(&created_raw) {
                Ok(t) => t.with_timezone(&Utc),
                Err(e) => {
                    tracing::warn!(%id, err = %e, "skipping row with unreadable created_at");
                    snapshot.unreadable.push(StoreError::UnreadableRecord {
                        position,
                        reason: format!("workout {id}: {e}"),
                    });
                    position += 1;
                    continue;
                }
            };
            position += 1;

            snapshot.records.push(WorkoutRecord {
                id,
                created_at_iso,
                kind: row.get(2)?,
                latitude: row.get(3)?,
                longitude: row.get(4)?,
                distance_km: row.get(5)?,
                duration_min: row.get(6)?,
                cadence_spm: row.get(7)?,
                elevation_gain_m: row.get(8)?,
            });
        }

        Ok(Some(snapshot))
    }

    fn clear(&mut self) -> Result<(), PersistenceError> {
        self.conn.execute_batch("DROP TABLE IF EXISTS workouts;")?;
        Ok(())
    }
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool, PersistenceError> {
    let mut stmt =
        conn.prepare("SELECT 1 FROM sqlite_master WHERE type='table' AND name=?1 LIMIT 1")?;
    let mut rows = stmt.query([table])?;
    Ok(rows.next()?.is_some())
}
