//! SQLite output backend (feature `sqlite`).
//!
//! Creates a single `output.db` file in the configured output directory with
//! one table per CSV stream: `trajectory`, `time_dependence`, `decays`,
//! `carrier_energy`, `occupation` and `jump_lengths`.

use std::path::Path;

use rusqlite::Connection;

use crate::writer::OutputWriter;
use crate::{DecayRow, EnergyRow, JumpLengthRow, OccupationRow, OutputResult, TimeDependenceRow, TrajectoryRow};

/// Writes run output to an SQLite database.
pub struct SqliteWriter {
    conn:     Connection,
    finished: bool,
}

impl SqliteWriter {
    /// Open (or create) `output.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let conn = Connection::open(dir.join("output.db"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS trajectory (
                 time    REAL    NOT NULL,
                 step    INTEGER NOT NULL,
                 carrier INTEGER NOT NULL,
                 x       REAL    NOT NULL,
                 y       REAL    NOT NULL,
                 z       REAL    NOT NULL
             );
             CREATE TABLE IF NOT EXISTS time_dependence (
                 time                 REAL    NOT NULL,
                 step                 INTEGER NOT NULL,
                 energy_per_carrier   REAL    NOT NULL,
                 mobility             REAL    NOT NULL,
                 distance_along_field REAL    NOT NULL,
                 distance_absolute    REAL    NOT NULL
             );
             CREATE TABLE IF NOT EXISTS decays (
                 time      REAL    NOT NULL,
                 insertion INTEGER NOT NULL,
                 carrier   INTEGER NOT NULL,
                 lifetime  REAL    NOT NULL,
                 steps     INTEGER NOT NULL,
                 site      INTEGER NOT NULL,
                 dx        REAL    NOT NULL,
                 dy        REAL    NOT NULL,
                 dz        REAL    NOT NULL
             );
             CREATE TABLE IF NOT EXISTS carrier_energy (
                 time           REAL    NOT NULL,
                 step           INTEGER NOT NULL,
                 carrier        INTEGER NOT NULL,
                 average_energy REAL    NOT NULL
             );
             CREATE TABLE IF NOT EXISTS occupation (
                 site            INTEGER PRIMARY KEY,
                 kind            TEXT    NOT NULL,
                 energy          REAL    NOT NULL,
                 occupation_time REAL    NOT NULL,
                 probability     REAL    NOT NULL
             );
             CREATE TABLE IF NOT EXISTS jump_lengths (
                 lower REAL    NOT NULL,
                 upper REAL    NOT NULL,
                 count INTEGER NOT NULL
             );",
        )?;

        Ok(Self { conn, finished: false })
    }
}

impl OutputWriter for SqliteWriter {
    fn write_trajectory(&mut self, rows: &[TrajectoryRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO trajectory (time, step, carrier, x, y, z) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.time,
                    row.step as i64,
                    row.carrier as i64,
                    row.x,
                    row.y,
                    row.z,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_time_dependence(&mut self, row: &TimeDependenceRow) -> OutputResult<()> {
        self.conn.execute(
            "INSERT INTO time_dependence \
             (time, step, energy_per_carrier, mobility, distance_along_field, distance_absolute) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                row.time,
                row.step as i64,
                row.energy_per_carrier,
                row.mobility,
                row.distance_along_field,
                row.distance_absolute,
            ],
        )?;
        Ok(())
    }

    fn write_decay(&mut self, row: &DecayRow) -> OutputResult<()> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO decays (time, insertion, carrier, lifetime, steps, site, dx, dy, dz) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;
        stmt.execute(rusqlite::params![
            row.time,
            row.insertion as i64,
            row.carrier as i64,
            row.lifetime,
            row.steps as i64,
            row.site,
            row.dx,
            row.dy,
            row.dz,
        ])?;
        Ok(())
    }

    fn write_energy(&mut self, row: &EnergyRow) -> OutputResult<()> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO carrier_energy (time, step, carrier, average_energy) \
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        stmt.execute(rusqlite::params![row.time, row.step as i64, row.carrier as i64, row.average_energy])?;
        Ok(())
    }

    fn write_occupation(&mut self, rows: &[OccupationRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR REPLACE INTO occupation (site, kind, energy, occupation_time, probability) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.site,
                    row.kind,
                    row.energy,
                    row.occupation_time,
                    row.probability,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_jump_lengths(&mut self, rows: &[JumpLengthRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO jump_lengths (lower, upper, count) VALUES (?1, ?2, ?3)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![row.lower, row.upper, row.count as i64])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn
            .execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
