//! `kmc-output`: run output writers for the kmc transport engine.
//!
//! Two backends are provided:
//!
//! | Feature   | Backend | Files created                                                   |
//! |-----------|---------|-----------------------------------------------------------------|
//! | *(none)*  | CSV     | `trajectory.csv`, `time_dependence.csv`, `decays.csv`, `carrier_energy.csv`, `occupation.csv`, `jump_lengths.csv` |
//! | `sqlite`  | SQLite  | `output.db` (one table per CSV file)                            |
//!
//! Both implement [`OutputWriter`] and are driven by [`OutputObserver`],
//! which implements `kmc_engine::KmcObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use kmc_output::{CsvWriter, OutputObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let mut obs = OutputObserver::new(writer, engine.config());
//! let summary = engine.run(&mut obs)?;
//! if let Some(e) = obs.take_error() { eprintln!("output error: {e}"); }
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(test)]
mod tests;

pub use csv::{write_decay_probabilities_csv, CsvWriter};
pub use error::{OutputError, OutputResult};
pub use observer::OutputObserver;
pub use row::{DecayRow, EnergyRow, JumpLengthRow, OccupationRow, TimeDependenceRow, TrajectoryRow};
pub use writer::OutputWriter;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWriter;
