//! CSV output backend.
//!
//! Creates one file per output stream in the configured output directory:
//! - `trajectory.csv`
//! - `time_dependence.csv`
//! - `decays.csv`
//! - `carrier_energy.csv`
//! - `occupation.csv`
//! - `jump_lengths.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;
use kmc_graph::DecayProbability;

use crate::writer::OutputWriter;
use crate::{DecayRow, EnergyRow, JumpLengthRow, OccupationRow, OutputResult, TimeDependenceRow, TrajectoryRow};

/// Writes run output to six CSV files.
pub struct CsvWriter {
    trajectory:      Writer<File>,
    time_dependence: Writer<File>,
    decays:          Writer<File>,
    energy:          Writer<File>,
    occupation:      Writer<File>,
    jump_lengths:    Writer<File>,
    finished:        bool,
}

impl CsvWriter {
    /// Open (or create) the CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut trajectory = Writer::from_path(dir.join("trajectory.csv"))?;
        trajectory.write_record(["time", "step", "carrier", "x", "y", "z"])?;

        let mut time_dependence = Writer::from_path(dir.join("time_dependence.csv"))?;
        time_dependence.write_record([
            "time",
            "step",
            "energy_per_carrier",
            "mobility",
            "distance_along_field",
            "distance_absolute",
        ])?;

        let mut decays = Writer::from_path(dir.join("decays.csv"))?;
        decays.write_record(["time", "insertion", "carrier", "lifetime", "steps", "site", "dx", "dy", "dz"])?;

        let mut energy = Writer::from_path(dir.join("carrier_energy.csv"))?;
        energy.write_record(["time", "step", "carrier", "average_energy"])?;

        let mut occupation = Writer::from_path(dir.join("occupation.csv"))?;
        occupation.write_record(["site", "kind", "energy", "occupation_time", "probability"])?;

        let mut jump_lengths = Writer::from_path(dir.join("jump_lengths.csv"))?;
        jump_lengths.write_record(["lower", "upper", "count"])?;

        Ok(Self {
            trajectory,
            time_dependence,
            decays,
            energy,
            occupation,
            jump_lengths,
            finished: false,
        })
    }
}

impl OutputWriter for CsvWriter {
    fn write_trajectory(&mut self, rows: &[TrajectoryRow]) -> OutputResult<()> {
        for row in rows {
            self.trajectory.write_record(&[
                row.time.to_string(),
                row.step.to_string(),
                row.carrier.to_string(),
                row.x.to_string(),
                row.y.to_string(),
                row.z.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_time_dependence(&mut self, row: &TimeDependenceRow) -> OutputResult<()> {
        self.time_dependence.write_record(&[
            row.time.to_string(),
            row.step.to_string(),
            row.energy_per_carrier.to_string(),
            row.mobility.to_string(),
            row.distance_along_field.to_string(),
            row.distance_absolute.to_string(),
        ])?;
        Ok(())
    }

    fn write_decay(&mut self, row: &DecayRow) -> OutputResult<()> {
        self.decays.write_record(&[
            row.time.to_string(),
            row.insertion.to_string(),
            row.carrier.to_string(),
            row.lifetime.to_string(),
            row.steps.to_string(),
            row.site.to_string(),
            row.dx.to_string(),
            row.dy.to_string(),
            row.dz.to_string(),
        ])?;
        Ok(())
    }

    fn write_energy(&mut self, row: &EnergyRow) -> OutputResult<()> {
        self.energy.write_record(&[
            row.time.to_string(),
            row.step.to_string(),
            row.carrier.to_string(),
            row.average_energy.to_string(),
        ])?;
        Ok(())
    }

    fn write_occupation(&mut self, rows: &[OccupationRow]) -> OutputResult<()> {
        for row in rows {
            self.occupation.write_record(&[
                row.site.to_string(),
                row.kind.clone(),
                row.energy.to_string(),
                row.occupation_time.to_string(),
                row.probability.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_jump_lengths(&mut self, rows: &[JumpLengthRow]) -> OutputResult<()> {
        for row in rows {
            self.jump_lengths.write_record(&[
                row.lower.to_string(),
                row.upper.to_string(),
                row.count.to_string(),
            ])?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.trajectory.flush()?;
        self.time_dependence.flush()?;
        self.decays.flush()?;
        self.energy.flush()?;
        self.occupation.flush()?;
        self.jump_lengths.flush()?;
        Ok(())
    }
}

/// Write per-site decay probabilities to `path` (`site,outgoing,incoming`).
pub fn write_decay_probabilities_csv(path: &Path, rows: &[DecayProbability]) -> OutputResult<()> {
    let mut w = Writer::from_path(path)?;
    w.write_record(["site", "outgoing", "incoming"])?;
    for row in rows {
        w.write_record(&[row.site.0.to_string(), row.outgoing.to_string(), row.incoming.to_string()])?;
    }
    w.flush()?;
    Ok(())
}
