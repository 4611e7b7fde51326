//! The `OutputWriter` trait implemented by all backend writers.

use crate::{DecayRow, EnergyRow, JumpLengthRow, OccupationRow, OutputResult, TimeDependenceRow, TrajectoryRow};

/// Trait implemented by the CSV and SQLite writers.
///
/// Errors are stored by [`OutputObserver`][crate::OutputObserver] and
/// retrieved with its `take_error`, since observer hooks return nothing.
pub trait OutputWriter {
    /// Write the positions of all carriers at one snapshot.
    fn write_trajectory(&mut self, rows: &[TrajectoryRow]) -> OutputResult<()>;

    fn write_time_dependence(&mut self, row: &TimeDependenceRow) -> OutputResult<()>;

    fn write_decay(&mut self, row: &DecayRow) -> OutputResult<()>;

    fn write_energy(&mut self, row: &EnergyRow) -> OutputResult<()>;

    fn write_occupation(&mut self, rows: &[OccupationRow]) -> OutputResult<()>;

    fn write_jump_lengths(&mut self, rows: &[JumpLengthRow]) -> OutputResult<()>;

    /// Flush and close all underlying handles.
    ///
    /// Idempotent: safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
