//! `OutputObserver<W>`: bridges `KmcObserver` to an `OutputWriter`.

use kmc_carrier::Carrier;
use kmc_core::{RunConfig, SimClock};
use kmc_engine::KmcObserver;
use kmc_graph::SiteGraph;
use kmc_stats::{DecayRecord, EnergySample, RunSummary, TimeDependenceSample};

use crate::row::{DecayRow, EnergyRow, JumpLengthRow, OccupationRow, TimeDependenceRow, TrajectoryRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`KmcObserver`] that streams run output to any [`OutputWriter`]
/// backend.
///
/// Errors from the writer are stored internally because observer methods
/// have no return value.  After `engine.run()` returns, check for errors
/// with [`take_error`][Self::take_error].
pub struct OutputObserver<W: OutputWriter> {
    writer:     W,
    /// Initial positions are only written when snapshots are enabled.
    snapshots:  bool,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> OutputObserver<W> {
    pub fn new(writer: W, config: &RunConfig) -> Self {
        Self {
            writer,
            snapshots:  config.output.is_enabled(),
            last_error: None,
        }
    }

    /// Take the stored write error (if any) after `engine.run()` returns.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            if self.last_error.is_none() {
                tracing::warn!(error = %e, "output write failed; further errors suppressed");
                self.last_error = Some(e);
            }
        }
    }

    fn write_positions(&mut self, clock: &SimClock, carriers: &[Carrier]) {
        if carriers.is_empty() {
            return;
        }
        let rows: Vec<TrajectoryRow> = carriers.iter().map(|c| TrajectoryRow::new(clock, c)).collect();
        let result = self.writer.write_trajectory(&rows);
        self.store_err(result);
    }
}

impl<W: OutputWriter> KmcObserver for OutputObserver<W> {
    fn on_run_start(&mut self, clock: &SimClock, carriers: &[Carrier]) {
        if self.snapshots {
            self.write_positions(clock, carriers);
        }
    }

    fn on_snapshot(&mut self, clock: &SimClock, carriers: &[Carrier], sample: &TimeDependenceSample) {
        self.write_positions(clock, carriers);
        let result = self.writer.write_time_dependence(&TimeDependenceRow::from(sample));
        self.store_err(result);
    }

    fn on_decay(&mut self, record: &DecayRecord) {
        let result = self.writer.write_decay(&DecayRow::from(record));
        self.store_err(result);
    }

    fn on_energy_sample(&mut self, sample: &EnergySample) {
        let result = self.writer.write_energy(&EnergyRow::from(sample));
        self.store_err(result);
    }

    fn on_run_end(&mut self, summary: &RunSummary, graph: &SiteGraph) {
        let occupation: Vec<OccupationRow> = graph
            .site_ids()
            .map(|s| {
                let i = s.index();
                OccupationRow {
                    site:            s.0,
                    kind:            graph.site_kind[i].clone(),
                    energy:          graph.site_energy[i],
                    occupation_time: graph.occupation_time[i],
                    probability:     graph.occupation_probability[i],
                }
            })
            .collect();
        let result = self.writer.write_occupation(&occupation);
        self.store_err(result);

        if let Some(hist) = &summary.jump_lengths {
            let rows: Vec<JumpLengthRow> = hist
                .bins()
                .map(|(lower, upper, count)| JumpLengthRow { lower, upper, count })
                .collect();
            let result = self.writer.write_jump_lengths(&rows);
            self.store_err(result);
        }

        let result = self.writer.finish();
        self.store_err(result);
    }
}
