//! Engine observer trait for output and progress reporting.

use kmc_carrier::Carrier;
use kmc_core::SimClock;
use kmc_graph::SiteGraph;
use kmc_stats::{DecayRecord, EnergySample, RunSummary, TimeDependenceSample};

use crate::StepOutcome;

/// Callbacks invoked by [`Engine::run`][crate::Engine::run].
///
/// All methods default to no-ops so implementors only override what they
/// care about.  Observers only read; nothing they do feeds back into the
/// simulation.
pub trait KmcObserver {
    /// Called once after injection, before the first step.
    fn on_run_start(&mut self, _clock: &SimClock, _carriers: &[Carrier]) {}

    /// Called after every completed step.
    fn on_step_end(&mut self, _clock: &SimClock, _outcome: &StepOutcome) {}

    /// Called whenever the output cadence is due.
    fn on_snapshot(
        &mut self,
        _clock:    &SimClock,
        _carriers: &[Carrier],
        _sample:   &TimeDependenceSample,
    ) {}

    /// Called for every decay, before the carrier is re-injected or retired.
    fn on_decay(&mut self, _record: &DecayRecord) {}

    /// Called when the tracked carrier's running energy average changes.
    fn on_energy_sample(&mut self, _sample: &EnergySample) {}

    /// Called once after the summary is built.  Occupation probabilities are
    /// already written into `graph`.
    fn on_run_end(&mut self, _summary: &RunSummary, _graph: &SiteGraph) {}
}

/// A [`KmcObserver`] that does nothing.
pub struct NoopObserver;

impl KmcObserver for NoopObserver {}
