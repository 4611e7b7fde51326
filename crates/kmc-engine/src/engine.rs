//! The `Engine` struct and its VSSM step loop.

use std::time::Instant;

use kmc_carrier::{Carrier, CarrierStore, OccupancyViolation};
use kmc_core::{CarrierId, KmcRng, OutputSchedule, RandomSource, RunConfig, SimClock, SiteId};
use kmc_graph::SiteGraph;
use kmc_stats::{Aggregator, DecayRecord, EnergySample, EnergyTracker, RunOutcome, RunSummary};

use crate::policy::{DecayAction, ModePolicy};
use crate::selection::{Selection, Selector};
use crate::{EngineError, EngineResult, KmcObserver};

// ── Step results ──────────────────────────────────────────────────────────────

/// What one VSSM step committed.
#[derive(Clone, Debug, PartialEq)]
pub enum StepOutcome {
    Jump { carrier: CarrierId, from: SiteId, to: SiteId },
    /// `replacement` is the fresh carrier in lifetime mode, `None` when the
    /// carrier was retired.
    Decay { record: DecayRecord, replacement: Option<CarrierId> },
    /// Every carrier was surrounded; only time advanced.
    Idle,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StepReport {
    /// Time increment of the step in seconds.
    pub dt:      f64,
    pub outcome: StepOutcome,
    /// Energy-tracker update taken at the start of the step.
    pub energy:  Option<EnergySample>,
}

// ── Engine ────────────────────────────────────────────────────────────────────

/// Variable-step-size kinetic Monte Carlo over a fixed site graph.
///
/// Each [`step`](Self::step):
///
/// 1. sums the escape rates `R` of all active carriers (`R == 0` is fatal),
/// 2. draws `dt = -ln(u) / R` and advances the clock, every carrier's
///    lifetime and step count, and the occupation time of every held site,
/// 3. runs the two-level selection (see [`crate::selection`]),
/// 4. commits the selected hop or decay and updates the observables.
///
/// [`run`](Self::run) repeats this until the mode's budget is spent or the
/// wall-clock limit is hit.  Create via [`EngineBuilder`][crate::EngineBuilder].
pub struct Engine<S: RandomSource = KmcRng> {
    pub(crate) config:       RunConfig,
    pub(crate) graph:        SiteGraph,
    pub(crate) store:        CarrierStore,
    pub(crate) rng:          S,
    pub(crate) clock:        SimClock,
    pub(crate) insertions:   u64,
    pub(crate) selector:     Selector,
    pub(crate) stats:        Aggregator,
    pub(crate) energy:       Option<EnergyTracker>,
    pub(crate) output:       OutputSchedule,
    pub(crate) time_limited: bool,
}

impl<S: RandomSource> Engine<S> {
    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn clock(&self) -> SimClock {
        self.clock
    }

    pub fn graph(&self) -> &SiteGraph {
        &self.graph
    }

    pub fn carriers(&self) -> &[Carrier] {
        self.store.carriers()
    }

    pub fn store(&self) -> &CarrierStore {
        &self.store
    }

    /// Decays so far.
    pub fn insertions(&self) -> u64 {
        self.insertions
    }

    pub fn is_time_limited(&self) -> bool {
        self.time_limited
    }

    /// Selection retries spent in the most recent step.
    pub fn last_retries(&self) -> usize {
        self.selector.retries()
    }

    pub fn is_complete(&self) -> bool {
        self.config.mode.is_complete(&self.clock, self.insertions, self.store.len())
    }

    /// Release the graph, with occupation probabilities if the run finished.
    pub fn into_graph(self) -> SiteGraph {
        self.graph
    }

    // ── Invariants ────────────────────────────────────────────────────────

    /// Every disagreement between the occupancy map and the active carriers.
    pub fn invariant_violations(&self) -> Vec<OccupancyViolation> {
        self.store.violations()
    }

    pub fn check_invariants(&self) -> EngineResult<()> {
        match self.invariant_violations().first() {
            None    => Ok(()),
            Some(v) => Err(EngineError::Invariant(v.to_string())),
        }
    }

    // ── Run loop ──────────────────────────────────────────────────────────

    /// Step until the run is complete, then reduce the observables.
    ///
    /// Hitting `max_realtime_secs` is not an error: the run stops after the
    /// current step and the summary is flagged `time_limited`.
    pub fn run<O: KmcObserver>(&mut self, observer: &mut O) -> EngineResult<RunSummary> {
        let started = Instant::now();
        tracing::info!(
            mode     = self.config.mode.label(),
            carriers = self.store.len(),
            sites    = self.graph.site_count(),
            seed     = self.config.seed,
            "kmc run started",
        );
        observer.on_run_start(&self.clock, self.store.carriers());

        while !self.is_complete() {
            if let Some(limit) = self.config.max_realtime_secs {
                if started.elapsed().as_secs_f64() > limit {
                    tracing::warn!(
                        limit_secs = limit,
                        step       = self.clock.step,
                        "real time limit reached, stopping early",
                    );
                    self.time_limited = true;
                    break;
                }
            }

            let report = self.step()?;
            if let Some(sample) = &report.energy {
                observer.on_energy_sample(sample);
            }
            if let StepOutcome::Decay { record, .. } = &report.outcome {
                observer.on_decay(record);
            }
            observer.on_step_end(&self.clock, &report.outcome);

            if self.output.is_due(&self.clock) {
                let sample = self.stats.time_dependence(&self.clock, self.store.carriers(), &self.graph);
                observer.on_snapshot(&self.clock, self.store.carriers(), &sample);
            }
            if let Some(every) = self.config.report_every {
                if self.clock.step % every == 0 {
                    self.stats.report(&self.clock, self.store.carriers()).log();
                }
            }
        }

        let summary = self.finish();
        tracing::info!(
            steps        = summary.steps,
            time         = summary.time,
            insertions   = summary.insertions,
            time_limited = summary.time_limited,
            wall_secs    = started.elapsed().as_secs_f64(),
            "kmc run finished",
        );
        observer.on_run_end(&summary, &self.graph);
        Ok(summary)
    }

    /// Reduce the observables into a summary and write occupation
    /// probabilities into the graph.  Called by [`run`](Self::run).
    pub fn finish(&mut self) -> RunSummary {
        let outcome = RunOutcome {
            clock:        self.clock,
            insertions:   self.insertions,
            time_limited: self.time_limited,
        };
        self.stats.finish(outcome, self.store.carriers(), &mut self.graph)
    }

    // ── Single step ───────────────────────────────────────────────────────

    /// Perform exactly one VSSM step.
    pub fn step(&mut self) -> EngineResult<StepReport> {
        if self.store.is_empty() {
            return Err(EngineError::NoCarriers);
        }
        let total = self.store.total_escape_rate(&self.graph);
        if !(total > 0.0) {
            return Err(EngineError::ZeroEscapeRate {
                step:     self.clock.step,
                carriers: self.store.len(),
            });
        }

        let energy = self.track_energy();

        let dt = self.rng.exponential(total);
        self.clock.advance(dt);
        self.store.tick(dt, &mut self.graph.occupation_time);

        let selection = self.selector.select(
            self.store.carriers(),
            &self.graph,
            self.store.occupancy(),
            &mut self.rng,
        );
        let outcome = self.commit(selection)?;

        self.stats.observe_step(self.clock.step, self.store.carriers());
        debug_assert!(self.store.violations().is_empty(), "{:?}", self.store.violations());
        Ok(StepReport { dt, outcome, energy })
    }

    fn commit(&mut self, selection: Selection) -> EngineResult<StepOutcome> {
        match selection {
            Selection::Idle => Ok(StepOutcome::Idle),

            Selection::Jump { slot, event, to } => {
                let carrier = self.store.get(slot).ok_or(kmc_carrier::CarrierError::UnknownSlot(slot))?;
                let (id, from) = (carrier.id, carrier.site);
                let dr = self.graph.displacement(event);
                self.store.hop(slot, to, dr)?;
                self.stats.record_jump(&dr);
                Ok(StepOutcome::Jump { carrier: id, from, to })
            }

            Selection::Decay { slot, .. } => {
                let carrier = self.store.get(slot).ok_or(kmc_carrier::CarrierError::UnknownSlot(slot))?;
                let record = DecayRecord::new(carrier, self.clock.time, self.insertions);
                self.stats.record_decay(&record);
                self.insertions += 1;

                let replacement = match self.config.mode.decay_action() {
                    DecayAction::Reinject => {
                        self.store.reinject(slot, &self.graph, &mut self.rng)?;
                        self.store.get(slot).map(|c| c.id)
                    }
                    DecayAction::Retire => {
                        self.store.retire(slot)?;
                        None
                    }
                };
                tracing::trace!(carrier = %record.carrier, insertion = record.insertion, "decay");
                Ok(StepOutcome::Decay { record, replacement })
            }
        }
    }

    /// Feed the carrier in slot 0 to the energy tracker (lifetime mode).
    fn track_energy(&mut self) -> Option<EnergySample> {
        let tracker = self.energy.as_mut()?;
        let carrier = self.store.get(0)?;
        let energy = self.graph.site_energy[carrier.site.index()];
        tracker.observe(&self.clock, carrier, energy)
    }
}
