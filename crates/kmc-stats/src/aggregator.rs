//! `Aggregator`: per-run owner of every accumulator.

use kmc_carrier::Carrier;
use kmc_core::{CarrierKind, RunConfig, SimClock, Vec3};
use kmc_graph::SiteGraph;

use crate::summary::to_array;
use crate::transport::format_matrix;
use crate::{
    field_mobility, CarrierSummary, DecayRecord, DecayStats, DiffusionAccumulator,
    DiffusionTensor, JumpHistogram, RunSummary, TimeDependenceSample,
    TransportReport,
};

/// How a run ended, as reported by the engine.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RunOutcome {
    pub clock:        SimClock,
    pub insertions:   u64,
    pub time_limited: bool,
}

#[derive(Clone, Debug)]
pub struct Aggregator {
    mode:         &'static str,
    carrier_kind: CarrierKind,
    /// Field in V/nm.
    field:        Vec3,
    temperature:  f64,
    /// Disabled in lifetime mode, where displacements restart on every decay.
    diffusion:    Option<DiffusionAccumulator>,
    jumps:        Option<JumpHistogram>,
    decays:       DecayStats,
}

impl Aggregator {
    pub fn new(config: &RunConfig, graph: &SiteGraph) -> Self {
        let jumps = config.jump_length_bins.and_then(|bins| {
            match JumpHistogram::new(graph.max_jump_length(), bins) {
                Ok(h) => Some(h),
                Err(e) => {
                    tracing::warn!(error = %e, "jump-length histogram disabled");
                    None
                }
            }
        });
        Self {
            mode:         config.mode.label(),
            carrier_kind: config.carrier_kind,
            field:        config.field_v_per_nm(),
            temperature:  config.temperature,
            diffusion:    (!config.mode.is_lifetime())
                .then(|| DiffusionAccumulator::new(config.diffusion_resolution)),
            jumps,
            decays:       DecayStats::default(),
        }
    }

    /// Field in V/nm.
    pub fn field(&self) -> &Vec3 {
        &self.field
    }

    pub fn has_field(&self) -> bool {
        self.field.norm_squared() > 0.0
    }

    pub fn decays(&self) -> &DecayStats {
        &self.decays
    }

    pub fn jump_histogram(&self) -> Option<&JumpHistogram> {
        self.jumps.as_ref()
    }

    // ── Accumulation ──────────────────────────────────────────────────────

    /// Call after every completed step.
    pub fn observe_step(&mut self, step: u64, carriers: &[Carrier]) {
        if let Some(d) = &mut self.diffusion {
            d.observe(step, carriers);
        }
    }

    /// A hop with displacement `dr` was committed.
    pub fn record_jump(&mut self, dr: &Vec3) {
        if let Some(h) = &mut self.jumps {
            h.record(dr.norm());
        }
    }

    pub fn record_decay(&mut self, record: &DecayRecord) {
        self.decays.record(record);
    }

    // ── Readouts ──────────────────────────────────────────────────────────

    pub fn time_dependence(&self, clock: &SimClock, carriers: &[Carrier], graph: &SiteGraph) -> TimeDependenceSample {
        TimeDependenceSample::collect(clock, carriers, graph, &self.field)
    }

    pub fn report(&self, clock: &SimClock, carriers: &[Carrier]) -> TransportReport {
        let empty = DiffusionAccumulator::new(1);
        let diffusion = self.diffusion.as_ref().unwrap_or(&empty);
        TransportReport::collect(clock, carriers, diffusion, &self.field)
    }

    // ── Reduction ─────────────────────────────────────────────────────────

    /// Reduce everything into a [`RunSummary`] and write occupation
    /// probabilities back into `graph`.
    pub fn finish(&self, outcome: RunOutcome, carriers: &[Carrier], graph: &mut SiteGraph) -> RunSummary {
        let time = outcome.clock.time;
        graph.finalize_occupation(time);

        let has_field = self.has_field();
        let velocity_of = |dr: &Vec3| if time > 0.0 { dr / time } else { Vec3::zeros() };

        let carrier_summaries: Vec<CarrierSummary> = carriers
            .iter()
            .map(|c| {
                let v = velocity_of(&c.displacement);
                CarrierSummary {
                    id:           c.id,
                    displacement: to_array(&c.displacement),
                    velocity:     to_array(&v),
                    mobility:     has_field.then(|| field_mobility(&v, &self.field)),
                }
            })
            .collect();

        let average_velocity = if carriers.is_empty() {
            Vec3::zeros()
        } else {
            velocity_of(&(carriers.iter().map(|c| c.displacement).sum::<Vec3>() / carriers.len() as f64))
        };
        let average_mobility = (has_field && !carrier_summaries.is_empty()).then(|| {
            carrier_summaries.iter().filter_map(|c| c.mobility).sum::<f64>() / carrier_summaries.len() as f64
        });

        let diffusion = self
            .diffusion
            .as_ref()
            .and_then(|d| d.tensor(time))
            .map(DiffusionTensor::new);
        let einstein_mobility = diffusion
            .as_ref()
            .filter(|_| !has_field)
            .map(|d| d.einstein_mobility(self.temperature));

        if let Some(d) = &diffusion {
            tracing::info!(
                tensor      = %format_matrix(&d.tensor),
                eigenvalues = ?[d.eigenvalues.x, d.eigenvalues.y, d.eigenvalues.z],
                "diffusion tensor (nm^2/s)",
            );
        }
        if let Some(mu) = average_mobility {
            tracing::info!(mobility = mu, "average mobility along field (nm^2/Vs)");
        }
        if let Some(mu) = einstein_mobility {
            tracing::info!(mobility = mu, "Einstein-relation mobility, isotropic medium (nm^2/Vs)");
        }
        let decay = self.decays.summary();
        if let Some(d) = &decay {
            tracing::info!(
                decays           = d.decays,
                mean_lifetime    = d.mean_lifetime,
                mean_free_path   = d.mean_free_path,
                diffusion_length = d.diffusion_length,
                "decay statistics",
            );
        }

        RunSummary {
            mode:                   self.mode.to_string(),
            carrier_kind:           self.carrier_kind,
            steps:                  outcome.clock.step,
            time,
            insertions:             outcome.insertions,
            time_limited:           outcome.time_limited,
            carriers:               carrier_summaries,
            average_velocity:       to_array(&average_velocity),
            average_mobility,
            diffusion:              diffusion.as_ref().map(Into::into),
            einstein_mobility,
            decay,
            jump_lengths:           self.jumps.clone(),
            occupation_probability: graph.occupation_probability.clone(),
        }
    }
}
