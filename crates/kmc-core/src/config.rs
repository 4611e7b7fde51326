//! Run configuration.
//!
//! Typically deserialised from TOML by the application crate (with the
//! `serde` feature) and handed to the engine builder, which calls
//! [`RunConfig::validate`] before anything is allocated.

use crate::time::{OutputCadence, RunBudget};
use crate::vector::{from_array, Vec3};
use crate::{CarrierKind, CoreError, CoreResult, NM_PER_M};

// ── RunMode ───────────────────────────────────────────────────────────────────

/// The two operating regimes of the engine.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RunMode {
    /// `N` carriers injected once and moved until the budget is spent.
    FixedPopulation { budget: RunBudget },
    /// Carriers decay and are re-injected until `insertions` decays happened.
    Lifetime { insertions: u64 },
}

impl RunMode {
    /// Short label for logs and summaries.
    pub fn label(&self) -> &'static str {
        match self {
            RunMode::FixedPopulation { .. } => "fixed_population",
            RunMode::Lifetime { .. }        => "lifetime",
        }
    }

    #[inline]
    pub fn is_lifetime(&self) -> bool {
        matches!(self, RunMode::Lifetime { .. })
    }
}

// ── EnergyTracking ────────────────────────────────────────────────────────────

/// Exponential running average of the energy of one tracked carrier
/// (lifetime mode only).
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnergyTracking {
    /// Weight of the newest sample, in `(0, 1]`.
    #[cfg_attr(feature = "serde", serde(default = "default_alpha"))]
    pub alpha: f64,
    /// Update the average every this many steps.
    #[cfg_attr(feature = "serde", serde(default = "default_energy_steps"))]
    pub every_steps: u64,
}

impl Default for EnergyTracking {
    fn default() -> Self {
        Self { alpha: default_alpha(), every_steps: default_energy_steps() }
    }
}

fn default_alpha() -> f64 { 0.3 }
fn default_energy_steps() -> u64 { 100 }

// ── RunConfig ─────────────────────────────────────────────────────────────────

/// Everything the engine needs besides the site graph.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunConfig {
    /// Number of simultaneously active carriers.
    pub carriers: usize,

    #[cfg_attr(feature = "serde", serde(default))]
    pub carrier_kind: CarrierKind,

    /// Master RNG seed.  The same seed and inputs always reproduce a run.
    pub seed: u64,

    pub mode: RunMode,

    /// Trajectory / time-dependence snapshot cadence.
    #[cfg_attr(feature = "serde", serde(default))]
    pub output: OutputCadence,

    /// Applied electric field in V/m.
    #[cfg_attr(feature = "serde", serde(default))]
    pub field: [f64; 3],

    /// Temperature in K, used by the Einstein relation.
    #[cfg_attr(feature = "serde", serde(default = "default_temperature"))]
    pub temperature: f64,

    /// Wall-clock budget in seconds.  `None` means unlimited.
    #[cfg_attr(feature = "serde", serde(default))]
    pub max_realtime_secs: Option<f64>,

    /// Glob matched against site kinds when choosing injection sites.
    #[cfg_attr(feature = "serde", serde(default = "default_pattern"))]
    pub injection_pattern: String,

    /// Sample the diffusion tensor every this many steps.
    #[cfg_attr(feature = "serde", serde(default = "default_diffusion_resolution"))]
    pub diffusion_resolution: u64,

    /// Log an intermediate transport report every this many steps.
    #[cfg_attr(feature = "serde", serde(default))]
    pub report_every: Option<u64>,

    /// Number of jump-length histogram bins.  `None` disables the histogram.
    #[cfg_attr(feature = "serde", serde(default))]
    pub jump_length_bins: Option<usize>,

    #[cfg_attr(feature = "serde", serde(default))]
    pub energy_tracking: Option<EnergyTracking>,
}

fn default_temperature() -> f64 { 300.0 }
fn default_pattern() -> String { "*".to_string() }
fn default_diffusion_resolution() -> u64 { 1000 }

impl RunConfig {
    /// Minimal configuration with every optional setting at its default.
    pub fn new(carriers: usize, seed: u64, mode: RunMode) -> Self {
        Self {
            carriers,
            carrier_kind:         CarrierKind::default(),
            seed,
            mode,
            output:               OutputCadence::Never,
            field:                [0.0; 3],
            temperature:          default_temperature(),
            max_realtime_secs:    None,
            injection_pattern:    default_pattern(),
            diffusion_resolution: default_diffusion_resolution(),
            report_every:         None,
            jump_length_bins:     None,
            energy_tracking:      None,
        }
    }

    /// Field in V/nm, the unit used for mobilities in nm²/Vs.
    pub fn field_v_per_nm(&self) -> Vec3 {
        from_array(self.field) / NM_PER_M
    }

    /// Reject configurations the engine cannot run.
    pub fn validate(&self) -> CoreResult<()> {
        if self.carriers == 0 {
            return Err(CoreError::Config("number of carriers must be at least 1".into()));
        }
        match self.mode {
            RunMode::FixedPopulation { budget: RunBudget::Seconds(t) } if !(t > 0.0) => {
                return Err(CoreError::Config(format!("runtime budget must be positive, got {t} s")));
            }
            RunMode::Lifetime { insertions: 0 } => {
                return Err(CoreError::Config("lifetime mode needs at least one insertion".into()));
            }
            _ => {}
        }
        match self.output {
            OutputCadence::Steps(0) => {
                return Err(CoreError::Config("output cadence of 0 steps".into()));
            }
            OutputCadence::Seconds(t) if !(t > 0.0) => {
                return Err(CoreError::Config(format!("output cadence must be positive, got {t} s")));
            }
            _ => {}
        }
        if self.field.iter().any(|c| !c.is_finite()) {
            return Err(CoreError::Config(format!("field {:?} is not finite", self.field)));
        }
        if !(self.temperature > 0.0) {
            return Err(CoreError::Config(format!(
                "temperature must be positive, got {} K", self.temperature
            )));
        }
        if self.diffusion_resolution == 0 {
            return Err(CoreError::Config("diffusion_resolution must be at least 1".into()));
        }
        if self.report_every == Some(0) {
            return Err(CoreError::Config("report_every must be at least 1".into()));
        }
        if self.jump_length_bins == Some(0) {
            return Err(CoreError::Config("jump_length_bins must be at least 1".into()));
        }
        if let Some(tracking) = &self.energy_tracking {
            if !self.mode.is_lifetime() {
                return Err(CoreError::Config(
                    "energy_tracking applies to lifetime mode only".into(),
                ));
            }
            if !(tracking.alpha > 0.0 && tracking.alpha <= 1.0) {
                return Err(CoreError::Config(format!(
                    "energy tracking alpha must be in (0, 1], got {}", tracking.alpha
                )));
            }
            if tracking.every_steps == 0 {
                return Err(CoreError::Config("energy tracking every_steps must be at least 1".into()));
            }
        }
        if let Some(secs) = self.max_realtime_secs {
            if !(secs > 0.0) {
                return Err(CoreError::Config(format!("max_realtime_secs must be positive, got {secs}")));
            }
        }
        Ok(())
    }
}
