//! Simulated-time model, run budgets, and output cadence.
//!
//! # Design
//!
//! KMC time is continuous: every step advances the clock by an exponentially
//! distributed `dt`.  `SimClock` therefore pairs an `f64` simulated time (in
//! seconds) with an integer step counter.  Both only ever increase.
//!
//! Budgets and output cadences carry an explicit unit tag (`Steps` or
//! `Seconds`) instead of guessing the unit from the magnitude of a number.

use std::fmt;

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Simulated time and step counter of a single run.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct SimClock {
    /// Simulated time in seconds since the start of the run.
    pub time: f64,
    /// Number of completed VSSM steps.
    pub step: u64,
}

impl SimClock {
    pub const ZERO: SimClock = SimClock { time: 0.0, step: 0 };

    /// Advance by one step of duration `dt`.
    #[inline]
    pub fn advance(&mut self, dt: f64) {
        self.time += dt;
        self.step += 1;
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} (t = {:.6e} s)", self.step, self.time)
    }
}

// ── RunBudget ─────────────────────────────────────────────────────────────────

/// Stop condition of a fixed-population run.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RunBudget {
    /// Stop once this many steps have completed.
    Steps(u64),
    /// Stop once simulated time reaches this many seconds.
    Seconds(f64),
}

impl RunBudget {
    /// Runtime values above this are read as step counts by
    /// [`from_legacy_runtime`](Self::from_legacy_runtime).
    pub const LEGACY_STEP_THRESHOLD: f64 = 100.0;

    /// Interpret an untagged legacy runtime value.
    ///
    /// Older inputs used a single number for both units: anything above
    /// [`LEGACY_STEP_THRESHOLD`](Self::LEGACY_STEP_THRESHOLD) meant a step
    /// count, anything else seconds.  Prefer the tagged variants.
    pub fn from_legacy_runtime(runtime: f64) -> RunBudget {
        let budget = if runtime > Self::LEGACY_STEP_THRESHOLD {
            RunBudget::Steps(runtime as u64)
        } else {
            RunBudget::Seconds(runtime)
        };
        tracing::warn!(
            runtime,
            %budget,
            "untagged runtime interpreted with the legacy >{} => steps rule",
            Self::LEGACY_STEP_THRESHOLD,
        );
        budget
    }

    /// `true` once `clock` has consumed the whole budget.
    #[inline]
    pub fn is_exhausted(&self, clock: &SimClock) -> bool {
        match *self {
            RunBudget::Steps(n)   => clock.step >= n,
            RunBudget::Seconds(t) => clock.time >= t,
        }
    }
}

impl fmt::Display for RunBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunBudget::Steps(n)   => write!(f, "{n} steps"),
            RunBudget::Seconds(t) => write!(f, "{t} s simulated"),
        }
    }
}

// ── OutputCadence ─────────────────────────────────────────────────────────────

/// How often trajectory / time-dependence snapshots are emitted.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OutputCadence {
    #[default]
    Never,
    /// Every `n` steps.
    Steps(u64),
    /// Whenever simulated time has moved past the previous snapshot plus `t`.
    Seconds(f64),
}

impl OutputCadence {
    #[inline]
    pub fn is_enabled(&self) -> bool {
        !matches!(self, OutputCadence::Never)
    }
}

/// Stateful tracker that decides when the next snapshot is due.
#[derive(Clone, Debug)]
pub struct OutputSchedule {
    cadence:   OutputCadence,
    next_time: f64,
}

impl OutputSchedule {
    pub fn new(cadence: OutputCadence) -> Self {
        Self { cadence, next_time: 0.0 }
    }

    pub fn cadence(&self) -> OutputCadence {
        self.cadence
    }

    /// Call once per completed step.  Returns `true` when a snapshot is due;
    /// for time cadences the next deadline is re-armed from the current time.
    pub fn is_due(&mut self, clock: &SimClock) -> bool {
        match self.cadence {
            OutputCadence::Never    => false,
            OutputCadence::Steps(n) => n > 0 && clock.step % n == 0,
            OutputCadence::Seconds(t) => {
                if clock.time > self.next_time {
                    self.next_time = clock.time + t;
                    true
                } else {
                    false
                }
            }
        }
    }
}
