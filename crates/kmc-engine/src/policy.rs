//! Mode-dependent injection and termination policy.
//!
//! The VSSM step itself is the same in both modes.  What differs is what a
//! decay does to the carrier and when the run is over; [`ModePolicy`] is that
//! difference, implemented for [`RunMode`].

use kmc_core::{RunMode, SimClock};

/// What happens to a carrier whose decay event fired.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DecayAction {
    /// Replace it with a fresh carrier on a random vacant site.
    Reinject,
    /// Remove it from the run.
    Retire,
}

pub trait ModePolicy {
    fn decay_action(&self) -> DecayAction;

    /// `true` once the run has nothing left to do.
    fn is_complete(&self, clock: &SimClock, insertions: u64, active: usize) -> bool;
}

impl ModePolicy for RunMode {
    fn decay_action(&self) -> DecayAction {
        match self {
            RunMode::FixedPopulation { .. } => DecayAction::Retire,
            RunMode::Lifetime { .. }        => DecayAction::Reinject,
        }
    }

    fn is_complete(&self, clock: &SimClock, insertions: u64, active: usize) -> bool {
        match self {
            RunMode::FixedPopulation { budget } => active == 0 || budget.is_exhausted(clock),
            RunMode::Lifetime { insertions: target } => insertions >= *target,
        }
    }
}
