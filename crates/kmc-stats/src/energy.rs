//! Running energy average of one tracked carrier (lifetime mode).

use kmc_carrier::Carrier;
use kmc_core::{CarrierId, EnergyTracking, SimClock};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EnergySample {
    pub time:    f64,
    pub step:    u64,
    pub carrier: CarrierId,
    /// Running average energy in eV.
    pub average: f64,
}

/// Exponential moving average `avg = α·E + (1-α)·avg` of the site energy
/// under one carrier slot.
///
/// When a different carrier shows up in the slot (re-injection) the average
/// restarts from that carrier's current energy.
#[derive(Clone, Debug)]
pub struct EnergyTracker {
    settings: EnergyTracking,
    carrier:  CarrierId,
    average:  f64,
}

impl EnergyTracker {
    pub fn new(settings: EnergyTracking, carrier: &Carrier, energy: f64) -> Self {
        Self { settings, carrier: carrier.id, average: energy }
    }

    pub fn average(&self) -> f64 {
        self.average
    }

    /// Feed the tracked carrier and the energy of its site; returns a sample
    /// whenever the average changed.
    pub fn observe(&mut self, clock: &SimClock, carrier: &Carrier, energy: f64) -> Option<EnergySample> {
        if carrier.id != self.carrier {
            self.carrier = carrier.id;
            self.average = energy;
        } else if clock.step % self.settings.every_steps == 0 {
            let a = self.settings.alpha;
            self.average = a * energy + (1.0 - a) * self.average;
        } else {
            return None;
        }
        Some(EnergySample {
            time:    clock.time,
            step:    clock.step,
            carrier: self.carrier,
            average: self.average,
        })
    }
}
