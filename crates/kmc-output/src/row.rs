//! Plain data row types written by output backends.

use kmc_carrier::Carrier;
use kmc_core::SimClock;
use kmc_stats::{DecayRecord, EnergySample, TimeDependenceSample};

/// Absolute position of one carrier at a snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryRow {
    pub time:    f64,
    pub step:    u64,
    pub carrier: u64,
    /// `origin + displacement`, nm, unwrapped.
    pub x:       f64,
    pub y:       f64,
    pub z:       f64,
}

impl TrajectoryRow {
    pub fn new(clock: &SimClock, carrier: &Carrier) -> Self {
        let p = carrier.position();
        Self { time: clock.time, step: clock.step, carrier: carrier.id.0, x: p.x, y: p.y, z: p.z }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeDependenceRow {
    pub time:                 f64,
    pub step:                 u64,
    pub energy_per_carrier:   f64,
    pub mobility:             f64,
    pub distance_along_field: f64,
    pub distance_absolute:    f64,
}

impl From<&TimeDependenceSample> for TimeDependenceRow {
    fn from(s: &TimeDependenceSample) -> Self {
        Self {
            time:                 s.time,
            step:                 s.step,
            energy_per_carrier:   s.energy_per_carrier,
            mobility:             s.mobility,
            distance_along_field: s.distance_along_field,
            distance_absolute:    s.distance_absolute,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayRow {
    pub time:      f64,
    pub insertion: u64,
    pub carrier:   u64,
    pub lifetime:  f64,
    pub steps:     u64,
    pub site:      u32,
    pub dx:        f64,
    pub dy:        f64,
    pub dz:        f64,
}

impl From<&DecayRecord> for DecayRow {
    fn from(r: &DecayRecord) -> Self {
        Self {
            time:      r.time,
            insertion: r.insertion,
            carrier:   r.carrier.0,
            lifetime:  r.lifetime,
            steps:     r.steps,
            site:      r.site.0,
            dx:        r.displacement.x,
            dy:        r.displacement.y,
            dz:        r.displacement.z,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyRow {
    pub time:           f64,
    pub step:           u64,
    pub carrier:        u64,
    pub average_energy: f64,
}

impl From<&EnergySample> for EnergyRow {
    fn from(s: &EnergySample) -> Self {
        Self { time: s.time, step: s.step, carrier: s.carrier.0, average_energy: s.average }
    }
}

/// Per-site occupation at the end of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct OccupationRow {
    pub site:            u32,
    pub kind:            String,
    pub energy:          f64,
    pub occupation_time: f64,
    pub probability:     f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JumpLengthRow {
    pub lower: f64,
    pub upper: f64,
    pub count: u64,
}
