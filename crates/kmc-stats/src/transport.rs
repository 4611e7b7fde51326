//! Field projections and periodic transport readouts.

use std::fmt::Write as _;

use kmc_carrier::Carrier;
use kmc_core::{CarrierId, Mat3, SimClock, Vec3};
use kmc_graph::SiteGraph;

use crate::DiffusionAccumulator;

/// Mobility along `field`: `v·F / |F|²`.  `field` must be non-zero.
///
/// With `v` in nm/s and `F` in V/nm the result is in nm²/Vs.
#[inline]
pub fn field_mobility(velocity: &Vec3, field: &Vec3) -> f64 {
    velocity.dot(field) / field.norm_squared()
}

/// One row of the time-dependence series.
///
/// All quantities are population averages.  Every field except `time` and
/// `step` stays zero when no field is applied.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct TimeDependenceSample {
    pub time:                 f64,
    pub step:                 u64,
    /// Mean site energy per carrier in eV.
    pub energy_per_carrier:   f64,
    /// Mobility along the field in nm²/Vs.
    pub mobility:             f64,
    /// Mean displacement projected on the field direction, nm.
    pub distance_along_field: f64,
    /// Length of the mean displacement vector, nm.
    pub distance_absolute:    f64,
}

impl TimeDependenceSample {
    pub fn collect(clock: &SimClock, carriers: &[Carrier], graph: &SiteGraph, field: &Vec3) -> Self {
        let mut sample = Self { time: clock.time, step: clock.step, ..Self::default() };
        if field.norm_squared() == 0.0 || carriers.is_empty() {
            return sample;
        }
        let n = carriers.len() as f64;
        let mean_dr = carriers.iter().map(|c| c.displacement).sum::<Vec3>() / n;
        let energy = carriers.iter().map(|c| graph.site_energy[c.site.index()]).sum::<f64>() / n;

        sample.energy_per_carrier = energy;
        if clock.time > 0.0 {
            sample.mobility = field_mobility(&(mean_dr / clock.time), field);
        }
        sample.distance_along_field = mean_dr.dot(field) / field.norm();
        sample.distance_absolute = mean_dr.norm();
        sample
    }
}

/// Intermediate progress readout, logged every `report_every` steps.
#[derive(Clone, Debug, PartialEq)]
pub enum TransportReport {
    /// Zero field: the current diffusion tensor estimate (nm²/s).
    Diffusion { step: u64, tensor: Option<Mat3> },
    /// Non-zero field: mobility of every carrier and their mean (nm²/Vs).
    Mobility { step: u64, per_carrier: Vec<(CarrierId, f64)>, average: f64 },
}

impl TransportReport {
    pub fn collect(
        clock:     &SimClock,
        carriers:  &[Carrier],
        diffusion: &DiffusionAccumulator,
        field:     &Vec3,
    ) -> Self {
        if field.norm_squared() == 0.0 {
            return TransportReport::Diffusion { step: clock.step, tensor: diffusion.tensor(clock.time) };
        }
        let per_carrier: Vec<(CarrierId, f64)> = carriers
            .iter()
            .map(|c| {
                let v = if clock.time > 0.0 { c.displacement / clock.time } else { Vec3::zeros() };
                (c.id, field_mobility(&v, field))
            })
            .collect();
        let average = if per_carrier.is_empty() {
            0.0
        } else {
            per_carrier.iter().map(|&(_, mu)| mu).sum::<f64>() / per_carrier.len() as f64
        };
        TransportReport::Mobility { step: clock.step, per_carrier, average }
    }

    pub fn log(&self) {
        match self {
            TransportReport::Diffusion { step, tensor: Some(t) } => {
                tracing::info!(step, tensor = %format_matrix(t), "diffusion tensor averaged over all carriers (nm^2/s)");
            }
            TransportReport::Diffusion { step, tensor: None } => {
                tracing::info!(step, "no diffusion samples yet");
            }
            TransportReport::Mobility { step, per_carrier, average } => {
                for (id, mu) in per_carrier {
                    tracing::debug!(step, carrier = %id, mobility = mu, "carrier mobility (nm^2/Vs)");
                }
                tracing::info!(step, average_mobility = average, "average mobility along field (nm^2/Vs)");
            }
        }
    }
}

/// Row-major `[[a, b, c], …]` rendering for log lines.
pub(crate) fn format_matrix(m: &Mat3) -> String {
    let mut s = String::from("[");
    for r in 0..3 {
        let _ = write!(s, "{}[{:.6e}, {:.6e}, {:.6e}]", if r > 0 { ", " } else { "" }, m[(r, 0)], m[(r, 1)], m[(r, 2)]);
    }
    s.push(']');
    s
}
