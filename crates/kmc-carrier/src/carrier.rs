//! A single charge carrier.

use kmc_core::{CarrierId, CarrierKind, SiteId, Vec3};

/// A mobile token bound to exactly one site.
///
/// `origin` is the absolute position of the injection site.  Displacement
/// accumulates the per-event vectors, so `origin + displacement` stays
/// unwrapped across periodic boundaries.
#[derive(Clone, Debug, PartialEq)]
pub struct Carrier {
    pub id:           CarrierId,
    pub kind:         CarrierKind,
    pub site:         SiteId,
    pub origin:       Vec3,
    /// Simulated seconds since injection.
    pub lifetime:     f64,
    /// Global steps survived since injection.
    pub steps:        u64,
    /// Net displacement in nm since injection.
    pub displacement: Vec3,
}

impl Carrier {
    pub fn new(id: CarrierId, kind: CarrierKind, site: SiteId, origin: Vec3) -> Self {
        Self {
            id,
            kind,
            site,
            origin,
            lifetime:     0.0,
            steps:        0,
            displacement: Vec3::zeros(),
        }
    }

    /// Absolute (unwrapped) position in nm.
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.origin + self.displacement
    }

    /// Account for one global step of length `dt`.
    #[inline]
    pub fn tick(&mut self, dt: f64) {
        self.lifetime += dt;
        self.steps += 1;
    }
}
