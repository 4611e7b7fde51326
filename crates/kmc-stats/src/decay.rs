//! Decay records and lifetime statistics.

use kmc_carrier::Carrier;
use kmc_core::{CarrierId, SiteId, Vec3};

/// Snapshot of a carrier at the moment it decayed.
#[derive(Clone, Debug, PartialEq)]
pub struct DecayRecord {
    /// Simulated time of the decay.
    pub time:         f64,
    /// Number of decays before this one.
    pub insertion:    u64,
    pub carrier:      CarrierId,
    pub lifetime:     f64,
    pub steps:        u64,
    /// Site the carrier decayed on.
    pub site:         SiteId,
    pub displacement: Vec3,
}

impl DecayRecord {
    pub fn new(carrier: &Carrier, time: f64, insertion: u64) -> Self {
        Self {
            time,
            insertion,
            carrier:      carrier.id,
            lifetime:     carrier.lifetime,
            steps:        carrier.steps,
            site:         carrier.site,
            displacement: carrier.displacement,
        }
    }
}

/// Running sums over all decays of a run.
#[derive(Clone, Debug, Default)]
pub struct DecayStats {
    count:        u64,
    lifetime_sum: f64,
    path_sum:     f64,
    /// Σ Δr ∘ Δr (component-wise squares).
    square_sum:   Vec3,
}

impl DecayStats {
    pub fn record(&mut self, r: &DecayRecord) {
        self.count += 1;
        self.lifetime_sum += r.lifetime;
        self.path_sum += r.displacement.norm();
        self.square_sum += kmc_core::vector::squared(&r.displacement);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// `None` before the first decay.
    pub fn summary(&self) -> Option<DecaySummary> {
        if self.count == 0 {
            return None;
        }
        let n = self.count as f64;
        Some(DecaySummary {
            decays:           self.count,
            mean_lifetime:    self.lifetime_sum / n,
            mean_free_path:   self.path_sum / n,
            diffusion_length: (self.square_sum.norm() / n).sqrt(),
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecaySummary {
    pub decays:           u64,
    /// ⟨τ⟩ in seconds.
    pub mean_lifetime:    f64,
    /// ⟨|Δr|⟩ in nm.
    pub mean_free_path:   f64,
    /// `sqrt(|Σ Δr∘Δr| / n)` in nm.
    pub diffusion_length: f64,
}
