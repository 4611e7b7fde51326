//! End-of-run report.
//!
//! Plain arrays rather than `nalgebra` types so the summary serialises to
//! flat JSON.

use kmc_core::{CarrierId, CarrierKind, Vec3};

use crate::{DecaySummary, DiffusionTensor, JumpHistogram};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CarrierSummary {
    pub id:           CarrierId,
    /// Net displacement in nm.
    pub displacement: [f64; 3],
    /// `displacement / simulated time` in nm/s.
    pub velocity:     [f64; 3],
    /// Mobility along the field in nm²/Vs; `None` at zero field.
    pub mobility:     Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiffusionSummary {
    /// Row-major tensor in nm²/s.
    pub tensor:       [[f64; 3]; 3],
    /// Ascending.
    pub eigenvalues:  [f64; 3],
    /// `eigenvectors[i]` belongs to `eigenvalues[i]`.
    pub eigenvectors: [[f64; 3]; 3],
}

impl From<&DiffusionTensor> for DiffusionSummary {
    fn from(d: &DiffusionTensor) -> Self {
        Self {
            tensor:       std::array::from_fn(|r| std::array::from_fn(|c| d.tensor[(r, c)])),
            eigenvalues:  std::array::from_fn(|i| d.eigenvalues[i]),
            eigenvectors: std::array::from_fn(|i| std::array::from_fn(|k| d.eigenvectors[(k, i)])),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunSummary {
    /// `fixed_population` or `lifetime`.
    pub mode:                   String,
    pub carrier_kind:           CarrierKind,
    pub steps:                  u64,
    /// Simulated seconds.
    pub time:                   f64,
    /// Decays (and therefore re-injections in lifetime mode).
    pub insertions:             u64,
    /// The wall-clock budget stopped the run before its own budget was spent.
    pub time_limited:           bool,
    /// Carriers still active at the end of the run.
    pub carriers:               Vec<CarrierSummary>,
    pub average_velocity:       [f64; 3],
    pub average_mobility:       Option<f64>,
    pub diffusion:              Option<DiffusionSummary>,
    /// Einstein-relation mobility from the diffusion tensor (zero field only).
    pub einstein_mobility:      Option<f64>,
    pub decay:                  Option<DecaySummary>,
    pub jump_lengths:           Option<JumpHistogram>,
    /// Per site, fraction of simulated time it held a carrier.
    pub occupation_probability: Vec<f64>,
}

pub(crate) fn to_array(v: &Vec3) -> [f64; 3] {
    [v.x, v.y, v.z]
}
