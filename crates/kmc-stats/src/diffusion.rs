//! Diffusion tensor accumulation and reduction.
//!
//! Every `resolution` steps the outer product `Δr ⊗ Δr` of every active
//! carrier's net displacement is added to a running sum.  At the end
//!
//! ```text
//! D = Σ Δr ⊗ Δr / (2 · t · Σ_samples N)
//! ```
//!
//! where `Σ_samples N` is the number of carrier displacements summed.  With a
//! constant population this is `samples · N`.

use nalgebra::SymmetricEigen;

use kmc_carrier::Carrier;
use kmc_core::vector::outer;
use kmc_core::{Mat3, Vec3};

#[derive(Clone, Debug)]
pub struct DiffusionAccumulator {
    resolution: u64,
    sum:        Mat3,
    /// Number of carrier displacements added to `sum`.
    terms:      u64,
    samples:    u64,
}

impl DiffusionAccumulator {
    pub fn new(resolution: u64) -> Self {
        Self { resolution: resolution.max(1), sum: Mat3::zeros(), terms: 0, samples: 0 }
    }

    /// Sample if `step` is a multiple of the resolution.
    pub fn observe(&mut self, step: u64, carriers: &[Carrier]) {
        if step % self.resolution != 0 {
            return;
        }
        for c in carriers {
            self.sum += outer(&c.displacement, &c.displacement);
        }
        self.terms += carriers.len() as u64;
        self.samples += 1;
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Normalised tensor in nm²/s after `time` simulated seconds, or `None`
    /// before the first sample.
    pub fn tensor(&self, time: f64) -> Option<Mat3> {
        if self.terms == 0 || !(time > 0.0) {
            return None;
        }
        Some(self.sum / (2.0 * time * self.terms as f64))
    }
}

/// A reduced diffusion tensor with its eigen-decomposition.
#[derive(Clone, Debug, PartialEq)]
pub struct DiffusionTensor {
    pub tensor:       Mat3,
    /// Eigenvalues in ascending order.
    pub eigenvalues:  Vec3,
    /// Column `i` is the unit eigenvector of `eigenvalues[i]`.
    pub eigenvectors: Mat3,
}

impl DiffusionTensor {
    pub fn new(tensor: Mat3) -> Self {
        let eig = SymmetricEigen::new(tensor);
        let mut order = [0usize, 1, 2];
        order.sort_by(|&a, &b| eig.eigenvalues[a].total_cmp(&eig.eigenvalues[b]));

        let eigenvalues = Vec3::from_fn(|i, _| eig.eigenvalues[order[i]]);
        let eigenvectors = Mat3::from_fn(|r, c| eig.eigenvectors[(r, order[c])]);
        Self { tensor, eigenvalues, eigenvectors }
    }

    /// `tr(D) / 3`, the isotropic diffusion coefficient.
    pub fn mean_diffusivity(&self) -> f64 {
        self.tensor.trace() / 3.0
    }

    /// Einstein-relation mobility `|D̄ / (k_B T)|` in nm²/Vs.
    pub fn einstein_mobility(&self, temperature: f64) -> f64 {
        (self.mean_diffusivity() / (kmc_core::BOLTZMANN_EV * temperature)).abs()
    }
}
