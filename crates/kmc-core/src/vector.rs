//! Cartesian vector aliases used for positions, displacements, and fields.
//!
//! Positions and displacements are in nanometres.  Displacements are stored
//! per event rather than recomputed from positions so periodic boundary
//! crossings are already unwrapped by the graph producer.

/// 3-D double-precision vector (nm for lengths, V/nm for fields).
pub type Vec3 = nalgebra::Vector3<f64>;

/// 3×3 double-precision matrix (diffusion tensor accumulators).
pub type Mat3 = nalgebra::Matrix3<f64>;

/// Outer product `a ⊗ b`.
#[inline]
pub fn outer(a: &Vec3, b: &Vec3) -> Mat3 {
    a * b.transpose()
}

/// Component-wise square `a ∘ a`.
#[inline]
pub fn squared(a: &Vec3) -> Vec3 {
    a.component_mul(a)
}

/// Convert a plain `[x, y, z]` array (configuration format) to a `Vec3`.
#[inline]
pub fn from_array(v: [f64; 3]) -> Vec3 {
    Vec3::new(v[0], v[1], v[2])
}
