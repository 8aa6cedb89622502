//! Coulomb-style energy model for charges on the sphere.
//!
//! The potential is the classic Thomson sum Σ 1/d_ij over unordered
//! pairs. Coincident pairs contribute a large fixed penalty instead of
//! a division by near-zero; crossover occasionally produces them and
//! the optimizer pushes them apart within a few iterations.

use crate::constants::{COLLISION_PENALTY, MIN_PAIR_DISTANCE};
use crate::geometry::Vec3;

/// Total pairwise potential energy of a configuration. Pure, O(N²).
///
/// Returns 0 for fewer than two points (no pairs).
pub fn total_energy(points: &[Vec3]) -> f64 {
    let mut energy = 0.0;
    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            let dist = (points[i] - points[j]).norm();
            if dist < MIN_PAIR_DISTANCE {
                energy += COLLISION_PENALTY;
            } else {
                energy += 1.0 / dist;
            }
        }
    }
    energy
}

/// Accumulate the repulsive force on every point into `forces`.
///
/// The gradient of 1/d gives a pair force of (p_i - p_j) / d³, added
/// to i and subtracted from j, so the pass stays O(N²). Coincident
/// pairs are skipped entirely; their force direction is meaningless
/// and the energy penalty already handles them.
pub fn accumulate_forces(points: &[Vec3], forces: &mut [Vec3]) {
    debug_assert_eq!(points.len(), forces.len());
    for f in forces.iter_mut() {
        *f = Vec3::zeros();
    }
    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            let delta = points[i] - points[j];
            let dist = delta.norm();
            if dist < MIN_PAIR_DISTANCE {
                continue;
            }
            let force = delta / (dist * dist * dist);
            forces[i] += force;
            forces[j] -= force;
        }
    }
}
