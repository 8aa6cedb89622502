//! Geometry primitives for points constrained to the unit sphere.

use nalgebra::Vector3;
use rand::Rng;
use std::f64::consts::TAU;

/// All positions and forces are plain 3-vectors; the unit-norm
/// constraint is maintained by the optimizer, not the type.
pub type Vec3 = Vector3<f64>;

/// Sample an area-uniform random point on the unit sphere.
///
/// Inverse-transform sampling: azimuth uniform in [0, 2π), polar angle
/// via arccos of a uniform value in [-1, 1]. Sampling both spherical
/// angles uniformly would cluster points at the poles.
pub fn random_unit_vector<R: Rng>(rng: &mut R) -> Vec3 {
    let azimuth = rng.gen_range(0.0..TAU);
    let cos_polar: f64 = rng.gen_range(-1.0..=1.0);
    let sin_polar = (1.0 - cos_polar * cos_polar).sqrt();
    Vec3::new(
        sin_polar * azimuth.cos(),
        sin_polar * azimuth.sin(),
        cos_polar,
    )
}

/// Project a force onto the tangent plane of the sphere at `position`.
///
/// Removes the component along the (unit) position vector, leaving
/// only motion along the manifold. `position` must be normalized.
pub fn tangential(force: &Vec3, position: &Vec3) -> Vec3 {
    force - position * force.dot(position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_points_are_unit_length() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let p = random_unit_vector(&mut rng);
            assert_relative_eq!(p.norm(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_random_points_are_not_pole_clustered() {
        // Area-uniform sampling has E[z] = 0 and E[|z|] = 0.5. A naive
        // uniform-angle sampler gives E[|z|] ≈ 0.64.
        let mut rng = StdRng::seed_from_u64(7);
        let samples = 20_000;
        let mean_abs_z: f64 = (0..samples)
            .map(|_| random_unit_vector(&mut rng).z.abs())
            .sum::<f64>()
            / samples as f64;
        assert!(
            (mean_abs_z - 0.5).abs() < 0.02,
            "mean |z| = {mean_abs_z}, expected ~0.5"
        );
    }

    #[test]
    fn test_tangential_is_orthogonal_to_position() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let p = random_unit_vector(&mut rng);
            let f = random_unit_vector(&mut rng) * 2.5;
            let t = tangential(&f, &p);
            assert!(t.dot(&p).abs() < 1e-12);
        }
    }
}
