//! Local optimizer: projected gradient descent on the sphere.
//!
//! One `relax` call drives a configuration all the way to an
//! approximate local minimum, not a single gradient step. Each
//! iteration accumulates pairwise repulsive forces, projects them onto
//! the tangent plane at each point (the manifold constraint), advances
//! by the learning rate, and renormalizes - a first-order tangential
//! step leaves the sphere, so the projection back is part of the step.

use crate::constants::MAX_RELAX_ITERATIONS;
use crate::energy::{accumulate_forces, total_energy};
use crate::geometry::{tangential, Vec3};

/// Outcome of one full relaxation, for logging and tests.
#[derive(Clone, Copy, Debug)]
pub struct RelaxReport {
    pub iterations: usize,
    pub initial_energy: f64,
    pub final_energy: f64,
    /// Largest energy increase seen between consecutive iterations.
    /// Descent with a sane learning rate keeps this at rounding noise.
    pub max_energy_increase: f64,
}

/// Mutate `points` toward a local energy minimum.
///
/// Iterates until the absolute energy change between consecutive
/// iterations drops below `epsilon`, or the safety cap is reached.
/// Exceeding the cap is not an error; whatever state was reached is
/// kept. Every point is renormalized on every iteration, so the
/// unit-norm invariant holds on return.
pub fn relax(points: &mut [Vec3], learning_rate: f64, epsilon: f64) -> RelaxReport {
    let initial_energy = total_energy(points);
    let mut previous = initial_energy;
    let mut forces = vec![Vec3::zeros(); points.len()];
    let mut iterations = 0;
    let mut max_energy_increase = 0.0f64;

    for _ in 0..MAX_RELAX_ITERATIONS {
        iterations += 1;
        accumulate_forces(points, &mut forces);

        for (point, force) in points.iter_mut().zip(forces.iter()) {
            let step = tangential(force, point) * learning_rate;
            *point += step;
            point.normalize_mut();
        }

        let current = total_energy(points);
        max_energy_increase = max_energy_increase.max(current - previous);
        let converged = (previous - current).abs() < epsilon;
        previous = current;
        if converged {
            break;
        }
    }

    RelaxReport {
        iterations,
        initial_energy,
        final_energy: previous,
        max_energy_increase,
    }
}
