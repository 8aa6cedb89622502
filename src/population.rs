//! Genetic algorithm over populations of sphere configurations.
//!
//! Each step fully relaxes every individual with the local optimizer,
//! then breeds replacements for the weak half of the population:
//! tournament selection, splitting-plane crossover, point mutation.
//! The best configuration ever seen is kept as an independent deep
//! copy, since population slots are overwritten every step.

use std::cmp::Ordering;

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;

use crate::constants::{
    CHILD_RELAX_BOOST, DEFAULT_RELAX_EPSILON, MUTATION_DISPLACEMENT, TOURNAMENT_SIZE,
};
use crate::energy::total_energy;
use crate::geometry::{random_unit_vector, Vec3};
use crate::relax::relax;

/// Configuration for the sphere search.
#[derive(Clone, Debug, Serialize)]
pub struct SearchConfig {
    /// Number of charges N on the sphere.
    pub charge_count: usize,
    /// Population size P.
    pub population_size: usize,
    /// Probability that a fresh child gets one point displaced.
    pub mutation_rate: f64,
    /// Gradient step size for the refinement pass.
    pub learning_rate: f64,
    /// |ΔE| cutoff inside each relax call.
    pub relax_epsilon: f64,
    /// A step whose best-energy delta falls below this converges the run.
    pub convergence_threshold: f64,
    /// Deterministic seed; `None` uses entropy.
    pub seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            charge_count: 12,
            population_size: 20,
            mutation_rate: 0.3,
            learning_rate: 0.01,
            relax_epsilon: DEFAULT_RELAX_EPSILON,
            convergence_threshold: 1e-6,
            seed: None,
        }
    }
}

/// One evaluated configuration in the population.
///
/// `energy` always equals the energy model's evaluation of `points`;
/// every mutation path reevaluates before the individual is ranked.
#[derive(Clone, Debug, Serialize)]
pub struct Individual {
    pub points: Vec<Vec3>,
    pub energy: f64,
}

impl Individual {
    pub fn random<R: Rng>(charge_count: usize, rng: &mut R) -> Self {
        let points: Vec<Vec3> = (0..charge_count).map(|_| random_unit_vector(rng)).collect();
        let energy = total_energy(&points);
        Self { points, energy }
    }

    fn reevaluate(&mut self) {
        self.energy = total_energy(&self.points);
    }
}

/// Run state: a step whose energy delta falls below the convergence
/// threshold transitions Running -> Converged, terminally. Changing N
/// or P means building a fresh searcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SearchStatus {
    Running,
    Converged,
}

/// Statistics for one step.
#[derive(Clone, Debug, Default, Serialize)]
pub struct StepStats {
    pub step: usize,
    pub best_energy: f64,
    pub avg_energy: f64,
    pub worst_energy: f64,
    pub spread: f64,
    pub energy_delta: f64,
    /// Total optimizer iterations spent this step, refinement pass
    /// plus child relaxation.
    pub relax_iterations: usize,
}

/// The population-based Thomson searcher.
pub struct ThomsonSearcher {
    pub config: SearchConfig,
    pub population: Vec<Individual>,
    /// Lowest-energy configuration ever observed; only ever improves.
    pub best_ever: Individual,
    pub status: SearchStatus,
    pub step_count: usize,
    pub history: Vec<StepStats>,
    rng: StdRng,
}

impl ThomsonSearcher {
    /// Create a searcher with a freshly sampled random population.
    pub fn new(config: SearchConfig) -> Self {
        assert!(config.charge_count >= 1, "need at least one charge");
        assert!(config.population_size >= 2, "need at least two individuals");

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut population: Vec<Individual> = (0..config.population_size)
            .map(|_| Individual::random(config.charge_count, &mut rng))
            .collect();
        population.sort_by(|a, b| cmp_energy(a.energy, b.energy));
        let best_ever = population[0].clone();

        Self {
            config,
            population,
            best_ever,
            status: SearchStatus::Running,
            step_count: 0,
            history: Vec::new(),
            rng,
        }
    }

    /// Run one full step: refine, recombine, track the best.
    ///
    /// Returns the absolute change of the best-ever energy across the
    /// step; the caller (or the searcher itself, via `status`) uses it
    /// as the convergence signal.
    pub fn step(&mut self) -> f64 {
        self.step_count += 1;
        let energy_before = self.best_ever.energy;

        // Refinement pass: drive every individual to a local minimum.
        // Individuals are independent, so this parallelizes cleanly.
        let learning_rate = self.config.learning_rate;
        let epsilon = self.config.relax_epsilon;
        let mut relax_iterations: usize = self
            .population
            .par_iter_mut()
            .map(|individual| {
                let report = relax(&mut individual.points, learning_rate, epsilon);
                individual.reevaluate();
                report.iterations
            })
            .sum();
        self.sort_and_track_best();

        // Recombination pass: breed children from the current
        // population, then overwrite the worst-ranked tail. Children
        // are buffered so every parent is drawn from the
        // pre-replacement population.
        let num_to_replace = self.population.len() / 2;
        let mut children = Vec::with_capacity(num_to_replace);
        for _ in 0..num_to_replace {
            let parent_a = self.tournament_select();
            let parent_b = self.tournament_select();
            let mut points = crossover(
                &self.population[parent_a].points,
                &self.population[parent_b].points,
                self.config.charge_count,
                &mut self.rng,
            );
            if self.rng.gen::<f64>() < self.config.mutation_rate {
                mutate(&mut points, &mut self.rng);
            }
            let report = relax(&mut points, learning_rate * CHILD_RELAX_BOOST, epsilon);
            relax_iterations += report.iterations;
            let energy = total_energy(&points);
            children.push(Individual { points, energy });
        }
        let tail_start = self.population.len() - num_to_replace;
        for (slot, child) in self.population[tail_start..].iter_mut().zip(children) {
            *slot = child;
        }
        self.sort_and_track_best();

        let delta = (energy_before - self.best_ever.energy).abs();
        self.record_stats(delta, relax_iterations);

        if delta < self.config.convergence_threshold {
            self.status = SearchStatus::Converged;
            debug!(
                "converged at step {} with E = {:.6}",
                self.step_count, self.best_ever.energy
            );
        }

        delta
    }

    /// Current best individual (head of the energy-sorted population).
    pub fn best(&self) -> &Individual {
        &self.population[0]
    }

    /// Stable ascending sort by energy, then update the best record.
    ///
    /// Stability is the only tie-break: equal-energy individuals keep
    /// their relative order.
    fn sort_and_track_best(&mut self) {
        self.population
            .sort_by(|a, b| cmp_energy(a.energy, b.energy));
        if self.population[0].energy < self.best_ever.energy {
            self.best_ever = self.population[0].clone();
        }
    }

    /// Best-of-k tournament: k draws with replacement, lowest energy
    /// wins. Returns the winner's population index.
    fn tournament_select(&mut self) -> usize {
        let mut best_idx = self.rng.gen_range(0..self.population.len());
        for _ in 1..TOURNAMENT_SIZE {
            let idx = self.rng.gen_range(0..self.population.len());
            if self.population[idx].energy < self.population[best_idx].energy {
                best_idx = idx;
            }
        }
        best_idx
    }

    fn record_stats(&mut self, energy_delta: f64, relax_iterations: usize) {
        let energies: Vec<f64> = self.population.iter().map(|i| i.energy).collect();
        let best = energies.first().copied().unwrap_or(0.0);
        let worst = energies.last().copied().unwrap_or(0.0);
        let avg = energies.iter().sum::<f64>() / energies.len() as f64;
        let variance =
            energies.iter().map(|e| (e - avg).powi(2)).sum::<f64>() / energies.len() as f64;

        self.history.push(StepStats {
            step: self.step_count,
            best_energy: best,
            avg_energy: avg,
            worst_energy: worst,
            spread: variance.sqrt(),
            energy_delta,
            relax_iterations,
        });
    }
}

fn cmp_energy(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Combine two parents through a random splitting plane.
///
/// A random unit normal splits the sphere in half: the child takes
/// parent A's points on the non-negative side and parent B's points on
/// the negative side. The halves rarely add up to exactly N, so the
/// child is padded with fresh uniform points or trimmed by repeatedly
/// removing one point of the globally closest pair - the points
/// causing the most crowding are the ones discarded.
pub fn crossover<R: Rng>(
    parent_a: &[Vec3],
    parent_b: &[Vec3],
    charge_count: usize,
    rng: &mut R,
) -> Vec<Vec3> {
    let normal = random_unit_vector(rng);

    let mut child: Vec<Vec3> = parent_a
        .iter()
        .filter(|p| p.dot(&normal) >= 0.0)
        .copied()
        .collect();
    child.extend(parent_b.iter().filter(|p| p.dot(&normal) < 0.0));

    while child.len() < charge_count {
        child.push(random_unit_vector(rng));
    }
    while child.len() > charge_count {
        remove_most_crowded(&mut child);
    }

    child
}

/// Remove the lower-index point of the globally closest pair.
fn remove_most_crowded(points: &mut Vec<Vec3>) {
    let mut min_dist = f64::MAX;
    let mut victim = 0;
    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            let dist = (points[i] - points[j]).norm();
            if dist < min_dist {
                min_dist = dist;
                victim = i;
            }
        }
    }
    points.remove(victim);
}

/// Displace one random point and project it back onto the sphere.
pub fn mutate<R: Rng>(points: &mut [Vec3], rng: &mut R) {
    let idx = rng.gen_range(0..points.len());
    points[idx] += random_unit_vector(rng) * MUTATION_DISPLACEMENT;
    points[idx].normalize_mut();
}

/// Compact single-line summary for driver output.
pub fn format_step_line(searcher: &ThomsonSearcher) -> String {
    let stats = searcher.history.last().cloned().unwrap_or_default();
    format!(
        "E_best={:.6} E_avg={:.6} spread={:.2e} ΔE={:.2e} relax_iters={}",
        searcher.best_ever.energy,
        stats.avg_energy,
        stats.spread,
        stats.energy_delta,
        stats.relax_iterations
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn config(n: usize, p: usize, seed: u64) -> SearchConfig {
        SearchConfig {
            charge_count: n,
            population_size: p,
            convergence_threshold: 1e-4,
            seed: Some(seed),
            ..SearchConfig::default()
        }
    }

    #[test]
    fn test_crossover_cardinality() {
        let mut rng = StdRng::seed_from_u64(5);
        for n in [4, 7, 12, 20] {
            let a: Vec<Vec3> = (0..n).map(|_| random_unit_vector(&mut rng)).collect();
            let b: Vec<Vec3> = (0..n).map(|_| random_unit_vector(&mut rng)).collect();
            for _ in 0..20 {
                let child = crossover(&a, &b, n, &mut rng);
                assert_eq!(child.len(), n);
            }
        }
    }

    #[test]
    fn test_crossover_preserves_unit_norm() {
        let mut rng = StdRng::seed_from_u64(8);
        let a: Vec<Vec3> = (0..10).map(|_| random_unit_vector(&mut rng)).collect();
        let b: Vec<Vec3> = (0..10).map(|_| random_unit_vector(&mut rng)).collect();
        let child = crossover(&a, &b, 10, &mut rng);
        for p in &child {
            assert!((p.norm() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_mutate_preserves_unit_norm() {
        let mut rng = StdRng::seed_from_u64(13);
        let mut points: Vec<Vec3> = (0..6).map(|_| random_unit_vector(&mut rng)).collect();
        for _ in 0..50 {
            mutate(&mut points, &mut rng);
        }
        for p in &points {
            assert!((p.norm() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_fresh_searcher_is_sorted_with_best_at_head() {
        let searcher = ThomsonSearcher::new(config(5, 8, 33));
        for pair in searcher.population.windows(2) {
            assert!(pair[0].energy <= pair[1].energy);
        }
        assert_eq!(searcher.best().energy, searcher.population[0].energy);
        assert_eq!(searcher.best().energy, searcher.best_ever.energy);
    }

    #[test]
    fn test_step_stats_count_relax_iterations() {
        let mut searcher = ThomsonSearcher::new(config(6, 8, 9));
        searcher.step();
        let stats = searcher.history.last().unwrap();
        // Every individual relaxes at least once per step, and so does
        // every child, so the total cannot be below P + P/2.
        assert!(stats.relax_iterations >= 12, "{}", stats.relax_iterations);
    }

    #[test]
    fn test_best_energy_is_monotone_across_steps() {
        let mut searcher = ThomsonSearcher::new(config(6, 8, 21));
        let mut previous = searcher.best_ever.energy;
        for _ in 0..4 {
            searcher.step();
            assert!(searcher.best_ever.energy <= previous + 1e-12);
            previous = searcher.best_ever.energy;
        }
    }

    #[test]
    fn test_population_stays_sorted_and_consistent() {
        let mut searcher = ThomsonSearcher::new(config(5, 6, 2));
        searcher.step();
        for pair in searcher.population.windows(2) {
            assert!(pair[0].energy <= pair[1].energy);
        }
        for individual in &searcher.population {
            assert_eq!(individual.points.len(), 5);
            let expected = total_energy(&individual.points);
            assert!((individual.energy - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_four_charges_converge_to_tetrahedron() {
        let mut searcher = ThomsonSearcher::new(config(4, 6, 42));
        for _ in 0..10 {
            if searcher.status == SearchStatus::Converged {
                break;
            }
            searcher.step();
        }
        assert_eq!(searcher.status, SearchStatus::Converged);
        assert!((searcher.best_ever.energy - 3.674235).abs() < 1e-3);
    }

    #[test]
    fn test_converged_is_reached_quickly_at_optimum() {
        // Once every individual sits at the global optimum, the next
        // step cannot improve the best record and must converge.
        let mut searcher = ThomsonSearcher::new(config(4, 6, 17));
        let mut steps = 0;
        while searcher.status == SearchStatus::Running && steps < 12 {
            searcher.step();
            steps += 1;
        }
        assert_eq!(searcher.status, SearchStatus::Converged);
        assert!(steps <= 12, "took {steps} steps");
    }
}
