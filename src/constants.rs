//! Tuning constants for the sphere search and hull analysis.
//!
//! The energy model and optimizer are scale-free (unit sphere, unit
//! charges), so everything here is either a numerical guard or a
//! search-quality knob.

/// Pairs closer than this are treated as coincident. Dividing by such
/// a distance would poison every downstream energy comparison with
/// infinities or NaNs.
pub const MIN_PAIR_DISTANCE: f64 = 1e-9;

/// Energy contribution of a coincident pair. Large enough that any
/// collision dominates the configuration's energy, finite so that
/// sorting and convergence tests keep working.
pub const COLLISION_PENALTY: f64 = 1e9;

/// Safety cap on gradient-descent iterations inside one `relax` call.
/// Hitting the cap is not an error; the configuration is simply left
/// wherever the loop got to.
pub const MAX_RELAX_ITERATIONS: usize = 10_000;

/// Default |ΔE| cutoff between consecutive relax iterations.
pub const DEFAULT_RELAX_EPSILON: f64 = 1e-8;

/// Fresh children get a faster initial cleanup: crossover leaves them
/// far from any minimum, so a coarser learning rate is safe and saves
/// most of the iteration budget.
pub const CHILD_RELAX_BOOST: f64 = 5.0;

/// Tournament size k for parent selection. Best of 3 gives mild
/// selection pressure that still works for small populations.
pub const TOURNAMENT_SIZE: usize = 3;

/// Magnitude of the random displacement applied to a mutated point
/// before it is projected back onto the sphere.
pub const MUTATION_DISPLACEMENT: f64 = 0.2;

/// Hull edges are deduplicated by their endpoint coordinates rounded
/// to 4 decimal places. The same geometric edge is discovered by two
/// adjacent triangles with independent floating-point noise.
pub const EDGE_KEY_SCALE: f64 = 1e4;

/// Edges whose lengths differ from a group's representative length by
/// less than this share the group. Edge-length classes of near-optimal
/// configurations are well separated relative to this tolerance.
pub const EDGE_GROUP_TOLERANCE: f64 = 1e-2;

/// Visibility epsilon for hull face tests (normalized face normals).
pub const HULL_EPSILON: f64 = 1e-9;
