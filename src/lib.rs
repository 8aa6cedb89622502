//! Thomson Problem Explorer - Library
//!
//! This crate provides a genetic algorithm search for near-optimal
//! arrangements of N mutually repelling point charges constrained to
//! the unit sphere, plus convex-hull edge analysis used to detect the
//! symmetric edge classes of the resulting polyhedra.

pub mod constants;
pub mod energy;
pub mod geometry;
pub mod hull;
pub mod population;
pub mod relax;
