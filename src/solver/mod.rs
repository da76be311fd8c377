//! MNA (Modified Nodal Analysis) solver.
//!
//! This module provides the numerical engine for circuit simulation.
//!
//! ## Modified Nodal Analysis without branch currents
//!
//! The assembler writes one KCL equation per node:
//! ```text
//! G v = i
//! ```
//!
//! where:
//! - G is the conductance matrix (resistors and diode companion models)
//! - v is the vector of node voltages
//! - i is the sum of source currents into each node
//!
//! Voltage sources are not given branch-current unknowns. Each one instead
//! merges the KCL rows of its two terminals into one and reuses the freed
//! row for its constraint `V+ - V- = E`. Ground's row and column are then
//! removed, leaving an (N-1) x (N-1) system over nodes 1..N.

mod linear;
mod mna;
mod newton;
mod simulator;

pub use linear::{LinearSolver, LuSolver};
pub use mna::{
    assemble, assemble_reduced, eliminate_voltage_sources, stamp_kcl, with_ground, MnaSystem,
    VoltageConstraint,
};
pub use newton::NewtonRaphson;
pub use simulator::{Simulator, Solution, SolverConfig};

/// Default convergence tolerance for Newton-Raphson iteration (volts).
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Default maximum Newton-Raphson iterations per solve.
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Pivot magnitude below which a matrix is treated as singular.
pub const PIVOT_THRESHOLD: f64 = 1e-15;
