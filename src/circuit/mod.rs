//! Circuit graph representation and validation.
//!
//! This module provides the circuit container consumed by the solver.
//! The [`Circuit`] struct owns all devices and nodes and exposes the
//! per-node adjacency lists used during matrix assembly.

mod graph;
mod types;
mod validate;

pub use graph::Circuit;
pub use types::*;
pub use validate::validate_device;
