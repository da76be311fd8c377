//! # KCL Core
//!
//! A Modified Nodal Analysis (MNA) engine for circuits built from
//! two-terminal devices.
//!
//! This library provides:
//! - Device models with their characteristic equations and derivatives
//! - A matrix assembler that turns a device list into `G x = I`
//! - Voltage-source elimination that enforces sources as algebraic
//!   constraints without adding branch-current unknowns
//! - A Newton-Raphson driver for circuits containing diodes
//! - Energy-storage devices advanced by an external stepping controller
//!
//! ## Architecture
//!
//! - [`circuit`] - Flat arenas of nodes and devices, plus validation
//! - [`devices`] - Device models (resistors, sources, diodes, L and C)
//! - [`solver`] - Matrix assembly, elimination, linear solve and iteration
//!
//! ## Usage
//!
//! ```
//! use kcl_core::{Circuit, NodeId, Simulator};
//!
//! let mut circuit = Circuit::new(3);
//! circuit.add_voltage_source("V1", NodeId(2), NodeId::GROUND, 9.0)?;
//! circuit.add_resistor("R1", NodeId(2), NodeId(1), 2000.0)?;
//! circuit.add_resistor("R2", NodeId(1), NodeId::GROUND, 1000.0)?;
//!
//! let mut sim = Simulator::new(circuit);
//! let solution = sim.solve()?;
//! assert!((solution.voltage(NodeId(1)).unwrap() - 3.0).abs() < 1e-9);
//! # Ok::<(), kcl_core::KclError>(())
//! ```
//!
//! ## Time stepping
//!
//! Inductors and capacitors carry no clock. The caller owns simulated time
//! and, after each solve, pushes `voltage * dt` (inductor) or
//! `current * dt` (capacitor) into [`devices::EnergyStorage::advance`].
//! Time-varying sources are retargeted with
//! [`devices::VoltageSource::set_voltage`].

pub mod circuit;
pub mod devices;
pub mod error;
pub mod solver;

// Re-export main types for convenience
pub use circuit::{Circuit, DeviceId, NodeId};
pub use error::{KclError, Result};
pub use solver::{Simulator, Solution, SolverConfig};

/// Thermal voltage used by the diode model (25 mV).
pub const THERMAL_VOLTAGE: f64 = 0.025;

/// Diode reverse saturation current (0.1 pA).
pub const SATURATION_CURRENT: f64 = 1e-13;

/// Magnitude bound on diode currents during iteration.
pub const DIODE_CURRENT_LIMIT: f64 = 10.0;
