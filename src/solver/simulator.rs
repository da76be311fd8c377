//! Main simulator interface.

use crate::circuit::{Circuit, DeviceId, NodeId};
use crate::error::{KclError, Result};

use super::linear::{LinearSolver, LuSolver};
use super::mna::{assemble_reduced, with_ground, MnaSystem};
use super::{NewtonRaphson, DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE, PIVOT_THRESHOLD};

/// Configuration for the solver.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Maximum Newton-Raphson iterations for nonlinear devices.
    pub max_iterations: usize,
    /// Convergence tolerance for Newton-Raphson (volts).
    pub tolerance: f64,
    /// Pivot magnitude below which the system is reported singular.
    pub pivot_threshold: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
            pivot_threshold: PIVOT_THRESHOLD,
        }
    }
}

impl SolverConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum Newton-Raphson iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the convergence tolerance (in volts).
    ///
    /// The tolerance bounds the largest change in any diode voltage
    /// between consecutive iterations.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the singular-pivot threshold.
    pub fn with_pivot_threshold(mut self, pivot_threshold: f64) -> Self {
        self.pivot_threshold = pivot_threshold;
        self
    }

    /// Check that the configuration can drive a solve.
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(KclError::invalid_config("max_iterations must be at least 1"));
        }
        if !(self.tolerance > 0.0 && self.tolerance.is_finite()) {
            return Err(KclError::invalid_config(format!(
                "tolerance must be positive and finite, got {}",
                self.tolerance
            )));
        }
        if !(self.pivot_threshold >= 0.0 && self.pivot_threshold.is_finite()) {
            return Err(KclError::invalid_config(format!(
                "pivot_threshold must be non-negative and finite, got {}",
                self.pivot_threshold
            )));
        }
        Ok(())
    }
}

/// Node voltages from one successful solve.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Voltage of every node, indexed by node id; entry 0 is ground
    pub voltages: Vec<f64>,
    /// Newton-Raphson iterations used (1 for a linear circuit)
    pub iterations: usize,
}

impl Solution {
    /// Voltage at a node, or `None` if the node is not in this circuit.
    pub fn voltage(&self, node: NodeId) -> Option<f64> {
        self.voltages.get(node.0).copied()
    }

    /// Voltage from `anode` to `cathode`.
    pub fn voltage_across(&self, anode: NodeId, cathode: NodeId) -> Option<f64> {
        Some(self.voltage(anode)? - self.voltage(cathode)?)
    }
}

/// The circuit simulator.
///
/// Owns the circuit for the duration of each solve. Between solves a
/// stepping controller may reach the devices through
/// [`circuit_mut`](Self::circuit_mut).
pub struct Simulator<S: LinearSolver = LuSolver> {
    /// The circuit being solved
    circuit: Circuit,
    /// Solver settings
    config: SolverConfig,
    /// Linear solve service
    solver: S,
    /// Result of the last successful solve
    last_solution: Option<Solution>,
}

impl Simulator<LuSolver> {
    /// Create a new simulator for the given circuit with default configuration.
    pub fn new(circuit: Circuit) -> Self {
        Self::with_config(circuit, SolverConfig::default())
    }

    /// Create a new simulator for the given circuit with custom configuration.
    pub fn with_config(circuit: Circuit, config: SolverConfig) -> Self {
        let solver = LuSolver::new(config.pivot_threshold);
        Self::with_solver(circuit, config, solver)
    }
}

impl<S: LinearSolver> Simulator<S> {
    /// Create a simulator that delegates linear solves to `solver`.
    pub fn with_solver(circuit: Circuit, config: SolverConfig, solver: S) -> Self {
        Self {
            circuit,
            config,
            solver,
            last_solution: None,
        }
    }

    /// Solve for all node voltages.
    ///
    /// Linear circuits take one assemble-and-solve pass. Circuits with
    /// diodes go through Newton-Raphson iteration, which leaves every
    /// diode at its converged operating point. A failed solve keeps no
    /// partial result.
    pub fn solve(&mut self) -> Result<Solution> {
        self.config.validate()?;
        self.last_solution = None;

        let (voltages, iterations) = if self.circuit.has_nonlinear() {
            NewtonRaphson::with_config(self.config.max_iterations, self.config.tolerance)
                .solve(&mut self.circuit, &mut self.solver)?
        } else {
            let system = assemble_reduced(&self.circuit)?;
            (with_ground(&self.solver.solve(&system)?), 1)
        };

        log::debug!(
            "solved {} nodes in {} iteration(s)",
            self.circuit.node_count(),
            iterations
        );

        let solution = Solution {
            voltages,
            iterations,
        };
        self.last_solution = Some(solution.clone());
        Ok(solution)
    }

    /// The reduced system for the circuit's present state, without solving.
    pub fn assemble(&self) -> Result<MnaSystem> {
        assemble_reduced(&self.circuit)
    }

    /// Voltage across a device in the last solution.
    pub fn device_voltage(&self, id: DeviceId) -> Option<f64> {
        let device = self.circuit.device(id)?;
        let solution = self.last_solution.as_ref()?;
        solution.voltage_across(device.anode(), device.cathode())
    }

    pub fn last_solution(&self) -> Option<&Solution> {
        self.last_solution.as_ref()
    }

    /// Get a reference to the circuit.
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Mutable access for a stepping controller between solves.
    pub fn circuit_mut(&mut self) -> &mut Circuit {
        &mut self.circuit
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Take the circuit back.
    pub fn into_circuit(self) -> Circuit {
        self.circuit
    }
}
