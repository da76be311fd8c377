//! Newton-Raphson iteration for circuits with diodes.

use super::linear::LinearSolver;
use super::mna::{assemble_reduced, with_ground};
use super::{DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE};
use crate::circuit::Circuit;
use crate::error::{KclError, Result};

/// Newton-Raphson solver for nonlinear circuits.
#[derive(Debug, Clone)]
pub struct NewtonRaphson {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Convergence tolerance on the diode voltage step (volts)
    pub tolerance: f64,
}

impl Default for NewtonRaphson {
    fn default() -> Self {
        Self::new()
    }
}

impl NewtonRaphson {
    /// Create a new Newton-Raphson solver.
    pub fn new() -> Self {
        Self::with_config(DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE)
    }

    /// Create a new Newton-Raphson solver with custom settings.
    pub fn with_config(max_iterations: usize, tolerance: f64) -> Self {
        Self {
            max_iterations,
            tolerance,
        }
    }

    /// Solve the nonlinear circuit using Newton-Raphson iteration.
    ///
    /// Every diode starts from `vd = 0, id0 = 0`. Each pass stamps the
    /// diodes' companion models, solves, and relinearizes every diode at
    /// its new terminal voltage. Iteration stops once no diode voltage
    /// moved by more than the tolerance.
    ///
    /// Returns the full node-voltage vector and the number of iterations
    /// used. On success the diodes hold their final operating points.
    pub fn solve<S: LinearSolver + ?Sized>(
        &self,
        circuit: &mut Circuit,
        solver: &mut S,
    ) -> Result<(Vec<f64>, usize)> {
        for diode in circuit.diodes_mut() {
            diode.reset();
        }

        let mut max_delta = f64::INFINITY;

        for iter in 0..self.max_iterations {
            // Rebuild and solve the linearized system
            let system = assemble_reduced(circuit)?;
            let voltages = with_ground(&solver.solve(&system)?);

            max_delta = self.relinearize(circuit, &voltages);
            log::debug!("newton iteration {}: max diode step {:.3e} V", iter + 1, max_delta);

            if max_delta < self.tolerance {
                return Ok((voltages, iter + 1));
            }
        }

        log::warn!(
            "Newton-Raphson did not converge within {} iterations",
            self.max_iterations
        );
        Err(KclError::non_convergence(self.max_iterations, max_delta))
    }

    /// Move every diode to the voltage across it in `voltages`.
    ///
    /// Returns the largest change in any diode voltage.
    fn relinearize(&self, circuit: &mut Circuit, voltages: &[f64]) -> f64 {
        let mut max_delta = 0.0f64;
        for d in circuit.diodes_mut() {
            let [anode, cathode] = d.nodes();
            let vd = voltages[anode.0] - voltages[cathode.0];
            max_delta = max_delta.max((vd - d.vd()).abs());
            d.relinearize(vd);
        }
        max_delta
    }
}
