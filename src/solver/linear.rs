//! Dense linear solve.

use super::mna::MnaSystem;
use super::PIVOT_THRESHOLD;
use crate::error::{KclError, Result};

/// Solves G x = I for a square system.
///
/// The solver is a black box to the assembler and the Newton-Raphson
/// driver; any implementation must report a non-invertible matrix as
/// [`KclError::SingularSystem`].
pub trait LinearSolver {
    fn solve(&mut self, system: &MnaSystem) -> Result<Vec<f64>>;
}

/// LU decomposition with partial pivoting.
///
/// Factor storage is reused between calls of the same size.
#[derive(Debug, Clone)]
pub struct LuSolver {
    /// LU factors of the last matrix (row-major)
    lu: Vec<f64>,
    /// Pivot indices for the LU decomposition
    pivots: Vec<usize>,
    /// Pivots smaller than this in magnitude mean a singular matrix
    pivot_threshold: f64,
}

impl Default for LuSolver {
    fn default() -> Self {
        Self::new(PIVOT_THRESHOLD)
    }
}

impl LuSolver {
    pub fn new(pivot_threshold: f64) -> Self {
        Self {
            lu: Vec::new(),
            pivots: Vec::new(),
            pivot_threshold,
        }
    }

    /// Perform LU decomposition with partial pivoting.
    fn factor(&mut self, system: &MnaSystem) -> Result<()> {
        let n = system.size;
        self.lu.clear();
        self.lu.extend_from_slice(&system.a);
        self.pivots.clear();
        self.pivots.extend(0..n);

        for k in 0..n {
            // Find pivot
            let mut max_val = self.lu[k * n + k].abs();
            let mut max_row = k;

            for i in (k + 1)..n {
                let val = self.lu[i * n + k].abs();
                if val > max_val {
                    max_val = val;
                    max_row = i;
                }
            }

            if max_val < self.pivot_threshold {
                log::warn!("zero pivot in column {} of {}x{} system", k, n, n);
                return Err(KclError::SingularSystem);
            }

            // Swap rows if needed
            if max_row != k {
                self.pivots.swap(k, max_row);
                for j in 0..n {
                    self.lu.swap(k * n + j, max_row * n + j);
                }
            }

            // Eliminate
            let pivot = self.lu[k * n + k];
            for i in (k + 1)..n {
                let factor = self.lu[i * n + k] / pivot;
                self.lu[i * n + k] = factor;
                for j in (k + 1)..n {
                    self.lu[i * n + j] -= factor * self.lu[k * n + j];
                }
            }
        }

        Ok(())
    }

    /// Solve using the factors from [`factor`](Self::factor).
    fn substitute(&self, z: &[f64]) -> Vec<f64> {
        let n = z.len();

        // Apply pivot permutation to z
        let mut x: Vec<f64> = self.pivots.iter().map(|&p| z[p]).collect();

        // Forward substitution (L * y = Pb)
        for i in 0..n {
            for j in 0..i {
                x[i] -= self.lu[i * n + j] * x[j];
            }
        }

        // Back substitution (U * x = y)
        for i in (0..n).rev() {
            for j in (i + 1)..n {
                x[i] -= self.lu[i * n + j] * x[j];
            }
            x[i] /= self.lu[i * n + i];
        }

        x
    }
}

impl LinearSolver for LuSolver {
    fn solve(&mut self, system: &MnaSystem) -> Result<Vec<f64>> {
        self.factor(system)?;
        let x = self.substitute(&system.z);

        if x.iter().any(|v| !v.is_finite()) {
            return Err(KclError::SingularSystem);
        }
        Ok(x)
    }
}
