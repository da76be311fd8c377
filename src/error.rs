//! Error types for the KCL solver.
//!
//! This module provides a unified error type [`KclError`] that covers
//! circuit construction, matrix assembly, linear solving and
//! Newton-Raphson iteration.

use thiserror::Error;

/// Result type alias using [`KclError`].
pub type Result<T> = std::result::Result<T, KclError>;

/// Unified error type for all solver operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KclError {
    // ============ Construction Errors ============
    /// Terminal index out of range, or both terminals on the same node
    #[error("Invalid topology for device '{device}': {message}")]
    InvalidTopology { device: String, message: String },

    /// Device value that cannot be stamped (e.g. a zero-ohm resistor)
    #[error("Degenerate device '{device}': {message}")]
    DegenerateDevice { device: String, message: String },

    /// Two devices share a name
    #[error("Duplicate device name '{name}'")]
    DuplicateDevice { name: String },

    /// No device with this name or id, or the device has another kind
    #[error("Device '{name}' not found")]
    DeviceNotFound { name: String },

    // ============ Solve Errors ============
    /// Reduced matrix is not invertible
    #[error("Singular system - redundant or contradictory voltage sources, or a node with no path to ground")]
    SingularSystem,

    /// Newton-Raphson iteration did not converge
    #[error("Newton-Raphson did not converge after {iterations} iterations (last diode step: {max_delta:.2e} V)")]
    NonConvergence { iterations: usize, max_delta: f64 },

    /// Invalid solver configuration
    #[error("Invalid solver configuration: {message}")]
    InvalidConfig { message: String },
}

impl KclError {
    /// Create an invalid topology error
    pub fn invalid_topology(device: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidTopology {
            device: device.into(),
            message: message.into(),
        }
    }

    /// Create a degenerate device error
    pub fn degenerate_device(device: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DegenerateDevice {
            device: device.into(),
            message: message.into(),
        }
    }

    /// Create a device-not-found error
    pub fn device_not_found(name: impl Into<String>) -> Self {
        Self::DeviceNotFound { name: name.into() }
    }

    /// Create a non-convergence error
    pub fn non_convergence(iterations: usize, max_delta: f64) -> Self {
        Self::NonConvergence {
            iterations,
            max_delta,
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = KclError::invalid_topology("R1", "anode and cathode are both node 2");
        assert_eq!(
            err.to_string(),
            "Invalid topology for device 'R1': anode and cathode are both node 2"
        );

        let err = KclError::non_convergence(100, 3.2e-3);
        assert!(err.to_string().contains("100 iterations"));
        assert!(err.to_string().contains("3.20e-3"));
    }
}
