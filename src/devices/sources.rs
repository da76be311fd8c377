//! Voltage and current sources.

use super::{CurrentDevice, VoltageDevice};
use crate::circuit::NodeId;
use crate::error::{KclError, Result};

/// A voltage source.
///
/// The source enforces V_anode - V_cathode = V. It adds no unknown to the
/// system: the assembler eliminates it as a constraint row.
#[derive(Debug, Clone)]
pub struct VoltageSource {
    name: String,
    nodes: [NodeId; 2], // [positive, negative]
    dc_value: f64,
    /// Present value (may be retargeted between solves)
    current_value: f64,
}

impl VoltageSource {
    /// Create a new voltage source.
    pub fn new(name: impl Into<String>, anode: NodeId, cathode: NodeId, dc_value: f64) -> Self {
        Self {
            name: name.into(),
            nodes: [anode, cathode],
            dc_value,
            current_value: dc_value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Terminals as `[anode, cathode]`.
    pub fn nodes(&self) -> [NodeId; 2] {
        self.nodes
    }

    /// The value the source was created with.
    pub fn dc_value(&self) -> f64 {
        self.dc_value
    }

    /// Set the value used by the next solve.
    ///
    /// A non-finite value is rejected and the present value is kept.
    pub fn set_voltage(&mut self, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(KclError::degenerate_device(
                &self.name,
                format!("source value must be finite, got {value}"),
            ));
        }
        self.current_value = value;
        Ok(())
    }

    /// Get the present source voltage.
    pub fn present_voltage(&self) -> f64 {
        self.current_value
    }
}

impl VoltageDevice for VoltageSource {
    fn voltage(&self, _node_voltages: &[f64]) -> f64 {
        self.current_value
    }
}

/// A current source.
///
/// Current flows from anode to cathode through the source: it is drawn
/// out of the anode node and delivered into the cathode node.
#[derive(Debug, Clone)]
pub struct CurrentSource {
    name: String,
    nodes: [NodeId; 2],
    dc_value: f64,
}

impl CurrentSource {
    /// Create a new current source.
    pub fn new(name: impl Into<String>, anode: NodeId, cathode: NodeId, dc_value: f64) -> Self {
        Self {
            name: name.into(),
            nodes: [anode, cathode],
            dc_value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Terminals as `[anode, cathode]`.
    pub fn nodes(&self) -> [NodeId; 2] {
        self.nodes
    }

    pub fn dc_value(&self) -> f64 {
        self.dc_value
    }
}

impl CurrentDevice for CurrentSource {
    fn current(&self, _node_voltages: &[f64]) -> f64 {
        self.dc_value
    }

    fn current_derivative(&self, node_voltages: &[f64]) -> Vec<f64> {
        vec![0.0; node_voltages.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voltage_source_ignores_node_voltages() {
        let mut v = VoltageSource::new("V1", NodeId(1), NodeId(0), 3.3);
        assert_eq!(v.voltage(&[0.0, 12.0]), 3.3);

        v.set_voltage(-1.5).unwrap();
        assert_eq!(v.voltage(&[0.0, 12.0]), -1.5);
        assert_eq!(v.dc_value(), 3.3);
    }

    #[test]
    fn test_set_voltage_rejects_non_finite() {
        let mut v = VoltageSource::new("V1", NodeId(1), NodeId(0), 3.3);
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = v.set_voltage(bad).unwrap_err();
            assert!(matches!(err, KclError::DegenerateDevice { .. }));
        }
        assert_eq!(v.present_voltage(), 3.3);
    }

    #[test]
    fn test_current_source_is_constant() {
        let i = CurrentSource::new("I1", NodeId(0), NodeId(2), 2e-3);
        let v = [0.0, 1.0, -4.0];
        assert_eq!(i.current(&v), 2e-3);
        assert_eq!(i.current_derivative(&v), vec![0.0; 3]);
    }
}
