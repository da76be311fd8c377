//! Linear passive devices: Resistor, Inductor, Capacitor.

use super::{
    terminal_voltage, two_terminal_derivative, CurrentDevice, EnergyStorage, VoltageDevice,
};
use crate::circuit::NodeId;

/// A resistor.
#[derive(Debug, Clone)]
pub struct Resistor {
    name: String,
    nodes: [NodeId; 2], // [anode, cathode]
    /// Resistance in ohms; never zero once the device is in a circuit
    resistance: f64,
}

impl Resistor {
    /// Create a new resistor.
    pub fn new(name: impl Into<String>, anode: NodeId, cathode: NodeId, resistance: f64) -> Self {
        Self {
            name: name.into(),
            nodes: [anode, cathode],
            resistance,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Terminals as `[anode, cathode]`.
    pub fn nodes(&self) -> [NodeId; 2] {
        self.nodes
    }

    pub fn resistance(&self) -> f64 {
        self.resistance
    }

    /// Get the conductance (1/R).
    pub fn conductance(&self) -> f64 {
        1.0 / self.resistance
    }
}

impl CurrentDevice for Resistor {
    fn current(&self, node_voltages: &[f64]) -> f64 {
        terminal_voltage(self.nodes, node_voltages) / self.resistance
    }

    fn current_derivative(&self, node_voltages: &[f64]) -> Vec<f64> {
        two_terminal_derivative(self.nodes, node_voltages.len(), self.conductance())
    }
}

/// An inductor.
///
/// The inductor holds the integral of its terminal voltage. Its current
/// follows from `L dI/dt = V`:
///   I = (integral of V dt) / L
///
/// The stepping controller adds `V * dt` after every solve, which is a
/// forward-Euler discretization. During a solve the inductor behaves as
/// a current source of its present current.
#[derive(Debug, Clone)]
pub struct Inductor {
    name: String,
    nodes: [NodeId; 2],
    inductance: f64,
    /// Integral of (V_anode - V_cathode) over time
    integral: f64,
}

impl Inductor {
    /// Create a new inductor with no stored flux.
    pub fn new(name: impl Into<String>, anode: NodeId, cathode: NodeId, inductance: f64) -> Self {
        Self {
            name: name.into(),
            nodes: [anode, cathode],
            inductance,
            integral: 0.0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Terminals as `[anode, cathode]`.
    pub fn nodes(&self) -> [NodeId; 2] {
        self.nodes
    }

    pub fn inductance(&self) -> f64 {
        self.inductance
    }

    /// Present inductor current, anode to cathode.
    pub fn present_current(&self) -> f64 {
        self.integral / self.inductance
    }
}

impl CurrentDevice for Inductor {
    fn current(&self, _node_voltages: &[f64]) -> f64 {
        self.present_current()
    }

    fn current_derivative(&self, node_voltages: &[f64]) -> Vec<f64> {
        // Current depends on history only, not on the present voltages.
        vec![0.0; node_voltages.len()]
    }
}

impl EnergyStorage for Inductor {
    fn advance(&mut self, increment: f64) {
        self.integral += increment;
    }

    fn integral(&self) -> f64 {
        self.integral
    }
}

/// A capacitor.
///
/// The capacitor holds the integral of its current. Its voltage follows
/// from `C dV/dt = I`:
///   V = (integral of I dt) / C
///
/// The stepping controller adds `I * dt` after every solve. During a
/// solve the capacitor behaves as a voltage source of its present voltage.
#[derive(Debug, Clone)]
pub struct Capacitor {
    name: String,
    nodes: [NodeId; 2],
    capacitance: f64,
    /// Integral of the anode-to-cathode current over time
    integral: f64,
}

impl Capacitor {
    /// Create a new, discharged capacitor.
    pub fn new(name: impl Into<String>, anode: NodeId, cathode: NodeId, capacitance: f64) -> Self {
        Self {
            name: name.into(),
            nodes: [anode, cathode],
            capacitance,
            integral: 0.0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Terminals as `[anode, cathode]`.
    pub fn nodes(&self) -> [NodeId; 2] {
        self.nodes
    }

    pub fn capacitance(&self) -> f64 {
        self.capacitance
    }

    /// Present capacitor voltage, anode minus cathode.
    pub fn present_voltage(&self) -> f64 {
        self.integral / self.capacitance
    }
}

impl VoltageDevice for Capacitor {
    fn voltage(&self, _node_voltages: &[f64]) -> f64 {
        self.present_voltage()
    }
}

impl EnergyStorage for Capacitor {
    fn advance(&mut self, increment: f64) {
        self.integral += increment;
    }

    fn integral(&self) -> f64 {
        self.integral
    }
}
