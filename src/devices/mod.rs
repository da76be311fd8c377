//! Device models for circuit simulation.
//!
//! This module provides models for all supported two-terminal devices:
//! - Linear: Resistor
//! - Sources: Voltage Source, Current Source
//! - Nonlinear: Diode
//! - Energy storage: Inductor, Capacitor
//!
//! Each device exposes its characteristic equation through one of the
//! [`CurrentDevice`] or [`VoltageDevice`] traits. The assembler dispatches
//! over the closed [`Device`] enum.

mod diode;
mod linear;
mod sources;

pub use diode::Diode;
pub use linear::{Capacitor, Inductor, Resistor};
pub use sources::{CurrentSource, VoltageSource};

use std::fmt;

use crate::circuit::NodeId;

/// A device whose current is a function of node voltages.
pub trait CurrentDevice {
    /// Current flowing anode to cathode.
    ///
    /// `node_voltages` is indexed by node id; only the device's own two
    /// terminals are read.
    fn current(&self, node_voltages: &[f64]) -> f64;

    /// Partial derivative of [`current`](Self::current) with respect to
    /// every node voltage. Nonzero only at the anode and cathode entries.
    fn current_derivative(&self, node_voltages: &[f64]) -> Vec<f64>;
}

/// A device that fixes the voltage between its terminals.
pub trait VoltageDevice {
    /// Anode-to-cathode voltage.
    fn voltage(&self, node_voltages: &[f64]) -> f64;
}

/// A device whose behavior comes from an accumulated integral.
///
/// The stepping controller is the only caller of [`advance`](Self::advance).
pub trait EnergyStorage {
    /// Add one time step's worth of integral.
    fn advance(&mut self, increment: f64);

    /// The accumulated integral.
    fn integral(&self) -> f64;
}

/// Device kind tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Resistor,
    CurrentSource,
    VoltageSource,
    Diode,
    Inductor,
    Capacitor,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeviceKind::Resistor => "resistor",
            DeviceKind::CurrentSource => "current source",
            DeviceKind::VoltageSource => "voltage source",
            DeviceKind::Diode => "diode",
            DeviceKind::Inductor => "inductor",
            DeviceKind::Capacitor => "capacitor",
        };
        f.write_str(s)
    }
}

/// A circuit device.
#[derive(Debug, Clone)]
pub enum Device {
    Resistor(Resistor),
    CurrentSource(CurrentSource),
    VoltageSource(VoltageSource),
    Diode(Diode),
    Inductor(Inductor),
    Capacitor(Capacitor),
}

impl Device {
    pub fn kind(&self) -> DeviceKind {
        match self {
            Device::Resistor(_) => DeviceKind::Resistor,
            Device::CurrentSource(_) => DeviceKind::CurrentSource,
            Device::VoltageSource(_) => DeviceKind::VoltageSource,
            Device::Diode(_) => DeviceKind::Diode,
            Device::Inductor(_) => DeviceKind::Inductor,
            Device::Capacitor(_) => DeviceKind::Capacitor,
        }
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        match self {
            Device::Resistor(r) => r.name(),
            Device::CurrentSource(i) => i.name(),
            Device::VoltageSource(v) => v.name(),
            Device::Diode(d) => d.name(),
            Device::Inductor(l) => l.name(),
            Device::Capacitor(c) => c.name(),
        }
    }

    /// Terminal nodes as `[anode, cathode]`.
    pub fn nodes(&self) -> [NodeId; 2] {
        match self {
            Device::Resistor(r) => r.nodes(),
            Device::CurrentSource(i) => i.nodes(),
            Device::VoltageSource(v) => v.nodes(),
            Device::Diode(d) => d.nodes(),
            Device::Inductor(l) => l.nodes(),
            Device::Capacitor(c) => c.nodes(),
        }
    }

    pub fn anode(&self) -> NodeId {
        self.nodes()[0]
    }

    pub fn cathode(&self) -> NodeId {
        self.nodes()[1]
    }

    /// The value the device was constructed with (ohms, amps, volts,
    /// henries or farads). Diodes report their saturation current.
    pub fn nominal_value(&self) -> f64 {
        match self {
            Device::Resistor(r) => r.resistance(),
            Device::CurrentSource(i) => i.dc_value(),
            Device::VoltageSource(v) => v.dc_value(),
            Device::Diode(d) => d.saturation_current(),
            Device::Inductor(l) => l.inductance(),
            Device::Capacitor(c) => c.capacitance(),
        }
    }

    /// Check if this device is nonlinear (requires Newton-Raphson iteration).
    pub fn is_nonlinear(&self) -> bool {
        matches!(self, Device::Diode(_))
    }

    /// View as a current-producing device, if it is one.
    pub fn as_current_device(&self) -> Option<&dyn CurrentDevice> {
        match self {
            Device::Resistor(r) => Some(r as &dyn CurrentDevice),
            Device::CurrentSource(i) => Some(i as &dyn CurrentDevice),
            Device::Diode(d) => Some(d as &dyn CurrentDevice),
            Device::Inductor(l) => Some(l as &dyn CurrentDevice),
            Device::VoltageSource(_) | Device::Capacitor(_) => None,
        }
    }

    /// View as a voltage-producing device, if it is one.
    pub fn as_voltage_device(&self) -> Option<&dyn VoltageDevice> {
        match self {
            Device::VoltageSource(v) => Some(v as &dyn VoltageDevice),
            Device::Capacitor(c) => Some(c as &dyn VoltageDevice),
            _ => None,
        }
    }
}

/// Voltage across two terminals, read from a full node-voltage vector.
pub(crate) fn terminal_voltage(nodes: [NodeId; 2], node_voltages: &[f64]) -> f64 {
    node_voltages[nodes[0].0] - node_voltages[nodes[1].0]
}

/// Derivative vector that is `+g` at the anode and `-g` at the cathode.
pub(crate) fn two_terminal_derivative(nodes: [NodeId; 2], size: usize, g: f64) -> Vec<f64> {
    let mut derivative = vec![0.0; size];
    derivative[nodes[0].0] = g;
    derivative[nodes[1].0] = -g;
    derivative
}
