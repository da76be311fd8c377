//! Circuit graph structure.

use std::collections::HashMap;

use super::types::{DeviceId, Node, NodeId};
use super::validate::validate_device;
use crate::devices::{
    Capacitor, CurrentSource, Device, Diode, EnergyStorage, Inductor, Resistor, VoltageSource,
};
use crate::error::{KclError, Result};

/// A circuit ready for assembly.
///
/// Devices and nodes live in flat arenas. Each device stores its two
/// terminal node ids; each node stores the ids of the devices attached
/// to it.
#[derive(Debug, Clone)]
pub struct Circuit {
    /// All devices in insertion order
    devices: Vec<Device>,

    /// Node table; index 0 is ground
    nodes: Vec<Node>,

    /// Mapping from device names to device ids
    device_map: HashMap<String, DeviceId>,
}

impl Circuit {
    /// Create an empty circuit with nodes `0..node_count`.
    ///
    /// Node 0 is ground. A circuit always has at least the ground node.
    pub fn new(node_count: usize) -> Self {
        let nodes = (0..node_count.max(1)).map(|i| Node::new(NodeId(i))).collect();
        Self {
            devices: Vec::new(),
            nodes,
            device_map: HashMap::new(),
        }
    }

    /// Add a device after validating it against this circuit.
    pub fn add_device(&mut self, device: Device) -> Result<DeviceId> {
        validate_device(&device, self.node_count())?;

        if self.device_map.contains_key(device.name()) {
            return Err(KclError::DuplicateDevice {
                name: device.name().to_string(),
            });
        }

        let id = DeviceId(self.devices.len());
        self.nodes[device.anode().0].devices.push(id);
        self.nodes[device.cathode().0].devices.push(id);
        self.device_map.insert(device.name().to_string(), id);

        log::trace!("added {} '{}' as {}", device.kind(), device.name(), id);
        self.devices.push(device);
        Ok(id)
    }

    pub fn add_resistor(
        &mut self,
        name: impl Into<String>,
        anode: NodeId,
        cathode: NodeId,
        resistance: f64,
    ) -> Result<DeviceId> {
        self.add_device(Device::Resistor(Resistor::new(name, anode, cathode, resistance)))
    }

    pub fn add_current_source(
        &mut self,
        name: impl Into<String>,
        anode: NodeId,
        cathode: NodeId,
        current: f64,
    ) -> Result<DeviceId> {
        self.add_device(Device::CurrentSource(CurrentSource::new(
            name, anode, cathode, current,
        )))
    }

    pub fn add_voltage_source(
        &mut self,
        name: impl Into<String>,
        anode: NodeId,
        cathode: NodeId,
        voltage: f64,
    ) -> Result<DeviceId> {
        self.add_device(Device::VoltageSource(VoltageSource::new(
            name, anode, cathode, voltage,
        )))
    }

    pub fn add_diode(
        &mut self,
        name: impl Into<String>,
        anode: NodeId,
        cathode: NodeId,
    ) -> Result<DeviceId> {
        self.add_device(Device::Diode(Diode::new(name, anode, cathode)))
    }

    pub fn add_inductor(
        &mut self,
        name: impl Into<String>,
        anode: NodeId,
        cathode: NodeId,
        inductance: f64,
    ) -> Result<DeviceId> {
        self.add_device(Device::Inductor(Inductor::new(name, anode, cathode, inductance)))
    }

    pub fn add_capacitor(
        &mut self,
        name: impl Into<String>,
        anode: NodeId,
        cathode: NodeId,
        capacitance: f64,
    ) -> Result<DeviceId> {
        self.add_device(Device::Capacitor(Capacitor::new(
            name,
            anode,
            cathode,
            capacitance,
        )))
    }

    /// Number of nodes, ground included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Size of the reduced system (ground excluded).
    pub fn unknown_count(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn device(&self, id: DeviceId) -> Option<&Device> {
        self.devices.get(id.0)
    }

    /// Find a device id by name.
    pub fn find_device(&self, name: &str) -> Option<DeviceId> {
        self.device_map.get(name).copied()
    }

    /// Check if any device requires Newton-Raphson iteration.
    pub fn has_nonlinear(&self) -> bool {
        self.devices.iter().any(Device::is_nonlinear)
    }

    /// Diodes mutably, for the Newton-Raphson driver.
    pub fn diodes_mut(&mut self) -> impl Iterator<Item = &mut Diode> {
        self.devices.iter_mut().filter_map(|d| match d {
            Device::Diode(diode) => Some(diode),
            _ => None,
        })
    }

    /// Borrow an inductor or capacitor for a stepping controller.
    pub fn energy_storage_mut(&mut self, id: DeviceId) -> Result<&mut dyn EnergyStorage> {
        match self.devices.get_mut(id.0) {
            Some(Device::Inductor(l)) => Ok(l as &mut dyn EnergyStorage),
            Some(Device::Capacitor(c)) => Ok(c as &mut dyn EnergyStorage),
            Some(other) => Err(KclError::device_not_found(format!(
                "{} (a {}, not an energy-storage device)",
                other.name(),
                other.kind()
            ))),
            None => Err(KclError::device_not_found(id.to_string())),
        }
    }

    /// Borrow a voltage source so a controller can retarget it.
    pub fn voltage_source_mut(&mut self, id: DeviceId) -> Result<&mut VoltageSource> {
        match self.devices.get_mut(id.0) {
            Some(Device::VoltageSource(v)) => Ok(v),
            Some(other) => Err(KclError::device_not_found(format!(
                "{} (a {}, not a voltage source)",
                other.name(),
                other.kind()
            ))),
            None => Err(KclError::device_not_found(id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::VoltageDevice;

    #[test]
    fn test_adjacency_lists() {
        let mut circuit = Circuit::new(3);
        let v1 = circuit
            .add_voltage_source("V1", NodeId(2), NodeId::GROUND, 5.0)
            .unwrap();
        let r1 = circuit.add_resistor("R1", NodeId(2), NodeId(1), 1e3).unwrap();
        let r2 = circuit.add_resistor("R2", NodeId(1), NodeId(0), 1e3).unwrap();

        assert_eq!(circuit.node_count(), 3);
        assert_eq!(circuit.unknown_count(), 2);
        assert_eq!(circuit.nodes()[0].devices, vec![v1, r2]);
        assert_eq!(circuit.nodes()[1].devices, vec![r1, r2]);
        assert_eq!(circuit.nodes()[2].devices, vec![v1, r1]);
        assert!(circuit.nodes()[0].is_ground());
    }

    #[test]
    fn test_rejected_device_leaves_no_trace() {
        let mut circuit = Circuit::new(2);
        assert!(circuit.add_resistor("R1", NodeId(1), NodeId(5), 1e3).is_err());
        assert!(circuit.add_resistor("R2", NodeId(1), NodeId(0), 0.0).is_err());
        assert!(circuit.devices().is_empty());
        assert!(circuit.nodes().iter().all(|n| n.devices.is_empty()));
    }

    #[test]
    fn test_non_finite_source_rejected() {
        let mut circuit = Circuit::new(2);
        let err = circuit
            .add_voltage_source("V1", NodeId(1), NodeId(0), f64::NAN)
            .unwrap_err();
        assert!(matches!(err, KclError::DegenerateDevice { ref device, .. } if device == "V1"));
        assert!(circuit.find_device("V1").is_none());
    }

    #[test]
    fn test_duplicate_name() {
        let mut circuit = Circuit::new(2);
        circuit.add_resistor("R1", NodeId(1), NodeId(0), 1e3).unwrap();
        let err = circuit.add_resistor("R1", NodeId(1), NodeId(0), 2e3).unwrap_err();
        assert_eq!(
            err,
            KclError::DuplicateDevice {
                name: "R1".to_string()
            }
        );
    }

    #[test]
    fn test_find_and_has_nonlinear() {
        let mut circuit = Circuit::new(2);
        circuit.add_resistor("R1", NodeId(1), NodeId(0), 1e3).unwrap();
        assert!(!circuit.has_nonlinear());

        let d1 = circuit.add_diode("D1", NodeId(1), NodeId(0)).unwrap();
        assert!(circuit.has_nonlinear());
        assert_eq!(circuit.find_device("D1"), Some(d1));
        assert_eq!(circuit.find_device("D2"), None);
    }

    #[test]
    fn test_typed_accessors() {
        let mut circuit = Circuit::new(2);
        let r1 = circuit.add_resistor("R1", NodeId(1), NodeId(0), 1e3).unwrap();
        let c1 = circuit.add_capacitor("C1", NodeId(1), NodeId(0), 1e-6).unwrap();

        circuit.energy_storage_mut(c1).unwrap().advance(2e-6);
        assert!(circuit.energy_storage_mut(r1).is_err());
        assert!(circuit.voltage_source_mut(c1).is_err());
        assert!(circuit.voltage_source_mut(DeviceId(9)).is_err());
    }

    #[test]
    fn test_mutable_access_keeps_identity() {
        let mut circuit = Circuit::new(3);
        let v1 = circuit
            .add_voltage_source("V1", NodeId(2), NodeId(1), 5.0)
            .unwrap();

        let source = circuit.voltage_source_mut(v1).unwrap();
        source.set_voltage(7.0).unwrap();
        assert!(source.set_voltage(f64::NAN).is_err());

        let device = circuit.device(v1).unwrap();
        assert_eq!(device.name(), "V1");
        assert_eq!(device.nodes(), [NodeId(2), NodeId(1)]);
        assert_eq!(device.nominal_value(), 5.0);
        assert!(validate_device(device, circuit.node_count()).is_ok());
        assert_eq!(
            device.as_voltage_device().unwrap().voltage(&[0.0; 3]),
            7.0
        );
    }
}
