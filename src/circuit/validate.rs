//! Device validation.

use crate::devices::{Device, DeviceKind};
use crate::error::{KclError, Result};

/// Validate a device against a circuit with `node_count` nodes.
///
/// Checks:
/// - Both terminals are valid node indices
/// - Anode and cathode are distinct
/// - The nominal value can be stamped (finite, nonzero resistance,
///   positive inductance and capacitance)
pub fn validate_device(device: &Device, node_count: usize) -> Result<()> {
    let name = device.name();
    let (anode, cathode) = (device.anode(), device.cathode());

    for terminal in [anode, cathode] {
        if terminal.0 >= node_count {
            return Err(KclError::invalid_topology(
                name,
                format!("terminal {} is outside 0..{}", terminal.0, node_count),
            ));
        }
    }

    if anode == cathode {
        return Err(KclError::invalid_topology(
            name,
            format!("anode and cathode are both node {}", anode.0),
        ));
    }

    let value = device.nominal_value();
    if !value.is_finite() {
        return Err(KclError::degenerate_device(name, "value must be finite"));
    }

    match device.kind() {
        DeviceKind::Resistor if value == 0.0 => Err(KclError::degenerate_device(
            name,
            "zero resistance would need infinite conductance",
        )),
        DeviceKind::Inductor | DeviceKind::Capacitor if value <= 0.0 => Err(
            KclError::degenerate_device(name, "energy-storage value must be positive"),
        ),
        _ => Ok(()),
    }
}
