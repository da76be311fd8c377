//! MNA matrix assembly and voltage-source elimination.

use crate::circuit::{Circuit, DeviceId, NodeId};
use crate::devices::Device;
use crate::error::{KclError, Result};

/// Dense linear system G x = I.
#[derive(Debug, Clone, PartialEq)]
pub struct MnaSystem {
    /// Conductance matrix G (row-major)
    pub a: Vec<f64>,
    /// Source vector I
    pub z: Vec<f64>,
    /// Matrix dimension
    pub size: usize,
}

impl MnaSystem {
    /// Create a zeroed system of the given dimension.
    pub fn new(size: usize) -> Self {
        Self {
            a: vec![0.0; size * size],
            z: vec![0.0; size],
            size,
        }
    }

    /// Get matrix element at (row, col).
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.a[row * self.size + col]
    }

    /// Set matrix element at (row, col).
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.a[row * self.size + col] = value;
    }

    /// Add to matrix element at (row, col).
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        self.a[row * self.size + col] += value;
    }

    /// Get source vector element.
    pub fn source(&self, row: usize) -> f64 {
        self.z[row]
    }

    /// Add to source vector element.
    pub fn add_source(&mut self, row: usize, value: f64) {
        self.z[row] += value;
    }

    /// One row of G.
    pub fn row(&self, row: usize) -> &[f64] {
        &self.a[row * self.size..(row + 1) * self.size]
    }

    /// Stamp the KCL contribution of a conductance G seen from `node`,
    /// whose other end is `other`:
    ///   A[node,node]  += G
    ///   A[node,other] -= G
    ///
    /// Visiting both endpoints produces the usual four-entry stamp.
    pub fn stamp_conductance(&mut self, node: usize, other: usize, g: f64) {
        self.add(node, node, g);
        self.add(node, other, -g);
    }

    /// Stamp a current `i` flowing from `anode` to `cathode` into the KCL
    /// row of `node`. Current leaving the node is subtracted from I(node).
    pub fn stamp_current_source(&mut self, node: usize, anode: usize, cathode: usize, i: f64) {
        if node == anode {
            self.add_source(node, -i);
        } else if node == cathode {
            self.add_source(node, i);
        }
    }

    /// Zero a row of G and its source entry.
    pub fn zero_row(&mut self, row: usize) {
        let n = self.size;
        self.a[row * n..(row + 1) * n].fill(0.0);
        self.z[row] = 0.0;
    }

    /// Row `dst` += row `src`, source vector included.
    pub fn merge_row(&mut self, dst: usize, src: usize) {
        let n = self.size;
        for j in 0..n {
            self.a[dst * n + j] += self.a[src * n + j];
        }
        self.z[dst] += self.z[src];
    }

    /// Overwrite row `row` with the constraint V[anode] - V[cathode] = voltage.
    ///
    /// V(0) is fixed at zero, so column 0 is never written.
    pub fn set_constraint(&mut self, row: usize, anode: usize, cathode: usize, voltage: f64) {
        self.zero_row(row);
        if anode != 0 {
            self.add(row, anode, 1.0);
        }
        if cathode != 0 {
            self.add(row, cathode, -1.0);
        }
        self.z[row] = voltage;
    }

    /// Drop row and column 0 (ground).
    pub fn without_ground(&self) -> MnaSystem {
        let n = self.size;
        if n == 0 {
            return MnaSystem::new(0);
        }
        let mut reduced = MnaSystem::new(n - 1);
        for i in 1..n {
            for j in 1..n {
                reduced.set(i - 1, j - 1, self.get(i, j));
            }
            reduced.z[i - 1] = self.z[i];
        }
        reduced
    }
}

/// A voltage constraint V[anode] - V[cathode] = voltage collected during
/// stamping and enforced by [`eliminate_voltage_sources`].
#[derive(Debug, Clone, PartialEq)]
pub struct VoltageConstraint {
    pub device: DeviceId,
    pub anode: NodeId,
    pub cathode: NodeId,
    pub voltage: f64,
}

/// Stamp the KCL rows of every non-ground node.
///
/// Returns the raw N x N system (row 0 left empty) and the voltage
/// constraints, in device order, for the elimination pass.
pub fn stamp_kcl(circuit: &Circuit) -> (MnaSystem, Vec<VoltageConstraint>) {
    let mut system = MnaSystem::new(circuit.node_count());

    for node in circuit.nodes().iter().filter(|n| !n.is_ground()) {
        let r = node.id.0;
        for &id in &node.devices {
            let Some(device) = circuit.device(id) else {
                continue;
            };
            let [anode, cathode] = device.nodes();
            let (a, c) = (anode.0, cathode.0);
            let other = if r == a { c } else { a };

            match device {
                Device::Resistor(res) => {
                    system.stamp_conductance(r, other, res.conductance());
                }

                Device::Diode(d) => {
                    system.stamp_conductance(r, other, d.conductance());
                    system.stamp_current_source(r, a, c, d.linear_current());
                }

                Device::CurrentSource(i) => {
                    system.stamp_current_source(r, a, c, i.dc_value());
                }

                Device::Inductor(l) => {
                    system.stamp_current_source(r, a, c, l.present_current());
                }

                // Eliminated after all KCL rows exist
                Device::VoltageSource(_) | Device::Capacitor(_) => {}
            }
            log::trace!("stamped {} '{}' into row {}", device.kind(), device.name(), r);
        }
    }

    let constraints = circuit
        .devices()
        .iter()
        .enumerate()
        .filter_map(|(idx, device)| {
            let voltage = match device {
                Device::VoltageSource(v) => v.present_voltage(),
                Device::Capacitor(c) => c.present_voltage(),
                _ => return None,
            };
            Some(VoltageConstraint {
                device: DeviceId(idx),
                anode: device.anode(),
                cathode: device.cathode(),
                voltage,
            })
        })
        .collect();

    (system, constraints)
}

/// Nodes joined by voltage constraints.
///
/// Each group keeps one KCL equation, in the row of its root. Ground is
/// always the root of its group.
struct Supernodes {
    parent: Vec<usize>,
}

impl Supernodes {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
        }
    }

    fn find(&mut self, mut node: usize) -> usize {
        while self.parent[node] != node {
            self.parent[node] = self.parent[self.parent[node]];
            node = self.parent[node];
        }
        node
    }
}

/// Enforce voltage constraints without adding branch-current unknowns.
///
/// For a constraint between nodes a and c:
/// - c is ground: row a becomes V[a] = v
/// - a is ground: row c becomes -V[c] = v
/// - otherwise: row c absorbs row a's KCL equation, then row a becomes
///   V[a] - V[c] = v
///
/// When earlier constraints already tied a node into a group, the same
/// rules apply to the group roots. A constraint whose terminals already
/// share a group closes a loop of voltage constraints and is rejected as
/// [`KclError::SingularSystem`].
pub fn eliminate_voltage_sources(
    system: &mut MnaSystem,
    constraints: &[VoltageConstraint],
) -> Result<()> {
    let mut groups = Supernodes::new(system.size);

    for constraint in constraints {
        let (a, c) = (constraint.anode.0, constraint.cathode.0);
        let (root_a, root_c) = (groups.find(a), groups.find(c));

        if root_a == root_c {
            log::warn!(
                "voltage constraint {} between {} and {} closes a source loop",
                constraint.device,
                constraint.anode,
                constraint.cathode
            );
            return Err(KclError::SingularSystem);
        }

        // Ground's KCL row is discarded, so it always keeps the group.
        let (keep, freed) = if root_a == 0 {
            (root_a, root_c)
        } else {
            (root_c, root_a)
        };

        system.merge_row(keep, freed);
        system.set_constraint(freed, a, c, constraint.voltage);
        groups.parent[freed] = keep;

        log::debug!(
            "{}: row {} holds V{} - V{} = {}, KCL merged into row {}",
            constraint.device,
            freed,
            a,
            c,
            constraint.voltage,
            keep
        );
    }

    Ok(())
}

/// Stamp and eliminate: the full N x N system, ground row and column
/// still present.
pub fn assemble(circuit: &Circuit) -> Result<MnaSystem> {
    let (mut system, constraints) = stamp_kcl(circuit);
    eliminate_voltage_sources(&mut system, &constraints)?;
    Ok(system)
}

/// The (N-1) x (N-1) system over nodes 1..N, ready for a linear solve.
pub fn assemble_reduced(circuit: &Circuit) -> Result<MnaSystem> {
    Ok(assemble(circuit)?.without_ground())
}

/// Reinsert V(0) = 0 in front of a reduced solution.
pub fn with_ground(reduced: &[f64]) -> Vec<f64> {
    let mut voltages = Vec::with_capacity(reduced.len() + 1);
    voltages.push(0.0);
    voltages.extend_from_slice(reduced);
    voltages
}

#[cfg(test)]
mod tests {
    use super::*;

    fn divider() -> Circuit {
        let mut circuit = Circuit::new(3);
        circuit
            .add_voltage_source("V1", NodeId(2), NodeId::GROUND, 10.0)
            .unwrap();
        circuit.add_resistor("R1", NodeId(2), NodeId(1), 1000.0).unwrap();
        circuit.add_resistor("R2", NodeId(1), NodeId(0), 3000.0).unwrap();
        circuit
    }

    #[test]
    fn test_resistor_stamp() {
        let (system, constraints) = stamp_kcl(&divider());
        let g1 = 1.0 / 1000.0;
        let g2 = 1.0 / 3000.0;

        // Ground row is never stamped
        assert!(system.row(0).iter().all(|&v| v == 0.0));
        assert_eq!(system.row(1), &[-g2, g1 + g2, -g1]);
        assert_eq!(system.row(2), &[0.0, -g1, g1]);
        assert_eq!(constraints.len(), 1);
        assert_eq!(constraints[0].voltage, 10.0);
    }

    #[test]
    fn test_current_source_direction() {
        let mut circuit = Circuit::new(3);
        circuit
            .add_current_source("I1", NodeId(1), NodeId(2), 2e-3)
            .unwrap();
        let (system, _) = stamp_kcl(&circuit);

        // Drawn from the anode, delivered into the cathode
        assert_eq!(system.source(1), -2e-3);
        assert_eq!(system.source(2), 2e-3);
    }

    #[test]
    fn test_elimination_cathode_grounded() {
        let system = assemble(&divider()).unwrap();
        assert_eq!(system.row(2), &[0.0, 0.0, 1.0]);
        assert_eq!(system.source(2), 10.0);

        // Ground's row absorbed node 2's KCL equation and is dropped
        let reduced = system.without_ground();
        assert_eq!(reduced.row(1), &[0.0, 1.0]);
    }

    #[test]
    fn test_elimination_anode_grounded() {
        let mut circuit = Circuit::new(2);
        circuit
            .add_voltage_source("V1", NodeId::GROUND, NodeId(1), 5.0)
            .unwrap();
        circuit.add_resistor("R1", NodeId(1), NodeId(0), 100.0).unwrap();

        let system = assemble(&circuit).unwrap();
        assert_eq!(system.row(1), &[0.0, -1.0]);
        assert_eq!(system.source(1), 5.0);

        // -V1 = 5
        let reduced = system.without_ground();
        assert_eq!(reduced.row(0), &[-1.0]);
    }

    #[test]
    fn test_elimination_floating_source_merges_rows() {
        let mut circuit = Circuit::new(3);
        circuit
            .add_current_source("I1", NodeId(0), NodeId(1), 1e-3)
            .unwrap();
        circuit.add_resistor("R1", NodeId(1), NodeId(0), 1000.0).unwrap();
        circuit.add_resistor("R2", NodeId(2), NodeId(0), 2000.0).unwrap();
        circuit
            .add_voltage_source("V1", NodeId(1), NodeId(2), 3.0)
            .unwrap();

        let (raw, constraints) = stamp_kcl(&circuit);
        let mut system = raw.clone();
        eliminate_voltage_sources(&mut system, &constraints).unwrap();

        // Row 2 now carries the supernode KCL equation
        for j in 0..3 {
            assert_eq!(system.get(2, j), raw.get(2, j) + raw.get(1, j));
        }
        assert_eq!(system.source(2), raw.source(2) + raw.source(1));

        // Row 1 carries V1 - V2 = 3
        assert_eq!(system.row(1), &[0.0, 1.0, -1.0]);
        assert_eq!(system.source(1), 3.0);
    }

    #[test]
    fn test_constraint_never_writes_ground_column() {
        let mut system = MnaSystem::new(3);
        system.set(1, 0, 4.0);
        system.set_constraint(1, 1, 0, 2.0);
        assert_eq!(system.row(1), &[0.0, 1.0, 0.0]);

        system.set_constraint(2, 0, 2, 3.0);
        assert_eq!(system.row(2), &[0.0, 0.0, -1.0]);
        assert_eq!(system.source(2), 3.0);
    }

    #[test]
    fn test_source_loop_is_singular() {
        let mut circuit = Circuit::new(3);
        circuit
            .add_voltage_source("V1", NodeId(1), NodeId(0), 1.0)
            .unwrap();
        circuit
            .add_voltage_source("V2", NodeId(2), NodeId(1), 1.0)
            .unwrap();
        circuit
            .add_voltage_source("V3", NodeId(2), NodeId(0), 2.0)
            .unwrap();

        assert_eq!(assemble(&circuit).unwrap_err(), KclError::SingularSystem);
    }

    #[test]
    fn test_assembly_is_idempotent() {
        let mut circuit = divider();
        circuit.add_diode("D1", NodeId(1), NodeId(0)).unwrap();
        circuit
            .add_current_source("I1", NodeId(0), NodeId(1), 1e-3)
            .unwrap();

        let first = assemble_reduced(&circuit).unwrap();
        let second = assemble_reduced(&circuit).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_without_ground() {
        let mut system = MnaSystem::new(3);
        for i in 0..3 {
            for j in 0..3 {
                system.set(i, j, (i * 3 + j) as f64);
            }
            system.z[i] = i as f64 * 10.0;
        }
        let reduced = system.without_ground();
        assert_eq!(reduced.size, 2);
        assert_eq!(reduced.a, vec![4.0, 5.0, 7.0, 8.0]);
        assert_eq!(reduced.z, vec![10.0, 20.0]);
    }

    #[test]
    fn test_with_ground() {
        assert_eq!(with_ground(&[1.5, -2.0]), vec![0.0, 1.5, -2.0]);
    }
}
