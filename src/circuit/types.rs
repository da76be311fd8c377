//! Core types for circuit representation.

use std::fmt;

/// A unique identifier for a node in the circuit.
/// Node 0 is always ground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The ground node (always index 0).
    pub const GROUND: NodeId = NodeId(0);

    /// Check if this is the ground node.
    pub fn is_ground(&self) -> bool {
        self.0 == 0
    }

    /// Row/column of this node in the reduced (ground-free) system.
    /// Returns None for ground.
    pub fn reduced_index(&self) -> Option<usize> {
        if self.is_ground() {
            None
        } else {
            Some(self.0 - 1)
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ground() {
            write!(f, "GND")
        } else {
            write!(f, "N{}", self.0)
        }
    }
}

/// Index of a device in the circuit's device arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub usize);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "D{}", self.0)
    }
}

/// A node and the devices attached to it.
///
/// The device list holds arena indices, not references, so the node table
/// never borrows from the device table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub devices: Vec<DeviceId>,
}

impl Node {
    /// Create a node with no attached devices.
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            devices: Vec::new(),
        }
    }

    pub fn is_ground(&self) -> bool {
        self.id.is_ground()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduced_index_skips_ground() {
        assert_eq!(NodeId::GROUND.reduced_index(), None);
        assert_eq!(NodeId(1).reduced_index(), Some(0));
        assert_eq!(NodeId(7).reduced_index(), Some(6));
    }

    #[test]
    fn test_display() {
        assert_eq!(NodeId(0).to_string(), "GND");
        assert_eq!(NodeId(3).to_string(), "N3");
        assert_eq!(DeviceId(2).to_string(), "D2");
    }
}
