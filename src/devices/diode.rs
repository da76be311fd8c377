//! Diode model.
//!
//! Uses the Shockley diode equation:
//!   I = Is * (exp(V / Vt) - 1)
//!
//! For Newton-Raphson iteration, the diode is replaced by a companion
//! model linearized around the last operating point (vd, id0):
//!   I ≈ G * V + I_lin
//!
//! where G = Is/Vt * exp(vd/Vt) and I_lin = id0 - G * vd. Both are clamped
//! so that a wild early iterate cannot make the stamped matrix
//! ill-conditioned.

use super::{terminal_voltage, two_terminal_derivative, CurrentDevice};
use crate::circuit::NodeId;
use crate::{DIODE_CURRENT_LIMIT, SATURATION_CURRENT, THERMAL_VOLTAGE};

/// Lower bound on the companion conductance (siemens).
pub const MIN_COMPANION_CONDUCTANCE: f64 = 0.01;

/// Upper bound on the companion conductance (siemens).
pub const MAX_COMPANION_CONDUCTANCE: f64 = 10.0;

/// A diode.
#[derive(Debug, Clone)]
pub struct Diode {
    name: String,
    nodes: [NodeId; 2], // [anode, cathode]
    saturation_current: f64,
    thermal_voltage: f64,
    /// Last linearized terminal voltage
    vd: f64,
    /// Current estimate at `vd`
    id0: f64,
}

impl Diode {
    /// Create a new diode with the default silicon parameters.
    pub fn new(name: impl Into<String>, anode: NodeId, cathode: NodeId) -> Self {
        Self {
            name: name.into(),
            nodes: [anode, cathode],
            saturation_current: SATURATION_CURRENT,
            thermal_voltage: THERMAL_VOLTAGE,
            vd: 0.0,
            id0: 0.0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Terminals as `[anode, cathode]`.
    pub fn nodes(&self) -> [NodeId; 2] {
        self.nodes
    }

    pub fn saturation_current(&self) -> f64 {
        self.saturation_current
    }

    pub fn thermal_voltage(&self) -> f64 {
        self.thermal_voltage
    }

    /// Calculate the diode current at a given voltage, clamped to
    /// [`DIODE_CURRENT_LIMIT`] in magnitude.
    pub fn current_at(&self, v: f64) -> f64 {
        let i = self.saturation_current * ((v / self.thermal_voltage).exp() - 1.0);
        i.clamp(-DIODE_CURRENT_LIMIT, DIODE_CURRENT_LIMIT)
    }

    /// Companion-model conductance at the present operating point.
    pub fn conductance(&self) -> f64 {
        let g = self.saturation_current / self.thermal_voltage * (self.vd / self.thermal_voltage).exp();
        g.clamp(MIN_COMPANION_CONDUCTANCE, MAX_COMPANION_CONDUCTANCE)
    }

    /// Companion-model equivalent current, flowing anode to cathode.
    pub fn linear_current(&self) -> f64 {
        let i = self.id0 - self.conductance() * self.vd;
        i.clamp(-DIODE_CURRENT_LIMIT, DIODE_CURRENT_LIMIT)
    }

    /// Move the operating point to `vd`, with `id0` from the exact law.
    pub fn relinearize(&mut self, vd: f64) {
        let id0 = self.current_at(vd);
        self.set_operating_point(vd, id0);
    }

    pub fn set_operating_point(&mut self, vd: f64, id0: f64) {
        self.vd = vd;
        self.id0 = id0;
    }

    /// Return to the zero operating point used at the start of iteration.
    pub fn reset(&mut self) {
        self.set_operating_point(0.0, 0.0);
    }

    pub fn vd(&self) -> f64 {
        self.vd
    }

    pub fn id0(&self) -> f64 {
        self.id0
    }
}

impl CurrentDevice for Diode {
    fn current(&self, node_voltages: &[f64]) -> f64 {
        self.current_at(terminal_voltage(self.nodes, node_voltages))
    }

    /// Small-signal stand-in for dI/dV: `current / Vt` at the anode.
    ///
    /// This drops the `-Is` term of the exact derivative. The
    /// Newton-Raphson driver stamps [`Diode::conductance`] instead.
    fn current_derivative(&self, node_voltages: &[f64]) -> Vec<f64> {
        let g = self.current(node_voltages) / self.thermal_voltage;
        two_terminal_derivative(self.nodes, node_voltages.len(), g)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn diode() -> Diode {
        Diode::new("D1", NodeId(1), NodeId(0))
    }

    #[test]
    fn test_diode_forward_bias() {
        let d = diode();

        // At 0V, current should be approximately 0
        assert!(d.current(&[0.0, 0.0]).abs() < 1e-20);

        // At forward bias, current should increase exponentially
        let i_small = d.current(&[0.0, 0.3]);
        let i_large = d.current(&[0.0, 0.6]);
        assert!(i_large > i_small * 100.0);
    }

    #[test]
    fn test_diode_reverse_bias() {
        let d = diode();

        // In reverse bias, current should approach -Is
        let i_rev = d.current(&[0.0, -1.0]);
        assert!(i_rev < 0.0);
        assert!(i_rev > -2.0 * d.saturation_current);
    }

    #[test]
    fn test_current_is_clamped() {
        let d = diode();
        assert_eq!(d.current(&[0.0, 5.0]), DIODE_CURRENT_LIMIT);
    }

    #[test]
    fn test_companion_conductance_clamps() {
        let mut d = diode();
        // At vd = 0 the exact slope is 4 pS
        assert_eq!(d.conductance(), MIN_COMPANION_CONDUCTANCE);

        d.relinearize(2.0);
        assert_eq!(d.conductance(), MAX_COMPANION_CONDUCTANCE);

        // 0.6 V sits inside the clamp window
        d.relinearize(0.6);
        let expected = 1e-13 / 0.025 * (0.6f64 / 0.025).exp();
        assert_relative_eq!(d.conductance(), expected, max_relative = 1e-12);
    }

    #[test]
    fn test_linear_current() {
        let mut d = diode();
        d.relinearize(0.6);
        let expected = d.id0() - d.conductance() * 0.6;
        assert_relative_eq!(d.linear_current(), expected, max_relative = 1e-12);

        // Companion model reproduces the exact current at the operating point
        assert_relative_eq!(
            d.conductance() * 0.6 + d.linear_current(),
            d.current_at(0.6),
            max_relative = 1e-12
        );

        // Far forward: id0 = 10, G = 10, so 10 - 10*3 is clamped to -10
        d.relinearize(3.0);
        assert_eq!(d.linear_current(), -DIODE_CURRENT_LIMIT);
    }

    #[test]
    fn test_small_signal_derivative() {
        let d = diode();
        let v = [0.0, 0.55];
        let i = d.current(&v);
        let derivative = d.current_derivative(&v);
        assert_relative_eq!(derivative[1], i / 0.025, max_relative = 1e-12);
        assert_relative_eq!(derivative[0], -i / 0.025, max_relative = 1e-12);
    }

    #[test]
    fn test_reset() {
        let mut d = diode();
        d.relinearize(0.7);
        d.reset();
        assert_eq!((d.vd(), d.id0()), (0.0, 0.0));
    }
}
