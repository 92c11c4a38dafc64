//! Nodal admittance matrix construction.
//!
//! The admittance matrix Y encodes the whole network topology for the
//! power-flow equations: `I = Y · V` in complex nodal form. Each branch
//! contributes its series admittance `y = 1/(r + jx)` negatively to the two
//! off-diagonal entries it connects and positively to both diagonals, plus
//! half its line-charging susceptance on each end's diagonal.
//!
//! Load-flow networks at this scale are small (tens of buses), so storage is
//! a dense row-major matrix; the Jacobian dominates runtime anyway.

use lf_core::NetworkModel;
use num_complex::{Complex64, ComplexFloat};

/// Dense complex bus admittance matrix, indexed in model bus order.
#[derive(Debug, Clone, PartialEq)]
pub struct AdmittanceMatrix {
    order: usize,
    entries: Vec<Complex64>,
}

impl AdmittanceMatrix {
    /// Assemble Y from a validated network. Pure; cannot fail, since zero
    /// and negative impedances are rejected at model construction.
    pub fn build(model: &NetworkModel) -> Self {
        let n = model.bus_count();
        let mut matrix = Self {
            order: n,
            entries: vec![Complex64::new(0.0, 0.0); n * n],
        };

        for branch in model.branches() {
            // Endpoints resolve by model invariant.
            let (Some(f), Some(t)) = (
                model.bus_position(branch.from_bus),
                model.bus_position(branch.to_bus),
            ) else {
                continue;
            };

            let series = Complex64::new(branch.resistance, branch.reactance).recip();
            let charging = Complex64::new(0.0, branch.charging_b.value() / 2.0);

            *matrix.at_mut(f, t) -= series;
            *matrix.at_mut(t, f) -= series;
            *matrix.at_mut(f, f) += series + charging;
            *matrix.at_mut(t, t) += series + charging;
        }

        matrix
    }

    /// Number of buses (matrix is `order × order`).
    pub fn order(&self) -> usize {
        self.order
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Complex64 {
        self.entries[i * self.order + j]
    }

    /// Conductance component G_ij.
    #[inline]
    pub fn g(&self, i: usize, j: usize) -> f64 {
        self.get(i, j).re
    }

    /// Susceptance component B_ij.
    #[inline]
    pub fn b(&self, i: usize, j: usize) -> f64 {
        self.get(i, j).im
    }

    #[inline]
    fn at_mut(&mut self, i: usize, j: usize) -> &mut Complex64 {
        &mut self.entries[i * self.order + j]
    }
}
