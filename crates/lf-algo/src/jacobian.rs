//! Analytic Jacobian assembly and the linear correction solve.
//!
//! Newton-Raphson owes its quadratic convergence to exact first derivatives
//! of the power-flow equations, so every entry here is the closed-form
//! trigonometric expression; no finite differencing anywhere. The matrix
//! is partitioned into the four classic blocks:
//!
//! ```text
//! J = | ∂P/∂δ  ∂P/∂V |      rows:    ΔP (non-slack), ΔQ (PQ)
//!     | ∂Q/∂δ  ∂Q/∂V |      columns: δ  (non-slack), V  (PQ)
//! ```
//!
//! The correction system `J · Δx = mismatch` is solved by dense LU with
//! partial pivoting. A pivot collapse surfaces as non-finite entries in the
//! solution, which is reported as [`SingularJacobian`] rather than being
//! papered over: voltage-collapse cases must be visible to callers.

use crate::mismatch::{Classification, Mismatch};
use crate::ybus::AdmittanceMatrix;
use faer::prelude::SpSolver;
use faer::{FaerMat, Mat};
use thiserror::Error;

/// The linearized system has no unique solution at the current state.
///
/// Typically the operating point is at or beyond voltage collapse, or the
/// network data conditions the matrix pathologically.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("jacobian is numerically singular")]
pub struct SingularJacobian;

/// Assemble the full Jacobian at the given voltage state.
///
/// `mismatch` supplies the already-computed P(V,δ) and Q(V,δ) used by the
/// diagonal entries, so assembly stays O(n²) overall.
pub fn build(
    ybus: &AdmittanceMatrix,
    voltages: &[f64],
    angles: &[f64],
    mismatch: &Mismatch,
    class: &Classification,
) -> Mat<f64> {
    let n_p = class.angle_buses.len();
    let n_q = class.voltage_buses.len();
    let size = n_p + n_q;
    let mut jac = Mat::zeros(size, size);

    let entry = |i: usize, j: usize| Entry {
        g: ybus.g(i, j),
        b: ybus.b(i, j),
        delta: angles[i] - angles[j],
        v_i: voltages[i],
        v_j: voltages[j],
        p_i: mismatch.p_calc[i],
        q_i: mismatch.q_calc[i],
    };

    for (row, &i) in class.angle_buses.iter().enumerate() {
        for (col, &j) in class.angle_buses.iter().enumerate() {
            jac.write(row, col, entry(i, j).dp_ddelta(i == j));
        }
        for (col, &j) in class.voltage_buses.iter().enumerate() {
            jac.write(row, n_p + col, entry(i, j).dp_dv(i == j));
        }
    }
    for (row, &i) in class.voltage_buses.iter().enumerate() {
        for (col, &j) in class.angle_buses.iter().enumerate() {
            jac.write(n_p + row, col, entry(i, j).dq_ddelta(i == j));
        }
        for (col, &j) in class.voltage_buses.iter().enumerate() {
            jac.write(n_p + row, n_p + col, entry(i, j).dq_dv(i == j));
        }
    }

    jac
}

/// Solve `J · Δx = rhs` by partial-pivot LU.
pub fn solve_correction(jacobian: &Mat<f64>, rhs: &[f64]) -> Result<Vec<f64>, SingularJacobian> {
    let n = rhs.len();
    if n == 0 {
        return Ok(Vec::new());
    }

    let mut b = Mat::zeros(n, 1);
    for (i, &value) in rhs.iter().enumerate() {
        b.write(i, 0, value);
    }

    let solution = jacobian.partial_piv_lu().solve(&b);
    let x: Vec<f64> = (0..n).map(|i| solution.read(i, 0)).collect();

    if x.iter().all(|v| v.is_finite()) {
        Ok(x)
    } else {
        Err(SingularJacobian)
    }
}

/// One (i, j) evaluation context shared by the four block formulas.
struct Entry {
    g: f64,
    b: f64,
    delta: f64,
    v_i: f64,
    v_j: f64,
    p_i: f64,
    q_i: f64,
}

impl Entry {
    fn dp_ddelta(&self, diagonal: bool) -> f64 {
        if diagonal {
            -self.q_i - self.b * self.v_i * self.v_i
        } else {
            self.v_i * self.v_j * (self.g * self.delta.sin() - self.b * self.delta.cos())
        }
    }

    fn dp_dv(&self, diagonal: bool) -> f64 {
        if diagonal {
            self.p_i / self.v_i + self.g * self.v_i
        } else {
            self.v_i * (self.g * self.delta.cos() + self.b * self.delta.sin())
        }
    }

    fn dq_ddelta(&self, diagonal: bool) -> f64 {
        if diagonal {
            self.p_i - self.g * self.v_i * self.v_i
        } else {
            -self.v_i * self.v_j * (self.g * self.delta.cos() + self.b * self.delta.sin())
        }
    }

    fn dq_dv(&self, diagonal: bool) -> f64 {
        if diagonal {
            self.q_i / self.v_i - self.b * self.v_i
        } else {
            self.v_i * (self.g * self.delta.sin() - self.b * self.delta.cos())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mismatch::{self, Classification};
    use lf_core::units::{Megavars, Megawatts, PerUnit, Radians};
    use lf_core::{Branch, BranchId, Bus, BusId, NetworkModel};

    fn three_bus() -> NetworkModel {
        let buses = vec![
            Bus::slack(BusId::new(0), "grid", PerUnit::ONE, Radians::ZERO),
            Bus::pv(BusId::new(1), "gen", PerUnit(1.02), Megawatts(30.0)),
            Bus::pq(BusId::new(2), "load", Megawatts(40.0), Megavars(15.0)),
        ];
        let branches = vec![
            Branch::new(BranchId::new(0), "a", BusId::new(0), BusId::new(1), 0.01, 0.05),
            Branch::new(BranchId::new(1), "b", BusId::new(1), BusId::new(2), 0.02, 0.06),
            Branch::new(BranchId::new(2), "c", BusId::new(0), BusId::new(2), 0.015, 0.04),
        ];
        NetworkModel::new(buses, branches).unwrap()
    }

    fn evaluate_at(
        model: &NetworkModel,
        voltages: &[f64],
        angles: &[f64],
    ) -> (AdmittanceMatrix, Classification, Mismatch) {
        let ybus = AdmittanceMatrix::build(model);
        let class = Classification::from_model(model);
        let (p_spec, q_spec) = mismatch::specified_injections(model, 100.0);
        let mis = mismatch::evaluate(&ybus, voltages, angles, &p_spec, &q_spec, &class);
        (ybus, class, mis)
    }

    /// Every analytic entry must agree with a central finite difference of
    /// the power equations; this is the ground truth for the closed forms.
    #[test]
    fn analytic_entries_match_numerical_differentiation() {
        let model = three_bus();
        let voltages = vec![1.0, 1.02, 0.97];
        let angles = vec![0.0, -0.02, -0.05];
        let (ybus, class, mis) = evaluate_at(&model, &voltages, &angles);
        let jac = build(&ybus, &voltages, &angles, &mis, &class);

        let h = 1e-7;
        let n_p = class.angle_buses.len();

        let injections = |v: &[f64], a: &[f64]| mismatch::calculated_injections(&ybus, v, a);

        // ∂P/∂δ and ∂Q/∂δ columns.
        for (col, &j) in class.angle_buses.iter().enumerate() {
            let mut plus = angles.clone();
            let mut minus = angles.clone();
            plus[j] += h;
            minus[j] -= h;
            let (p_plus, q_plus) = injections(&voltages, &plus);
            let (p_minus, q_minus) = injections(&voltages, &minus);

            for (row, &i) in class.angle_buses.iter().enumerate() {
                let numeric = (p_plus[i] - p_minus[i]) / (2.0 * h);
                assert!(
                    (jac.read(row, col) - numeric).abs() < 1e-5,
                    "dP[{i}]/ddelta[{j}]: analytic {} vs numeric {numeric}",
                    jac.read(row, col),
                );
            }
            for (row, &i) in class.voltage_buses.iter().enumerate() {
                let numeric = (q_plus[i] - q_minus[i]) / (2.0 * h);
                assert!(
                    (jac.read(n_p + row, col) - numeric).abs() < 1e-5,
                    "dQ[{i}]/ddelta[{j}]: analytic {} vs numeric {numeric}",
                    jac.read(n_p + row, col),
                );
            }
        }

        // ∂P/∂V and ∂Q/∂V columns.
        for (col, &j) in class.voltage_buses.iter().enumerate() {
            let mut plus = voltages.clone();
            let mut minus = voltages.clone();
            plus[j] += h;
            minus[j] -= h;
            let (p_plus, q_plus) = injections(&plus, &angles);
            let (p_minus, q_minus) = injections(&minus, &angles);

            for (row, &i) in class.angle_buses.iter().enumerate() {
                let numeric = (p_plus[i] - p_minus[i]) / (2.0 * h);
                assert!(
                    (jac.read(row, n_p + col) - numeric).abs() < 1e-5,
                    "dP[{i}]/dV[{j}]: analytic {} vs numeric {numeric}",
                    jac.read(row, n_p + col),
                );
            }
            for (row, &i) in class.voltage_buses.iter().enumerate() {
                let numeric = (q_plus[i] - q_minus[i]) / (2.0 * h);
                assert!(
                    (jac.read(n_p + row, n_p + col) - numeric).abs() < 1e-5,
                    "dQ[{i}]/dV[{j}]: analytic {} vs numeric {numeric}",
                    jac.read(n_p + row, n_p + col),
                );
            }
        }
    }

    #[test]
    fn correction_solve_recovers_known_solution() {
        // A · x = b with A = [[4,1,0],[1,4,1],[0,1,4]], b = A · [1,2,3].
        let mut a = Mat::zeros(3, 3);
        let rows = [[4.0, 1.0, 0.0], [1.0, 4.0, 1.0], [0.0, 1.0, 4.0]];
        for (i, row) in rows.iter().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                a.write(i, j, v);
            }
        }
        let b = [6.0, 12.0, 14.0];
        let x = solve_correction(&a, &b).unwrap();
        for (got, want) in x.iter().zip([1.0, 2.0, 3.0]) {
            assert!((got - want).abs() < 1e-10);
        }
    }

    #[test]
    fn singular_system_is_reported() {
        let mut a = Mat::zeros(2, 2);
        a.write(0, 0, 1.0);
        a.write(0, 1, 2.0);
        a.write(1, 0, 2.0);
        a.write(1, 1, 4.0);
        assert_eq!(solve_correction(&a, &[1.0, 0.0]), Err(SingularJacobian));
    }

    #[test]
    fn empty_system_is_trivially_solved() {
        let a = Mat::zeros(0, 0);
        assert_eq!(solve_correction(&a, &[]), Ok(Vec::new()));
    }
}
