//! Power-flow equations and mismatch evaluation.
//!
//! At every Newton-Raphson step the solver compares the power each bus is
//! specified to inject against what the current voltage estimate actually
//! injects through the network:
//!
//! ```text
//! P_i(V, δ) = Σ_j V_i V_j (G_ij cos δ_ij + B_ij sin δ_ij)
//! Q_i(V, δ) = Σ_j V_i V_j (G_ij sin δ_ij − B_ij cos δ_ij)
//! ```
//!
//! The mismatch vector stacks ΔP over every non-slack bus followed by ΔQ
//! over every PQ bus, matching the unknown ordering used by the Jacobian.

use crate::ybus::AdmittanceMatrix;
use lf_core::{BusKind, NetworkModel};

/// Solver-side view of what a bus contributes to the unknown vector.
///
/// Starts out mirroring [`BusKind`] but can change mid-solve: reactive-limit
/// enforcement demotes PV buses to PQ without touching the immutable model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusRole {
    Slack,
    Pv,
    Pq,
}

impl BusRole {
    pub fn tag(self) -> &'static str {
        match self {
            BusRole::Slack => "slack",
            BusRole::Pv => "pv",
            BusRole::Pq => "pq",
        }
    }
}

/// Index sets mapping unknowns to bus positions.
///
/// `angle_buses` lists every non-slack bus (one δ unknown each);
/// `voltage_buses` lists every PQ bus (one V unknown each). The mismatch
/// vector and the Jacobian both use this ordering.
#[derive(Debug, Clone)]
pub struct Classification {
    pub roles: Vec<BusRole>,
    pub angle_buses: Vec<usize>,
    pub voltage_buses: Vec<usize>,
}

impl Classification {
    pub fn from_model(model: &NetworkModel) -> Self {
        let roles = model
            .buses()
            .iter()
            .map(|bus| match bus.kind {
                BusKind::Slack { .. } => BusRole::Slack,
                BusKind::Pv { .. } => BusRole::Pv,
                BusKind::Pq { .. } => BusRole::Pq,
            })
            .collect();
        Self::from_roles(roles)
    }

    pub fn from_roles(roles: Vec<BusRole>) -> Self {
        let angle_buses = roles
            .iter()
            .enumerate()
            .filter(|(_, r)| **r != BusRole::Slack)
            .map(|(i, _)| i)
            .collect();
        let voltage_buses = roles
            .iter()
            .enumerate()
            .filter(|(_, r)| **r == BusRole::Pq)
            .map(|(i, _)| i)
            .collect();
        Self {
            roles,
            angle_buses,
            voltage_buses,
        }
    }

    /// Total number of unknowns (δ count + V count).
    pub fn unknowns(&self) -> usize {
        self.angle_buses.len() + self.voltage_buses.len()
    }
}

/// Net scheduled injections per bus, per-unit on `base_mva`.
///
/// PV generation injects positively, PQ demand negatively; the slack entry
/// is present but unconstrained (never read by the mismatch).
pub fn specified_injections(model: &NetworkModel, base_mva: f64) -> (Vec<f64>, Vec<f64>) {
    let n = model.bus_count();
    let mut p_spec = vec![0.0; n];
    let mut q_spec = vec![0.0; n];

    for (i, bus) in model.buses().iter().enumerate() {
        match &bus.kind {
            BusKind::Slack { .. } => {}
            BusKind::Pv { active_power, .. } => {
                p_spec[i] = active_power.value() / base_mva;
            }
            BusKind::Pq {
                active_power,
                reactive_power,
            } => {
                p_spec[i] = -active_power.value() / base_mva;
                q_spec[i] = -reactive_power.value() / base_mva;
            }
        }
    }

    (p_spec, q_spec)
}

/// Injections the network actually produces at the given voltage state.
pub fn calculated_injections(
    ybus: &AdmittanceMatrix,
    voltages: &[f64],
    angles: &[f64],
) -> (Vec<f64>, Vec<f64>) {
    let n = ybus.order();
    let mut p = vec![0.0; n];
    let mut q = vec![0.0; n];

    for i in 0..n {
        for j in 0..n {
            let delta = angles[i] - angles[j];
            let (sin, cos) = delta.sin_cos();
            let vv = voltages[i] * voltages[j];
            p[i] += vv * (ybus.g(i, j) * cos + ybus.b(i, j) * sin);
            q[i] += vv * (ybus.g(i, j) * sin - ybus.b(i, j) * cos);
        }
    }

    (p, q)
}

/// One evaluation of specified minus calculated power.
#[derive(Debug, Clone)]
pub struct Mismatch {
    /// ΔP entries for `angle_buses`, then ΔQ entries for `voltage_buses`.
    pub vector: Vec<f64>,
    /// Largest absolute entry; the convergence criterion.
    pub max_abs: f64,
    /// Calculated P per bus (kept for Jacobian diagonals and reporting).
    pub p_calc: Vec<f64>,
    /// Calculated Q per bus.
    pub q_calc: Vec<f64>,
}

pub fn evaluate(
    ybus: &AdmittanceMatrix,
    voltages: &[f64],
    angles: &[f64],
    p_spec: &[f64],
    q_spec: &[f64],
    class: &Classification,
) -> Mismatch {
    let (p_calc, q_calc) = calculated_injections(ybus, voltages, angles);

    let mut vector = Vec::with_capacity(class.unknowns());
    let mut max_abs: f64 = 0.0;

    for &i in &class.angle_buses {
        let dp = p_spec[i] - p_calc[i];
        max_abs = max_abs.max(dp.abs());
        vector.push(dp);
    }
    for &i in &class.voltage_buses {
        let dq = q_spec[i] - q_calc[i];
        max_abs = max_abs.max(dq.abs());
        vector.push(dq);
    }

    Mismatch {
        vector,
        max_abs,
        p_calc,
        q_calc,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lf_core::units::{Megavars, Megawatts, PerUnit, Radians};
    use lf_core::{Branch, BranchId, Bus, BusId};

    fn model() -> NetworkModel {
        let buses = vec![
            Bus::slack(BusId::new(0), "grid", PerUnit::ONE, Radians::ZERO),
            Bus::pv(BusId::new(1), "gen", PerUnit(1.02), Megawatts(30.0)),
            Bus::pq(BusId::new(2), "load", Megawatts(50.0), Megavars(20.0)),
        ];
        let branches = vec![
            Branch::new(BranchId::new(0), "a", BusId::new(0), BusId::new(1), 0.01, 0.05),
            Branch::new(BranchId::new(1), "b", BusId::new(1), BusId::new(2), 0.02, 0.06),
        ];
        NetworkModel::new(buses, branches).unwrap()
    }

    #[test]
    fn classification_orders_unknowns() {
        let class = Classification::from_model(&model());
        assert_eq!(class.angle_buses, vec![1, 2]);
        assert_eq!(class.voltage_buses, vec![2]);
        assert_eq!(class.unknowns(), 3);
    }

    #[test]
    fn demotion_moves_a_bus_into_the_voltage_set() {
        let mut class = Classification::from_model(&model());
        class.roles[1] = BusRole::Pq;
        let class = Classification::from_roles(class.roles);
        assert_eq!(class.voltage_buses, vec![1, 2]);
    }

    #[test]
    fn injections_follow_sign_convention() {
        let (p, q) = specified_injections(&model(), 100.0);
        assert_eq!(p[0], 0.0);
        assert!((p[1] - 0.30).abs() < 1e-12);
        assert!((p[2] + 0.50).abs() < 1e-12);
        assert!((q[2] + 0.20).abs() < 1e-12);
    }

    #[test]
    fn flat_profile_injects_nothing_without_shunts() {
        let m = model();
        let ybus = AdmittanceMatrix::build(&m);
        let v = vec![1.0; 3];
        let a = vec![0.0; 3];
        let (p, q) = calculated_injections(&ybus, &v, &a);
        for i in 0..3 {
            assert!(p[i].abs() < 1e-12, "P[{i}] = {}", p[i]);
            assert!(q[i].abs() < 1e-12, "Q[{i}] = {}", q[i]);
        }
    }

    #[test]
    fn mismatch_at_flat_start_equals_specified_load() {
        let m = model();
        let ybus = AdmittanceMatrix::build(&m);
        let class = Classification::from_model(&m);
        let (p_spec, q_spec) = specified_injections(&m, 100.0);

        // Flat start with every magnitude at 1.0: calculated power is zero,
        // so the mismatch is exactly the specified injection.
        let v = vec![1.0; 3];
        let a = vec![0.0; 3];
        let mis = evaluate(&ybus, &v, &a, &p_spec, &q_spec, &class);

        assert_eq!(mis.vector.len(), 3);
        assert!((mis.vector[0] - 0.30).abs() < 1e-12);
        assert!((mis.vector[1] + 0.50).abs() < 1e-12);
        assert!((mis.vector[2] + 0.20).abs() < 1e-12);
        assert!((mis.max_abs - 0.50).abs() < 1e-12);
    }
}
