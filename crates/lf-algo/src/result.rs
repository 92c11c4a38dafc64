//! Solved-case result types.
//!
//! [`LoadFlowResult`] is the complete output contract: everything a UI, CLI
//! or batch study needs, serializable as camelCase JSON. Non-convergence is
//! an ordinary value here (`converged: false` plus a [`Termination`] cause),
//! never an error. Malformed *input* fails long before a result exists.

use crate::stability::StabilityClass;
use lf_core::{BranchId, BusId};
use serde::{Deserialize, Serialize};

/// Why the iteration loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Termination {
    /// Mismatch dropped below tolerance.
    Converged,
    /// Iteration budget exhausted first.
    MaxIterations,
    /// The linearized system lost rank; see [`crate::jacobian::SingularJacobian`].
    SingularJacobian,
}

/// Solved quantities at one bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusResult {
    pub id: BusId,
    pub name: String,
    /// Role the bus ended the solve with; reactive-limit enforcement can
    /// demote a "pv" bus to "pq".
    pub kind: String,
    pub voltage_pu: f64,
    pub angle_rad: f64,
    /// Net active injection the network sees (generation positive).
    pub p_injection_mw: f64,
    /// Net reactive injection.
    pub q_injection_mvar: f64,
}

/// Solved quantities along one branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchResult {
    pub id: BranchId,
    pub name: String,
    pub from_bus: BusId,
    pub to_bus: BusId,
    /// Series current magnitude, per-unit.
    pub current_pu: f64,
    /// The same current in kiloamperes at the from-bus voltage base.
    pub current_ka: f64,
    /// Active power entering the branch at the from end.
    pub p_from_mw: f64,
    /// I²R losses dissipated in the branch.
    pub losses_mw: f64,
    /// Current as a percentage of rated current; `None` for unrated branches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loading_percent: Option<f64>,
}

/// System-wide energy balance.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemTotals {
    pub generation_mw: f64,
    pub load_mw: f64,
    pub losses_mw: f64,
}

impl SystemTotals {
    /// Generation minus (load + losses); near zero for a converged case.
    pub fn balance_gap_mw(&self) -> f64 {
        self.generation_mw - self.load_mw - self.losses_mw
    }
}

/// Complete outcome of one load-flow study.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadFlowResult {
    pub converged: bool,
    pub iterations: u32,
    /// Largest per-unit power mismatch at the final state.
    pub max_mismatch: f64,
    pub termination: Termination,
    pub buses: Vec<BusResult>,
    pub branches: Vec<BranchResult>,
    pub totals: SystemTotals,
    pub stability: StabilityClass,
    /// Max mismatch after each iteration, for replay and convergence
    /// diagnostics. Entry 0 is the flat-start mismatch.
    pub mismatch_history: Vec<f64>,
}

impl LoadFlowResult {
    pub fn bus(&self, id: BusId) -> Option<&BusResult> {
        self.buses.iter().find(|b| b.id == id)
    }

    pub fn branch(&self, id: BranchId) -> Option<&BranchResult> {
        self.branches.iter().find(|b| b.id == id)
    }

    /// Largest voltage deviation from nominal, in per-unit.
    pub fn worst_voltage_deviation(&self) -> f64 {
        self.buses
            .iter()
            .map(|b| (b.voltage_pu - 1.0).abs())
            .fold(0.0, f64::max)
    }
}
