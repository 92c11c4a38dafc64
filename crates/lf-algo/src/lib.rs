//! # lf-algo: Newton-Raphson Load-Flow Engine
//!
//! Numeric kernel for steady-state load-flow analysis over the `lf-core`
//! network model. The pipeline runs:
//!
//! ```text
//! NetworkModel ─→ AdmittanceMatrix ─→ Newton-Raphson loop ─→ branch flows
//!                                     (mismatch + Jacobian      │
//!                                      + LU solve per step)     ▼
//!                                                        LoadFlowResult
//!                                                        (+ stability class)
//! ```
//!
//! ## Modules
//!
//! - [`ybus`] - complex nodal admittance matrix assembly
//! - [`mismatch`] - power-flow equations and mismatch evaluation
//! - [`jacobian`] - analytic Jacobian blocks and the LU correction solve
//! - [`newton`] - the iteration driver, [`SolveConfig`], [`SolverState`]
//! - [`branch_flow`] - per-branch current, MW flow, losses, loading
//! - [`stability`] - stable / marginal / unstable classification
//! - [`result`] - the serializable [`LoadFlowResult`] contract
//! - [`contingency`] - parallel N-1 outage screening
//!
//! ## Example
//!
//! ```
//! use lf_algo::{solve, SolveConfig};
//! use lf_core::units::{Megavars, Megawatts, PerUnit, Radians};
//! use lf_core::{Branch, BranchId, Bus, BusId, NetworkModel};
//!
//! let model = NetworkModel::new(
//!     vec![
//!         Bus::slack(BusId::new(0), "grid", PerUnit::ONE, Radians::ZERO),
//!         Bus::pq(BusId::new(1), "feeder", Megawatts(50.0), Megavars(20.0)),
//!     ],
//!     vec![Branch::new(BranchId::new(0), "line", BusId::new(0), BusId::new(1), 0.01, 0.05)],
//! )
//! .expect("valid network");
//!
//! let result = solve(&model, &SolveConfig::default());
//! assert!(result.converged);
//! ```
//!
//! ## Guarantees
//!
//! - **Pure**: a solve touches nothing but its inputs; identical inputs give
//!   bit-identical results.
//! - **Total over valid models**: divergence and singular Jacobians come
//!   back as `converged: false` with a [`Termination`] cause, never a panic
//!   or an `Err`.
//! - **Analytic derivatives**: the Jacobian uses closed forms only, which
//!   is what buys quadratic convergence near the solution.

pub mod branch_flow;
pub mod contingency;
pub mod jacobian;
pub mod mismatch;
pub mod newton;
pub mod result;
pub mod stability;
pub mod ybus;

pub use contingency::{n_minus_one, ContingencyOutcome, ContingencyReport};
pub use jacobian::SingularJacobian;
pub use newton::{solve, NewtonRaphsonSolver, SolveConfig, SolverState};
pub use result::{BranchResult, BusResult, LoadFlowResult, SystemTotals, Termination};
pub use stability::StabilityClass;
pub use ybus::AdmittanceMatrix;
