//! Newton-Raphson iteration driver.
//!
//! The solve walks `Initialized → Iterating → {Converged | Diverged}`:
//! flat-start the state, then repeat mismatch → Jacobian → LU solve →
//! clamped update until the mismatch drops below tolerance or the iteration
//! budget runs out. A singular Jacobian ends the solve early. Every outcome,
//! both divergence paths included, comes back as a plain [`LoadFlowResult`];
//! only structurally invalid input is an error, and that cannot reach this
//! module because [`NetworkModel`] is validated at construction.
//!
//! Each iteration produces a fresh [`SolverState`] rather than mutating the
//! previous one, which keeps single iterations unit-testable and makes the
//! recorded mismatch history trustworthy for replay.

use crate::branch_flow::branch_flows;
use crate::jacobian;
use crate::mismatch::{self, BusRole, Classification};
use crate::result::{BusResult, LoadFlowResult, SystemTotals, Termination};
use crate::stability;
use crate::ybus::AdmittanceMatrix;
use lf_core::{BusKind, Megavars, NetworkModel};
use tracing::{debug, trace};

/// Tunable parameters of one load-flow study.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveConfig {
    /// Convergence threshold on the largest per-unit power mismatch.
    pub tolerance_pu: f64,
    /// Inner Newton-Raphson iteration budget.
    pub max_iterations: u32,
    /// System base for per-unit conversion.
    pub base_mva: f64,
    /// Fallback voltage base for kA conversion when a bus specifies none.
    pub base_kv: f64,
    /// Voltage magnitudes are clamped into this band after each update to
    /// keep a diverging iterate from running away.
    pub voltage_clamp_pu: (f64, f64),
    /// Demote PV buses to PQ when their reactive output leaves its band.
    pub enforce_q_limits: bool,
    /// Budget for PV→PQ switching rounds.
    pub max_q_iterations: u32,
    /// Half-width of the "stable" voltage band around 1.0 pu.
    pub stable_band: f64,
    /// Half-width of the "marginal" voltage band around 1.0 pu.
    pub marginal_band: f64,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            tolerance_pu: 1e-3,
            max_iterations: 50,
            base_mva: 100.0,
            base_kv: 13.8,
            voltage_clamp_pu: (0.9, 1.1),
            enforce_q_limits: false,
            max_q_iterations: 10,
            stable_band: 0.05,
            marginal_band: 0.10,
        }
    }
}

impl SolveConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerance(mut self, tolerance_pu: f64) -> Self {
        self.tolerance_pu = tolerance_pu;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_base_mva(mut self, base_mva: f64) -> Self {
        self.base_mva = base_mva;
        self
    }

    pub fn with_voltage_clamp(mut self, min_pu: f64, max_pu: f64) -> Self {
        self.voltage_clamp_pu = (min_pu, max_pu);
        self
    }

    pub fn with_q_limit_enforcement(mut self, enable: bool) -> Self {
        self.enforce_q_limits = enable;
        self
    }
}

/// Immutable snapshot of the iteration: per-unit magnitudes and radian
/// angles in bus order, plus where the iteration stands.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverState {
    pub voltages: Vec<f64>,
    pub angles: Vec<f64>,
    pub iteration: u32,
    /// Largest mismatch measured *at* this state; infinite until evaluated.
    pub max_mismatch: f64,
}

impl SolverState {
    /// Flat start: 1.0 pu at PQ buses, specified setpoints at slack and PV
    /// buses; angles zero except where the slack pins them.
    pub fn flat_start(model: &NetworkModel) -> Self {
        let mut voltages = Vec::with_capacity(model.bus_count());
        let mut angles = Vec::with_capacity(model.bus_count());
        for bus in model.buses() {
            match &bus.kind {
                BusKind::Slack { voltage, angle } => {
                    voltages.push(voltage.value());
                    angles.push(angle.value());
                }
                BusKind::Pv {
                    voltage_setpoint, ..
                } => {
                    voltages.push(voltage_setpoint.value());
                    angles.push(0.0);
                }
                BusKind::Pq { .. } => {
                    voltages.push(1.0);
                    angles.push(0.0);
                }
            }
        }
        Self {
            voltages,
            angles,
            iteration: 0,
            max_mismatch: f64::INFINITY,
        }
    }

    /// The same operating point, annotated with its measured mismatch.
    fn measured(mut self, max_mismatch: f64) -> Self {
        self.max_mismatch = max_mismatch;
        self
    }

    /// The next iterate after applying a correction.
    fn advanced(&self, voltages: Vec<f64>, angles: Vec<f64>) -> Self {
        Self {
            voltages,
            angles,
            iteration: self.iteration + 1,
            max_mismatch: f64::INFINITY,
        }
    }
}

/// Configured Newton-Raphson load-flow solver.
#[derive(Debug, Clone, Default)]
pub struct NewtonRaphsonSolver {
    config: SolveConfig,
}

impl NewtonRaphsonSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SolveConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolveConfig {
        &self.config
    }

    /// Run one complete study. Pure: the same model and config always
    /// produce the bit-identical result.
    pub fn solve(&self, model: &NetworkModel) -> LoadFlowResult {
        solve(model, &self.config)
    }
}

/// Solve a load-flow case. See [`NewtonRaphsonSolver::solve`].
pub fn solve(model: &NetworkModel, config: &SolveConfig) -> LoadFlowResult {
    let ybus = AdmittanceMatrix::build(model);
    let mut roles: Vec<BusRole> = Classification::from_model(model).roles;
    let (p_spec, mut q_spec) = mismatch::specified_injections(model, config.base_mva);

    let mut state = SolverState::flat_start(model);
    let mut history = Vec::new();
    let mut termination;

    let mut q_round = 0;
    loop {
        let class = Classification::from_roles(roles.clone());
        let outcome = iterate(&ybus, &class, &p_spec, &q_spec, state, config);
        state = outcome.0;
        termination = outcome.1;
        history.extend(outcome.2);

        if termination != Termination::Converged || !config.enforce_q_limits {
            break;
        }
        if q_round >= config.max_q_iterations {
            debug!(rounds = q_round, "reactive-limit switching budget exhausted");
            break;
        }

        let switched = enforce_q_limits(
            model,
            &ybus,
            &state,
            &mut roles,
            &mut q_spec,
            config.base_mva,
        );
        if !switched {
            break;
        }
        q_round += 1;
        // Warm-start the re-solve from the current operating point.
    }

    assemble(model, &ybus, state, termination, history, &roles, config)
}

/// Inner iteration loop over a fixed bus classification.
fn iterate(
    ybus: &AdmittanceMatrix,
    class: &Classification,
    p_spec: &[f64],
    q_spec: &[f64],
    initial: SolverState,
    config: &SolveConfig,
) -> (SolverState, Termination, Vec<f64>) {
    let (v_min, v_max) = config.voltage_clamp_pu;
    let n_p = class.angle_buses.len();
    let mut history = Vec::new();
    let mut state = initial;

    loop {
        let mis = mismatch::evaluate(
            ybus,
            &state.voltages,
            &state.angles,
            p_spec,
            q_spec,
            class,
        );
        history.push(mis.max_abs);
        state = state.measured(mis.max_abs);
        debug!(
            iteration = state.iteration,
            max_mismatch = mis.max_abs,
            "mismatch evaluated"
        );

        if mis.max_abs < config.tolerance_pu {
            return (state, Termination::Converged, history);
        }
        if state.iteration >= config.max_iterations {
            return (state, Termination::MaxIterations, history);
        }

        let jac = jacobian::build(ybus, &state.voltages, &state.angles, &mis, class);
        let correction = match jacobian::solve_correction(&jac, &mis.vector) {
            Ok(correction) => correction,
            Err(_) => return (state, Termination::SingularJacobian, history),
        };

        let mut voltages = state.voltages.clone();
        let mut angles = state.angles.clone();
        for (k, &i) in class.angle_buses.iter().enumerate() {
            angles[i] += correction[k];
        }
        for (k, &i) in class.voltage_buses.iter().enumerate() {
            voltages[i] = (voltages[i] + correction[n_p + k]).clamp(v_min, v_max);
        }
        trace!(iteration = state.iteration, "state advanced");
        state = state.advanced(voltages, angles);
    }
}

/// Demote PV buses whose reactive output left its band; returns whether any
/// bus switched. The violated bound becomes the bus's fixed Q injection.
fn enforce_q_limits(
    model: &NetworkModel,
    ybus: &AdmittanceMatrix,
    state: &SolverState,
    roles: &mut [BusRole],
    q_spec: &mut [f64],
    base_mva: f64,
) -> bool {
    let (_, q_calc) = mismatch::calculated_injections(ybus, &state.voltages, &state.angles);
    let mut switched = false;

    for (i, bus) in model.buses().iter().enumerate() {
        if roles[i] != BusRole::Pv {
            continue;
        }
        let BusKind::Pv {
            q_limits: Some(limits),
            ..
        } = &bus.kind
        else {
            continue;
        };

        let q_mvar = Megavars(q_calc[i] * base_mva);
        if let Some(bound) = limits.violated_by(q_mvar) {
            debug!(
                bus = %bus.id,
                q_mvar = q_mvar.value(),
                bound = bound.value(),
                "reactive limit hit, switching PV bus to PQ"
            );
            roles[i] = BusRole::Pq;
            q_spec[i] = bound.value() / base_mva;
            switched = true;
        }
    }

    switched
}

/// Fold the final state into the public result contract.
fn assemble(
    model: &NetworkModel,
    ybus: &AdmittanceMatrix,
    state: SolverState,
    termination: Termination,
    history: Vec<f64>,
    roles: &[BusRole],
    config: &SolveConfig,
) -> LoadFlowResult {
    let converged = termination == Termination::Converged;
    let (p_calc, q_calc) =
        mismatch::calculated_injections(ybus, &state.voltages, &state.angles);

    let buses: Vec<BusResult> = model
        .buses()
        .iter()
        .enumerate()
        .map(|(i, bus)| BusResult {
            id: bus.id,
            name: bus.name.clone(),
            kind: roles[i].tag().to_string(),
            voltage_pu: state.voltages[i],
            angle_rad: state.angles[i],
            p_injection_mw: p_calc[i] * config.base_mva,
            q_injection_mvar: q_calc[i] * config.base_mva,
        })
        .collect();

    let branches = branch_flows(
        model,
        &state.voltages,
        &state.angles,
        config.base_mva,
        config.base_kv,
    );

    let generation_mw: f64 = buses
        .iter()
        .map(|b| b.p_injection_mw.max(0.0))
        .sum();
    let load_mw: f64 = buses.iter().map(|b| (-b.p_injection_mw).max(0.0)).sum();
    let losses_mw: f64 = branches.iter().map(|b| b.losses_mw).sum();

    let stability = stability::classify(
        converged,
        &state.voltages,
        config.stable_band,
        config.marginal_band,
    );

    LoadFlowResult {
        converged,
        iterations: state.iteration,
        max_mismatch: state.max_mismatch,
        termination,
        buses,
        branches,
        totals: SystemTotals {
            generation_mw,
            load_mw,
            losses_mw,
        },
        stability,
        mismatch_history: history,
    }
}
