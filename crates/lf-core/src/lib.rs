//! # lf-core: Load-Flow Network Model
//!
//! Data structures and validation for steady-state load-flow analysis.
//! This crate holds pure data only; the numerics live in `lf-algo`, and
//! JSON interchange in `lf-io`.
//!
//! ## Model
//!
//! A network is a flat list of [`Bus`] records and [`Branch`] records wired
//! together by id. Each bus carries a [`BusKind`] describing what is known
//! about it before the solve:
//!
//! | Kind | Fixed | Solved |
//! |-------|----------------|----------------|
//! | Slack | V, δ | P, Q |
//! | PV | V, P | Q, δ |
//! | PQ | P, Q | V, δ |
//!
//! The variants carry only the fields meaningful to them, so states like "a
//! load bus with a voltage setpoint" cannot be expressed at all.
//!
//! ## Validation at construction
//!
//! [`NetworkModel::new`] runs every structural check and refuses to build a
//! model that violates one. Downstream code therefore never re-validates:
//! holding a `&NetworkModel` *is* the proof that ids resolve, impedances are
//! physical, and every electrical island has exactly one slack bus.
//!
//! ```
//! use lf_core::{Branch, BranchId, Bus, BusId, NetworkModel};
//! use lf_core::units::{Megavars, Megawatts, PerUnit, Radians};
//!
//! let buses = vec![
//!     Bus::slack(BusId::new(0), "grid", PerUnit::ONE, Radians::ZERO),
//!     Bus::pq(BusId::new(1), "feeder", Megawatts(50.0), Megavars(20.0)),
//! ];
//! let branches = vec![
//!     Branch::new(BranchId::new(0), "line", BusId::new(0), BusId::new(1), 0.01, 0.05),
//! ];
//! let model = NetworkModel::new(buses, branches).expect("valid network");
//! assert_eq!(model.bus_count(), 2);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod diagnostics;
pub mod error;
pub mod topology;
pub mod units;

pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::InvalidNetwork;
pub use units::{
    Degrees, Kiloamperes, Kilovolts, Megavars, MegavoltAmperes, Megawatts, PerUnit, Radians,
};

/// Identifier of a bus, unique within one network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusId(usize);

impl BusId {
    #[inline]
    pub const fn new(value: usize) -> Self {
        BusId(value)
    }

    #[inline]
    pub const fn value(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for BusId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a branch, unique within one network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchId(usize);

impl BranchId {
    #[inline]
    pub const fn new(value: usize) -> Self {
        BranchId(value)
    }

    #[inline]
    pub const fn value(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for BranchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reactive capability band of a voltage-controlled bus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QLimits {
    pub min: Megavars,
    pub max: Megavars,
}

impl QLimits {
    pub fn new(min: Megavars, max: Megavars) -> Self {
        Self { min, max }
    }

    /// Clip a reactive output to the band, returning the violated bound if any.
    pub fn violated_by(&self, q: Megavars) -> Option<Megavars> {
        if q.value() > self.max.value() {
            Some(self.max)
        } else if q.value() < self.min.value() {
            Some(self.min)
        } else {
            None
        }
    }
}

/// What is specified at a bus ahead of the solve.
#[derive(Debug, Clone, PartialEq)]
pub enum BusKind {
    /// Reference bus: voltage magnitude and angle held fixed; absorbs the
    /// system power imbalance. Exactly one per electrical island.
    Slack { voltage: PerUnit, angle: Radians },
    /// Generator bus: magnitude held at the setpoint, scheduled active
    /// power injected; reactive output is solved, optionally bounded.
    Pv {
        voltage_setpoint: PerUnit,
        active_power: Megawatts,
        q_limits: Option<QLimits>,
    },
    /// Load bus: active and reactive demand specified (positive values
    /// consume); voltage magnitude and angle are solved.
    Pq {
        active_power: Megawatts,
        reactive_power: Megavars,
    },
}

impl BusKind {
    pub fn is_slack(&self) -> bool {
        matches!(self, BusKind::Slack { .. })
    }

    pub fn is_pv(&self) -> bool {
        matches!(self, BusKind::Pv { .. })
    }

    pub fn is_pq(&self) -> bool {
        matches!(self, BusKind::Pq { .. })
    }

    /// Short lowercase tag, the same vocabulary the interchange format uses.
    pub fn tag(&self) -> &'static str {
        match self {
            BusKind::Slack { .. } => "slack",
            BusKind::Pv { .. } => "pv",
            BusKind::Pq { .. } => "pq",
        }
    }
}

/// A node of the electrical network.
#[derive(Debug, Clone, PartialEq)]
pub struct Bus {
    pub id: BusId,
    pub name: String,
    /// Base voltage for per-unit conversions at this bus.
    pub base_kv: Kilovolts,
    pub kind: BusKind,
}

impl Bus {
    pub fn slack(id: BusId, name: impl Into<String>, voltage: PerUnit, angle: Radians) -> Self {
        Self {
            id,
            name: name.into(),
            base_kv: Kilovolts(13.8),
            kind: BusKind::Slack { voltage, angle },
        }
    }

    pub fn pv(
        id: BusId,
        name: impl Into<String>,
        voltage_setpoint: PerUnit,
        active_power: Megawatts,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            base_kv: Kilovolts(13.8),
            kind: BusKind::Pv {
                voltage_setpoint,
                active_power,
                q_limits: None,
            },
        }
    }

    pub fn pq(
        id: BusId,
        name: impl Into<String>,
        active_power: Megawatts,
        reactive_power: Megavars,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            base_kv: Kilovolts(13.8),
            kind: BusKind::Pq {
                active_power,
                reactive_power,
            },
        }
    }

    pub fn with_base_kv(mut self, base_kv: Kilovolts) -> Self {
        self.base_kv = base_kv;
        self
    }

    /// Attach a reactive capability band; only meaningful on a PV bus.
    pub fn with_q_limits(mut self, min: Megavars, max: Megavars) -> Self {
        if let BusKind::Pv { q_limits, .. } = &mut self.kind {
            *q_limits = Some(QLimits::new(min, max));
        }
        self
    }
}

/// A series element (line or two-winding transformer) between two buses.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub id: BranchId,
    pub name: String,
    pub from_bus: BusId,
    pub to_bus: BusId,
    /// Series resistance, per-unit on the system base.
    pub resistance: f64,
    /// Series reactance, per-unit on the system base.
    pub reactance: f64,
    /// Total line-charging susceptance, split half per end.
    pub charging_b: PerUnit,
    /// Thermal rating; `None` means unrated (loading is not reported).
    pub rating_mva: Option<MegavoltAmperes>,
}

impl Branch {
    pub fn new(
        id: BranchId,
        name: impl Into<String>,
        from_bus: BusId,
        to_bus: BusId,
        resistance: f64,
        reactance: f64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            from_bus,
            to_bus,
            resistance,
            reactance,
            charging_b: PerUnit(0.0),
            rating_mva: None,
        }
    }

    pub fn with_charging(mut self, b: PerUnit) -> Self {
        self.charging_b = b;
        self
    }

    pub fn with_rating(mut self, rating: MegavoltAmperes) -> Self {
        self.rating_mva = Some(rating);
        self
    }
}

/// A validated, immutable network: the sole input to every solver component.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkModel {
    buses: Vec<Bus>,
    branches: Vec<Branch>,
    index: HashMap<BusId, usize>,
}

impl NetworkModel {
    /// Build a model, running every structural check.
    ///
    /// Bus order is preserved and defines the matrix ordering used by the
    /// solver, so results are deterministic for a given input.
    pub fn new(buses: Vec<Bus>, branches: Vec<Branch>) -> Result<Self, InvalidNetwork> {
        let index = validate_parts(&buses, &branches)?;
        Ok(Self {
            buses,
            branches,
            index,
        })
    }

    pub fn buses(&self) -> &[Bus] {
        &self.buses
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn bus_count(&self) -> usize {
        self.buses.len()
    }

    pub fn branch_count(&self) -> usize {
        self.branches.len()
    }

    /// Position of a bus in matrix order.
    pub fn bus_position(&self, id: BusId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn bus(&self, id: BusId) -> Option<&Bus> {
        self.bus_position(id).map(|i| &self.buses[i])
    }

    /// Positions of all slack buses (one per island, by construction).
    pub fn slack_positions(&self) -> Vec<usize> {
        self.buses
            .iter()
            .enumerate()
            .filter(|(_, b)| b.kind.is_slack())
            .map(|(i, _)| i)
            .collect()
    }

    /// Total scheduled PV generation.
    pub fn scheduled_generation(&self) -> Megawatts {
        self.buses
            .iter()
            .filter_map(|b| match b.kind {
                BusKind::Pv { active_power, .. } => Some(active_power),
                _ => None,
            })
            .sum()
    }

    /// Total specified PQ demand.
    pub fn total_demand(&self) -> (Megawatts, Megavars) {
        let mut p = Megawatts(0.0);
        let mut q = Megavars(0.0);
        for bus in &self.buses {
            if let BusKind::Pq {
                active_power,
                reactive_power,
            } = bus.kind
            {
                p = p + active_power;
                q = q + reactive_power;
            }
        }
        (p, q)
    }

    /// A copy of this network with one branch removed, for outage studies.
    ///
    /// Returns `Err` when the outage leaves an island without a slack bus;
    /// the caller decides whether that is a finding or a failure.
    pub fn without_branch(&self, id: BranchId) -> Result<NetworkModel, InvalidNetwork> {
        let branches = self
            .branches
            .iter()
            .filter(|b| b.id != id)
            .cloned()
            .collect();
        NetworkModel::new(self.buses.clone(), branches)
    }

    /// Advisory checks that do not block a solve.
    pub fn sanity_check(&self) -> Diagnostics {
        let mut diag = Diagnostics::new();
        for branch in &self.branches {
            if branch.rating_mva.is_none() {
                diag.add_warning_for(
                    "rating",
                    "branch has no MVA rating; loading will not be reported",
                    format!("branch {}", branch.id),
                );
            }
            if branch.reactance > 0.0 && branch.resistance / branch.reactance > 3.0 {
                diag.add_warning_for(
                    "physical",
                    format!(
                        "unusual R/X ratio {:.2}; check impedance data",
                        branch.resistance / branch.reactance
                    ),
                    format!("branch {}", branch.id),
                );
            }
        }
        for bus in &self.buses {
            let setpoint = match bus.kind {
                BusKind::Slack { voltage, .. } => Some(voltage),
                BusKind::Pv {
                    voltage_setpoint, ..
                } => Some(voltage_setpoint),
                BusKind::Pq { .. } => None,
            };
            if let Some(v) = setpoint {
                if !(0.9..=1.1).contains(&v.value()) {
                    diag.add_warning_for(
                        "setpoint",
                        format!("voltage setpoint {v} is far from nominal"),
                        format!("bus {}", bus.id),
                    );
                }
            }
        }
        diag
    }
}

/// Check a bus/branch list without constructing a model.
pub fn validate(buses: &[Bus], branches: &[Branch]) -> Result<(), InvalidNetwork> {
    validate_parts(buses, branches).map(|_| ())
}

fn validate_parts(
    buses: &[Bus],
    branches: &[Branch],
) -> Result<HashMap<BusId, usize>, InvalidNetwork> {
    if buses.is_empty() {
        return Err(InvalidNetwork::Empty);
    }

    let mut index = HashMap::with_capacity(buses.len());
    for (position, bus) in buses.iter().enumerate() {
        if index.insert(bus.id, position).is_some() {
            return Err(InvalidNetwork::DuplicateBusId(bus.id));
        }
    }

    let mut branch_ids = std::collections::HashSet::with_capacity(branches.len());
    let mut links = Vec::with_capacity(branches.len());
    for branch in branches {
        if !branch_ids.insert(branch.id) {
            return Err(InvalidNetwork::DuplicateBranchId(branch.id));
        }
        let from = *index
            .get(&branch.from_bus)
            .ok_or(InvalidNetwork::UnknownBus {
                branch: branch.id,
                bus: branch.from_bus,
            })?;
        let to = *index.get(&branch.to_bus).ok_or(InvalidNetwork::UnknownBus {
            branch: branch.id,
            bus: branch.to_bus,
        })?;
        if from == to {
            return Err(InvalidNetwork::SelfLoop {
                branch: branch.id,
                bus: branch.from_bus,
            });
        }
        if branch.resistance < 0.0 || branch.reactance < 0.0 {
            return Err(InvalidNetwork::NegativeImpedance {
                branch: branch.id,
                r: branch.resistance,
                x: branch.reactance,
            });
        }
        if branch.resistance == 0.0 && branch.reactance == 0.0 {
            return Err(InvalidNetwork::ZeroImpedance { branch: branch.id });
        }
        links.push((from, to));
    }

    if !buses.iter().any(|b| b.kind.is_slack()) {
        return Err(InvalidNetwork::NoSlackBus);
    }

    for island in topology::islands(buses.len(), &links) {
        let slacks: Vec<usize> = island
            .iter()
            .copied()
            .filter(|&i| buses[i].kind.is_slack())
            .collect();
        match slacks.len() {
            0 => {
                return Err(InvalidNetwork::IslandWithoutSlack {
                    bus: buses[island[0]].id,
                })
            }
            1 => {}
            n => {
                return Err(InvalidNetwork::MultipleSlackBuses {
                    count: n,
                    first: buses[slacks[0]].id,
                    second: buses[slacks[1]].id,
                })
            }
        }
    }

    Ok(index)
}
