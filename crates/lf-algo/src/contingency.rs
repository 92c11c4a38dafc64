//! N-1 branch-outage screening.
//!
//! Each outage study is an independent solve over its own network copy, so
//! the whole sweep parallelizes trivially: no locks, no shared state, and
//! the outcome order always matches branch order regardless of scheduling.
//!
//! An outage that severs the network (or strands buses without a slack) is
//! a legitimate screening finding, not a failure, and is reported as
//! [`ContingencyOutcome::Islanded`].

use crate::newton::{solve, SolveConfig};
use crate::result::LoadFlowResult;
use crate::stability::StabilityClass;
use lf_core::{BranchId, NetworkModel};
use rayon::prelude::*;

/// What happened when one branch was taken out of service.
#[derive(Debug, Clone)]
pub enum ContingencyOutcome {
    /// The reduced network solved (possibly to a diverged result).
    Solved {
        outaged: BranchId,
        result: LoadFlowResult,
    },
    /// Removing the branch left part of the network without a slack bus.
    Islanded { outaged: BranchId },
}

impl ContingencyOutcome {
    pub fn outaged(&self) -> BranchId {
        match self {
            ContingencyOutcome::Solved { outaged, .. }
            | ContingencyOutcome::Islanded { outaged } => *outaged,
        }
    }

    /// The case is secure when it solved, converged, and stayed stable.
    pub fn is_secure(&self) -> bool {
        matches!(
            self,
            ContingencyOutcome::Solved { result, .. }
                if result.converged && result.stability == StabilityClass::Stable
        )
    }
}

/// All single-branch outcomes of a screening sweep.
#[derive(Debug, Clone)]
pub struct ContingencyReport {
    pub outcomes: Vec<ContingencyOutcome>,
}

impl ContingencyReport {
    /// Outcomes that violated security (diverged, unstable, or islanded).
    pub fn insecure(&self) -> impl Iterator<Item = &ContingencyOutcome> {
        self.outcomes.iter().filter(|o| !o.is_secure())
    }

    pub fn secure_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_secure()).count()
    }

    pub fn summary(&self) -> String {
        format!(
            "N-1 screening: {}/{} outages secure",
            self.secure_count(),
            self.outcomes.len()
        )
    }
}

/// Solve every single-branch outage of the network in parallel.
pub fn n_minus_one(model: &NetworkModel, config: &SolveConfig) -> ContingencyReport {
    let outcomes = model
        .branches()
        .par_iter()
        .map(|branch| match model.without_branch(branch.id) {
            Ok(reduced) => ContingencyOutcome::Solved {
                outaged: branch.id,
                result: solve(&reduced, config),
            },
            Err(_) => ContingencyOutcome::Islanded { outaged: branch.id },
        })
        .collect();

    ContingencyReport { outcomes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lf_core::units::{Megavars, Megawatts, PerUnit, Radians};
    use lf_core::{Branch, BranchId, Bus, BusId};

    /// Slack and load joined by two parallel lines: either line can fail
    /// without losing the load, but there is no third path.
    fn parallel_feed() -> NetworkModel {
        let buses = vec![
            Bus::slack(BusId::new(0), "grid", PerUnit::ONE, Radians::ZERO),
            Bus::pq(BusId::new(1), "feeder", Megawatts(30.0), Megavars(10.0)),
        ];
        let branches = vec![
            Branch::new(BranchId::new(0), "line-a", BusId::new(0), BusId::new(1), 0.01, 0.05),
            Branch::new(BranchId::new(1), "line-b", BusId::new(0), BusId::new(1), 0.01, 0.05),
        ];
        NetworkModel::new(buses, branches).unwrap()
    }

    #[test]
    fn every_branch_gets_an_outcome_in_order() {
        let model = parallel_feed();
        let report = n_minus_one(&model, &SolveConfig::default());

        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.outcomes[0].outaged(), BranchId::new(0));
        assert_eq!(report.outcomes[1].outaged(), BranchId::new(1));
    }

    #[test]
    fn losing_one_of_two_parallel_lines_is_secure() {
        let model = parallel_feed();
        let report = n_minus_one(&model, &SolveConfig::default());

        assert_eq!(report.secure_count(), 2);
        assert!(report.insecure().next().is_none());
    }

    #[test]
    fn radial_outage_is_reported_as_islanding() {
        let buses = vec![
            Bus::slack(BusId::new(0), "grid", PerUnit::ONE, Radians::ZERO),
            Bus::pq(BusId::new(1), "feeder", Megawatts(30.0), Megavars(10.0)),
        ];
        let branches = vec![Branch::new(
            BranchId::new(0),
            "only-line",
            BusId::new(0),
            BusId::new(1),
            0.01,
            0.05,
        )];
        let model = NetworkModel::new(buses, branches).unwrap();
        let report = n_minus_one(&model, &SolveConfig::default());

        assert_eq!(report.outcomes.len(), 1);
        assert!(matches!(
            report.outcomes[0],
            ContingencyOutcome::Islanded { .. }
        ));
        assert_eq!(report.summary(), "N-1 screening: 0/1 outages secure");
    }

    #[test]
    fn repeat_sweeps_are_deterministic() {
        let model = parallel_feed();
        let config = SolveConfig::default();
        let first = n_minus_one(&model, &config);
        let second = n_minus_one(&model, &config);

        for (a, b) in first.outcomes.iter().zip(&second.outcomes) {
            match (a, b) {
                (
                    ContingencyOutcome::Solved { result: ra, .. },
                    ContingencyOutcome::Solved { result: rb, .. },
                ) => assert_eq!(ra, rb),
                (ContingencyOutcome::Islanded { .. }, ContingencyOutcome::Islanded { .. }) => {}
                _ => unreachable!("outcome kinds differ between sweeps"),
            }
        }
    }
}
