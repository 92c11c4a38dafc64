//! Structural validation errors.
//!
//! [`InvalidNetwork`] covers everything that makes a network unsolvable by
//! construction: these are hard failures raised before any iteration runs.
//! Numerical trouble (non-convergence, a singular Jacobian) is deliberately
//! *not* represented here; those outcomes are reported inside the solve
//! result so callers can display "inconclusive" instead of crashing.

use crate::{BranchId, BusId};
use thiserror::Error;

/// A network that cannot be solved as given.
///
/// Produced by [`NetworkModel::new`](crate::NetworkModel::new) and
/// [`validate`](crate::validate); once a [`NetworkModel`](crate::NetworkModel)
/// exists, none of these conditions can hold.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidNetwork {
    /// The bus list is empty.
    #[error("network has no buses")]
    Empty,

    /// Two buses share an id.
    #[error("duplicate bus id {0}")]
    DuplicateBusId(BusId),

    /// Two branches share an id.
    #[error("duplicate branch id {0}")]
    DuplicateBranchId(BranchId),

    /// No slack bus anywhere in the network.
    #[error("network has no slack bus")]
    NoSlackBus,

    /// More than one slack bus in a single connected component.
    #[error("connected component contains {count} slack buses (buses {first} and {second})")]
    MultipleSlackBuses {
        count: usize,
        first: BusId,
        second: BusId,
    },

    /// A connected component of buses has no slack to reference angles to.
    #[error("island containing bus {bus} has no slack bus")]
    IslandWithoutSlack { bus: BusId },

    /// A branch endpoint does not name an existing bus.
    #[error("branch {branch} references unknown bus {bus}")]
    UnknownBus { branch: BranchId, bus: BusId },

    /// A branch connects a bus to itself.
    #[error("branch {branch} connects bus {bus} to itself")]
    SelfLoop { branch: BranchId, bus: BusId },

    /// Negative series resistance or reactance.
    #[error("branch {branch} has negative impedance (r = {r}, x = {x})")]
    NegativeImpedance { branch: BranchId, r: f64, x: f64 },

    /// A physical line must have some series impedance.
    #[error("branch {branch} has zero series impedance")]
    ZeroImpedance { branch: BranchId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_element() {
        let err = InvalidNetwork::UnknownBus {
            branch: BranchId::new(3),
            bus: BusId::new(9),
        };
        let text = err.to_string();
        assert!(text.contains('3'));
        assert!(text.contains('9'));
    }
}
