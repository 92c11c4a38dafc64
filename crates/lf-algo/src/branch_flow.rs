//! Per-branch flow quantities derived from a solved voltage profile.
//!
//! Works on whatever state the solver finished with, converged or not, so
//! diverged studies still show the flows behind the failure. Only the
//! series element carries the reported current; line charging shifts bus
//! injections but not the conductor loading figure operators care about.

use crate::result::BranchResult;
use lf_core::NetworkModel;
use num_complex::Complex64;

/// Compute flows for every branch against the given per-unit state.
///
/// `fallback_base_kv` is used for the kA conversion when a bus has no
/// voltage base of its own.
pub fn branch_flows(
    model: &NetworkModel,
    voltages: &[f64],
    angles: &[f64],
    base_mva: f64,
    fallback_base_kv: f64,
) -> Vec<BranchResult> {
    let sqrt3 = 3.0_f64.sqrt();

    model
        .branches()
        .iter()
        .filter_map(|branch| {
            let f = model.bus_position(branch.from_bus)?;
            let t = model.bus_position(branch.to_bus)?;

            let v_from = Complex64::from_polar(voltages[f], angles[f]);
            let v_to = Complex64::from_polar(voltages[t], angles[t]);
            let z = Complex64::new(branch.resistance, branch.reactance);

            let current = (v_from - v_to) / z;
            let current_pu = current.norm();

            let base_kv = {
                let bus_base = model.buses()[f].base_kv.value();
                if bus_base > 0.0 {
                    bus_base
                } else {
                    fallback_base_kv
                }
            };
            let base_current_ka = base_mva / (sqrt3 * base_kv);

            let sending = v_from * current.conj();
            let losses_mw = current_pu * current_pu * branch.resistance * base_mva;

            let loading_percent = branch.rating_mva.map(|rating| {
                let rated_current_pu = rating.value() / base_mva;
                current_pu / rated_current_pu * 100.0
            });

            Some(BranchResult {
                id: branch.id,
                name: branch.name.clone(),
                from_bus: branch.from_bus,
                to_bus: branch.to_bus,
                current_pu,
                current_ka: current_pu * base_current_ka,
                p_from_mw: sending.re * base_mva,
                losses_mw,
                loading_percent,
            })
        })
        .collect()
}
