//! Voltage-based stability classification of a solved case.

use serde::{Deserialize, Serialize};

/// Operator-facing verdict on the solved operating point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StabilityClass {
    /// Converged with every voltage inside the stable band.
    Stable,
    /// Converged, but at least one voltage strays into the marginal band.
    Marginal,
    /// Diverged, or a voltage outside even the marginal band.
    Unstable,
}

impl std::fmt::Display for StabilityClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            StabilityClass::Stable => "stable",
            StabilityClass::Marginal => "marginal",
            StabilityClass::Unstable => "unstable",
        };
        f.write_str(label)
    }
}

/// Classify from convergence status and the final voltage profile.
///
/// Bands are half-widths around 1.0 pu nominal: the defaults of 0.05 and
/// 0.10 mean "stable inside ±5%, marginal inside ±10%, unstable beyond".
/// Total over all inputs; non-finite voltages classify as unstable.
pub fn classify(
    converged: bool,
    voltages: &[f64],
    stable_band: f64,
    marginal_band: f64,
) -> StabilityClass {
    if !converged {
        return StabilityClass::Unstable;
    }

    let worst = voltages
        .iter()
        .map(|v| if v.is_finite() { (v - 1.0).abs() } else { f64::INFINITY })
        .fold(0.0_f64, f64::max);

    if worst > marginal_band {
        StabilityClass::Unstable
    } else if worst > stable_band {
        StabilityClass::Marginal
    } else {
        StabilityClass::Stable
    }
}
