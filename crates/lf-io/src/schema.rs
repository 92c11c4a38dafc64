//! Flat wire records and their conversion to the validated model.
//!
//! The interchange format keeps buses and branches as loosely-typed JSON
//! objects (`kind` is a string, unknown fields are ignored) so that any
//! front end can produce it. Conversion into [`NetworkModel`] is where the
//! strings become enums; two distinct failure layers apply:
//!
//! - [`SchemaError`]: the record itself is malformed (unknown kind, a PQ
//!   bus without its demand figures).
//! - [`InvalidNetwork`]: records parsed fine but the network they describe
//!   is structurally unsolvable.
//!
//! Angles travel in radians; powers in MW/Mvar; impedances per-unit.

use lf_core::units::{Kilovolts, Megavars, MegavoltAmperes, Megawatts, PerUnit, Radians};
use lf_core::{Branch, BranchId, Bus, BusId, BusKind, InvalidNetwork, NetworkModel};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A record that cannot be turned into a model element.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("bus {bus}: unknown kind \"{kind}\" (expected slack, pv or pq)")]
    UnknownKind { bus: usize, kind: String },

    #[error("bus {bus}: kind \"{kind}\" requires field \"{field}\"")]
    MissingField {
        bus: usize,
        kind: &'static str,
        field: &'static str,
    },

    #[error("bus {bus}: reactive limits need both qMin and qMax")]
    HalfOpenQLimits { bus: usize },
}

/// Why an import failed: bad records, or a bad network made of good records.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Invalid(#[from] InvalidNetwork),
}

/// Top-level interchange document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkFile {
    pub buses: Vec<BusRecord>,
    pub branches: Vec<BranchRecord>,
}

/// One bus on the wire. Only `id` and `kind` are always present; the rest
/// depends on the kind, with missing optional values defaulted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusRecord {
    pub id: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub kind: String,
    /// Active power: generation for pv, demand for pq.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p: Option<f64>,
    /// Reactive demand, pq only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage_setpoint: Option<f64>,
    /// Slack angle in radians.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
    #[serde(
        default,
        rename = "baseKV",
        skip_serializing_if = "Option::is_none"
    )]
    pub base_kv: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q_max: Option<f64>,
}

/// One branch on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchRecord {
    pub id: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub from: usize,
    pub to: usize,
    pub r: f64,
    pub x: f64,
    /// Total line-charging susceptance; defaults to zero.
    #[serde(default)]
    pub b: f64,
    #[serde(
        default,
        rename = "ratingMVA",
        skip_serializing_if = "Option::is_none"
    )]
    pub rating_mva: Option<f64>,
}

impl BusRecord {
    fn into_bus(self) -> Result<Bus, SchemaError> {
        let kind = match self.kind.as_str() {
            "slack" => BusKind::Slack {
                voltage: PerUnit(self.voltage_setpoint.unwrap_or(1.0)),
                angle: Radians(self.angle.unwrap_or(0.0)),
            },
            "pv" => {
                let active = self.p.ok_or(SchemaError::MissingField {
                    bus: self.id,
                    kind: "pv",
                    field: "p",
                })?;
                let q_limits = match (self.q_min, self.q_max) {
                    (Some(min), Some(max)) => {
                        Some(lf_core::QLimits::new(Megavars(min), Megavars(max)))
                    }
                    (None, None) => None,
                    _ => return Err(SchemaError::HalfOpenQLimits { bus: self.id }),
                };
                BusKind::Pv {
                    voltage_setpoint: PerUnit(self.voltage_setpoint.unwrap_or(1.0)),
                    active_power: Megawatts(active),
                    q_limits,
                }
            }
            "pq" => {
                let p = self.p.ok_or(SchemaError::MissingField {
                    bus: self.id,
                    kind: "pq",
                    field: "p",
                })?;
                let q = self.q.ok_or(SchemaError::MissingField {
                    bus: self.id,
                    kind: "pq",
                    field: "q",
                })?;
                BusKind::Pq {
                    active_power: Megawatts(p),
                    reactive_power: Megavars(q),
                }
            }
            other => {
                return Err(SchemaError::UnknownKind {
                    bus: self.id,
                    kind: other.to_string(),
                })
            }
        };

        let mut bus = Bus {
            id: BusId::new(self.id),
            name: self.name.unwrap_or_default(),
            base_kv: Kilovolts(self.base_kv.unwrap_or(13.8)),
            kind,
        };
        if bus.name.is_empty() {
            bus.name = format!("bus-{}", self.id);
        }
        Ok(bus)
    }

    fn from_bus(bus: &Bus) -> Self {
        let mut record = BusRecord {
            id: bus.id.value(),
            name: Some(bus.name.clone()),
            kind: bus.kind.tag().to_string(),
            p: None,
            q: None,
            voltage_setpoint: None,
            angle: None,
            base_kv: Some(bus.base_kv.value()),
            q_min: None,
            q_max: None,
        };
        match &bus.kind {
            BusKind::Slack { voltage, angle } => {
                record.voltage_setpoint = Some(voltage.value());
                record.angle = Some(angle.value());
            }
            BusKind::Pv {
                voltage_setpoint,
                active_power,
                q_limits,
            } => {
                record.voltage_setpoint = Some(voltage_setpoint.value());
                record.p = Some(active_power.value());
                if let Some(limits) = q_limits {
                    record.q_min = Some(limits.min.value());
                    record.q_max = Some(limits.max.value());
                }
            }
            BusKind::Pq {
                active_power,
                reactive_power,
            } => {
                record.p = Some(active_power.value());
                record.q = Some(reactive_power.value());
            }
        }
        record
    }
}

impl BranchRecord {
    fn into_branch(self) -> Branch {
        let mut branch = Branch::new(
            BranchId::new(self.id),
            self.name.unwrap_or_else(|| format!("branch-{}", self.id)),
            BusId::new(self.from),
            BusId::new(self.to),
            self.r,
            self.x,
        )
        .with_charging(PerUnit(self.b));
        if let Some(rating) = self.rating_mva {
            branch = branch.with_rating(MegavoltAmperes(rating));
        }
        branch
    }

    fn from_branch(branch: &Branch) -> Self {
        BranchRecord {
            id: branch.id.value(),
            name: Some(branch.name.clone()),
            from: branch.from_bus.value(),
            to: branch.to_bus.value(),
            r: branch.resistance,
            x: branch.reactance,
            b: branch.charging_b.value(),
            rating_mva: branch.rating_mva.map(|r| r.value()),
        }
    }
}

impl NetworkFile {
    /// Snapshot a validated model into wire records.
    pub fn from_model(model: &NetworkModel) -> Self {
        NetworkFile {
            buses: model.buses().iter().map(BusRecord::from_bus).collect(),
            branches: model
                .branches()
                .iter()
                .map(BranchRecord::from_branch)
                .collect(),
        }
    }

    /// Convert records back into a model, re-running full validation.
    pub fn into_model(self) -> Result<NetworkModel, ImportError> {
        let buses = self
            .buses
            .into_iter()
            .map(BusRecord::into_bus)
            .collect::<Result<Vec<_>, _>>()?;
        let branches = self
            .branches
            .into_iter()
            .map(BranchRecord::into_branch)
            .collect();
        Ok(NetworkModel::new(buses, branches)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pq_record(id: usize, p: Option<f64>, q: Option<f64>) -> BusRecord {
        BusRecord {
            id,
            name: None,
            kind: "pq".into(),
            p,
            q,
            voltage_setpoint: None,
            angle: None,
            base_kv: None,
            q_min: None,
            q_max: None,
        }
    }

    #[test]
    fn pq_without_q_is_a_schema_error() {
        let err = pq_record(4, Some(10.0), None).into_bus().unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingField {
                bus: 4,
                kind: "pq",
                field: "q"
            }
        );
    }

    #[test]
    fn unknown_kind_is_a_schema_error() {
        let mut record = pq_record(2, Some(1.0), Some(0.0));
        record.kind = "generator".into();
        let err = record.into_bus().unwrap_err();
        assert!(matches!(err, SchemaError::UnknownKind { bus: 2, .. }));
    }

    #[test]
    fn one_sided_q_limits_are_rejected() {
        let record = BusRecord {
            id: 1,
            name: None,
            kind: "pv".into(),
            p: Some(40.0),
            q: None,
            voltage_setpoint: Some(1.02),
            angle: None,
            base_kv: None,
            q_min: Some(-10.0),
            q_max: None,
        };
        assert_eq!(
            record.into_bus().unwrap_err(),
            SchemaError::HalfOpenQLimits { bus: 1 }
        );
    }

    #[test]
    fn slack_defaults_to_nominal() {
        let record = BusRecord {
            id: 0,
            name: None,
            kind: "slack".into(),
            p: None,
            q: None,
            voltage_setpoint: None,
            angle: None,
            base_kv: None,
            q_min: None,
            q_max: None,
        };
        let bus = record.into_bus().unwrap();
        match bus.kind {
            BusKind::Slack { voltage, angle } => {
                assert_eq!(voltage, PerUnit(1.0));
                assert_eq!(angle, Radians(0.0));
            }
            _ => unreachable!(),
        }
        assert_eq!(bus.name, "bus-0");
    }
}
