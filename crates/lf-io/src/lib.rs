//! # lf-io: JSON Interchange for Load-Flow Studies
//!
//! The one doorway between the solver and the outside world. External
//! callers (UIs, CLIs, batch runners) describe networks as plain JSON and
//! get results back the same way; nothing else in the workspace touches a
//! serialization format or the filesystem.
//!
//! ```
//! let json = r#"{
//!   "buses": [
//!     {"id": 0, "kind": "slack", "voltageSetpoint": 1.0},
//!     {"id": 1, "kind": "pq", "p": 50.0, "q": 20.0}
//!   ],
//!   "branches": [
//!     {"id": 0, "from": 0, "to": 1, "r": 0.01, "x": 0.05, "b": 0.0, "ratingMVA": 80.0}
//!   ]
//! }"#;
//!
//! let model = lf_io::network_from_json(json).expect("well-formed network");
//! let result = lf_algo::solve(&model, &lf_algo::SolveConfig::default());
//! assert!(result.converged);
//! ```

use anyhow::Context;
use lf_algo::LoadFlowResult;
use lf_core::NetworkModel;
use std::path::Path;

pub mod schema;

pub use schema::{BranchRecord, BusRecord, ImportError, NetworkFile, SchemaError};

/// Parse and validate a network from interchange JSON.
pub fn network_from_json(json: &str) -> Result<NetworkModel, ImportError> {
    let file: NetworkFile = serde_json::from_str(json)?;
    file.into_model()
}

/// Serialize a model to interchange JSON.
pub fn network_to_json(model: &NetworkModel) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&NetworkFile::from_model(model))
}

/// Serialize a solved case to camelCase JSON.
pub fn result_to_json(result: &LoadFlowResult) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(result)
}

/// Parse a previously exported result.
pub fn result_from_json(json: &str) -> Result<LoadFlowResult, serde_json::Error> {
    serde_json::from_str(json)
}

/// Load a network from a JSON file.
pub fn read_network(path: impl AsRef<Path>) -> anyhow::Result<NetworkModel> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading network file {}", path.display()))?;
    network_from_json(&json)
        .with_context(|| format!("importing network from {}", path.display()))
}

/// Write a solved case to a JSON file.
pub fn write_result(path: impl AsRef<Path>, result: &LoadFlowResult) -> anyhow::Result<()> {
    let path = path.as_ref();
    let json = result_to_json(result).context("serializing load-flow result")?;
    std::fs::write(path, json)
        .with_context(|| format!("writing result file {}", path.display()))
}
