//! Interchange round-trip and end-to-end import/solve/export tests.

use lf_algo::{solve, SolveConfig};
use lf_core::units::{Megavars, MegavoltAmperes, Megawatts, PerUnit, Radians};
use lf_core::{Branch, BranchId, Bus, BusId, NetworkModel};
use lf_io::{network_from_json, network_to_json, result_from_json, result_to_json};

fn sample_model() -> NetworkModel {
    let buses = vec![
        Bus::slack(BusId::new(0), "grid", PerUnit(1.01), Radians(0.0)),
        Bus::pv(BusId::new(1), "plant", PerUnit(1.02), Megawatts(40.0))
            .with_q_limits(Megavars(-30.0), Megavars(60.0)),
        Bus::pq(BusId::new(2), "town", Megawatts(55.0), Megavars(18.0)),
    ];
    let branches = vec![
        Branch::new(BranchId::new(0), "a", BusId::new(0), BusId::new(1), 0.01, 0.04)
            .with_charging(PerUnit(0.02))
            .with_rating(MegavoltAmperes(90.0)),
        Branch::new(BranchId::new(1), "b", BusId::new(1), BusId::new(2), 0.02, 0.06),
    ];
    NetworkModel::new(buses, branches).unwrap()
}

#[test]
fn network_round_trips_exactly() {
    let original = sample_model();
    let json = network_to_json(&original).unwrap();
    let back = network_from_json(&json).unwrap();
    assert_eq!(back, original);
}

#[test]
fn network_json_uses_the_wire_vocabulary() {
    let json = network_to_json(&sample_model()).unwrap();
    assert!(json.contains("\"kind\": \"slack\""));
    assert!(json.contains("\"kind\": \"pv\""));
    assert!(json.contains("\"kind\": \"pq\""));
    assert!(json.contains("\"ratingMVA\""));
    assert!(json.contains("\"voltageSetpoint\""));
    assert!(json.contains("\"qMax\""));
}

#[test]
fn solve_straight_from_wire_json() {
    let json = r#"{
      "buses": [
        {"id": 0, "kind": "slack", "voltageSetpoint": 1.0},
        {"id": 1, "kind": "pq", "p": 50.0, "q": 20.0}
      ],
      "branches": [
        {"id": 0, "from": 0, "to": 1, "r": 0.01, "x": 0.05, "b": 0.0, "ratingMVA": 80.0}
      ]
    }"#;

    let model = network_from_json(json).unwrap();
    let result = solve(&model, &SolveConfig::default());

    assert!(result.converged);
    assert!(result.iterations <= 10);
    let feeder = result.bus(BusId::new(1)).unwrap();
    assert!((feeder.voltage_pu - 0.9845).abs() < 0.01);
}

#[test]
fn result_export_round_trips() {
    let result = solve(&sample_model(), &SolveConfig::default());
    let json = result_to_json(&result).unwrap();
    let back = result_from_json(&json).unwrap();
    assert_eq!(back, result);

    assert!(json.contains("\"converged\": true"));
    assert!(json.contains("\"maxMismatch\""));
    assert!(json.contains("\"lossesMw\""));
}

#[test]
fn file_helpers_round_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let network_path = dir.path().join("network.json");
    let result_path = dir.path().join("result.json");

    let model = sample_model();
    std::fs::write(&network_path, network_to_json(&model).unwrap()).unwrap();

    let loaded = lf_io::read_network(&network_path).unwrap();
    assert_eq!(loaded, model);

    let result = solve(&loaded, &SolveConfig::default());
    lf_io::write_result(&result_path, &result).unwrap();
    let exported = std::fs::read_to_string(&result_path).unwrap();
    assert_eq!(result_from_json(&exported).unwrap(), result);
}

#[test]
fn missing_file_error_names_the_path() {
    let err = lf_io::read_network("/no/such/network.json").unwrap_err();
    assert!(format!("{err:#}").contains("/no/such/network.json"));
}
