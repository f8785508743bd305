//! Tests for node and graph canonicalization.

use proptest::prelude::*;
use serde_json::json;

use crate::canonicalize::{
  build_canonical_graph, canonicalize_node, canonicalize_nodes, compute_node_uuid,
};
use crate::error::{EirError, SymbolError};
use crate::processors::builtin_fqn;
use crate::registry::Registry;
use crate::stable_json::to_stable_string;
use crate::types::{SourceRef, Value};

fn node(v: serde_json::Value) -> Value {
  Value::from(v)
}

fn config_message(err: EirError) -> String {
  match err {
    EirError::Configuration(msg) => msg,
    other => panic!("expected configuration error, got {:?}", other),
  }
}

#[test]
fn short_name_resolves_and_defaults_are_materialized() {
  let registry = Registry::builtin();
  let n = canonicalize_node(
    &node(json!({"processor": "FloatAddOperation", "parameters": {"addend": 2.0}})),
    0,
    &registry,
  )
  .unwrap();
  assert_eq!(n.role, "processor");
  assert_eq!(n.processor_ref, builtin_fqn("FloatAddOperation"));
  assert_eq!(n.parameters["addend"], Value::Float(2.0));
  assert_eq!(n.bind_for("data"), Some(&SourceRef::primary()));
  assert_eq!(n.publish.out_channel(), "primary");
  assert_eq!(n.node_uuid, compute_node_uuid(&n).unwrap());
  assert!(uuid::Uuid::parse_str(&n.node_uuid).is_ok());
}

#[test]
fn params_alias_is_accepted() {
  let registry = Registry::builtin();
  let a = canonicalize_node(
    &node(json!({"processor": "FloatAddOperation", "params": {"addend": 2.0}})),
    0,
    &registry,
  )
  .unwrap();
  let b = canonicalize_node(
    &node(json!({"processor": "FloatAddOperation", "parameters": {"addend": 2.0}})),
    0,
    &registry,
  )
  .unwrap();
  assert_eq!(a, b);
}

#[test]
fn processor_and_processor_ref_are_exclusive() {
  let registry = Registry::builtin();
  let both = node(json!({"processor": "FloatAddOperation", "processor_ref": "FloatAddOperation"}));
  assert_eq!(
    config_message(canonicalize_node(&both, 0, &registry).unwrap_err()),
    "Node config must not set both 'processor' and 'processor_ref'"
  );
  let neither = node(json!({"parameters": {}}));
  assert_eq!(
    config_message(canonicalize_node(&neither, 0, &registry).unwrap_err()),
    "Node config must set either 'processor' or 'processor_ref'"
  );
}

#[test]
fn unknown_processor_is_a_symbol_error() {
  let registry = Registry::builtin();
  let err = canonicalize_node(&node(json!({"processor": "Nope"})), 0, &registry).unwrap_err();
  assert!(matches!(err, EirError::Symbol(SymbolError::Unknown { .. })));
}

#[test]
fn non_mapping_bind_is_rejected() {
  let registry = Registry::builtin();
  let err = canonicalize_node(
    &node(json!({"processor": "FloatAddOperation", "bind": ["data"]})),
    0,
    &registry,
  )
  .unwrap_err();
  assert_eq!(config_message(err), "bind must be a mapping if provided");
}

#[test]
fn same_declaration_at_different_positions_gets_different_uuids() {
  let registry = Registry::builtin();
  let raw = node(json!({"processor": "FloatValueSource", "parameters": {"value": 1.0}}));
  let nodes = canonicalize_nodes(&[raw.clone(), raw], &registry).unwrap().nodes;
  assert_ne!(nodes[0].node_uuid, nodes[1].node_uuid);
}

#[test]
fn node_uuid_is_stable_across_calls() {
  let registry = Registry::builtin();
  let raw = node(json!({"processor": "FloatValueSource", "parameters": {"value": 1.0}}));
  let a = canonicalize_node(&raw, 3, &registry).unwrap();
  let b = canonicalize_node(&raw, 3, &registry).unwrap();
  assert_eq!(a.node_uuid, b.node_uuid);
}

#[test]
fn explicit_topology_is_detected() {
  let registry = Registry::builtin();
  let plain = [node(json!({"processor": "FloatValueSource", "parameters": {"value": 1.0}}))];
  assert!(!canonicalize_nodes(&plain, &registry).unwrap().explicit_topology);
  let published = [node(json!({
    "processor": "FloatValueSource",
    "parameters": {"value": 1.0},
    "publish": {"channels": {"out": "addend"}}
  }))];
  assert!(canonicalize_nodes(&published, &registry).unwrap().explicit_topology);
  let bound = [node(json!({
    "processor": "FloatAddOperation",
    "parameters": {"addend": 1.0},
    "bind": {"data": "channel:primary"}
  }))];
  assert!(canonicalize_nodes(&bound, &registry).unwrap().explicit_topology);
}

#[test]
fn graph_chains_nodes_in_declaration_order() {
  let registry = Registry::builtin();
  let raw = [
    node(json!({"processor": "FloatValueSource", "parameters": {"value": 1.0}})),
    node(json!({"processor": "FloatAddOperation", "parameters": {"addend": 1.0}})),
    node(json!({"processor": "FloatValueProbe"})),
  ];
  let graph = build_canonical_graph(canonicalize_nodes(&raw, &registry).unwrap().nodes);
  assert_eq!(graph.edges.len(), 2);
  assert_eq!(graph.edges[0].source, graph.nodes[0].node_uuid);
  assert_eq!(graph.edges[1].target, graph.nodes[2].node_uuid);
}

#[test]
fn inline_sweep_is_normalized() {
  let registry = Registry::builtin();
  let n = canonicalize_node(
    &node(json!({
      "processor": "FloatMultiplyOperation",
      "derive": {"parameter_sweep": {"variables": {"factor": [1.0, 2.0]}}}
    })),
    0,
    &registry,
  )
  .unwrap();
  let sweep = n.derive.as_ref().and_then(|d| d.get("parameter_sweep")).unwrap();
  assert_eq!(sweep.get("type").and_then(Value::as_str), Some("derive.parameter_sweep"));
  assert_eq!(sweep.get("version"), Some(&Value::Int(1)));
  assert_eq!(sweep.get("mode").and_then(Value::as_str), Some("product"));
  assert_eq!(
    sweep.get("element_ref").and_then(Value::as_str),
    Some(builtin_fqn("FloatMultiplyOperation").as_str())
  );
}

#[test]
fn zip_sweep_requires_equal_lengths() {
  let registry = Registry::builtin();
  let err = canonicalize_node(
    &node(json!({
      "processor": "FloatAddOperation",
      "derive": {"parameter_sweep": {"mode": "zip", "variables": {"addend": [1.0, 2.0], "x": [1]}}}
    })),
    0,
    &registry,
  )
  .unwrap_err();
  assert!(config_message(err).contains("equal-length"));
}

fn source_node_json(value: f64, addend: f64) -> (String, String) {
  let ordered = format!(
    r#"[{{"processor": "FloatValueSource", "parameters": {{"value": {value:?}}}}}, {{"processor": "FloatAddOperation", "parameters": {{"addend": {addend:?}}}, "bind": {{"data": "channel:primary"}}}}]"#
  );
  let shuffled = format!(
    "[\n  {{ \"parameters\" : {{ \"value\" : {value:?} }},\n    \"processor\":\"FloatValueSource\" }},\n  {{\"bind\":{{\"data\":\"channel:primary\"}},\"parameters\":{{\"addend\":{addend:?}}},\"processor\":\"FloatAddOperation\"}}\n]"
  );
  (ordered, shuffled)
}

proptest! {
  #[test]
  fn canonical_form_ignores_key_order_and_whitespace(value in -1.0e6f64..1.0e6, addend in -1.0e6f64..1.0e6) {
    let registry = Registry::builtin();
    let (ordered, shuffled) = source_node_json(value, addend);
    let a: Vec<Value> = serde_json::from_str(&ordered).unwrap();
    let b: Vec<Value> = serde_json::from_str(&shuffled).unwrap();
    let ca = build_canonical_graph(canonicalize_nodes(&a, &registry).unwrap().nodes);
    let cb = build_canonical_graph(canonicalize_nodes(&b, &registry).unwrap().nodes);
    prop_assert_eq!(to_stable_string(&ca).unwrap(), to_stable_string(&cb).unwrap());
  }
}

#[test]
fn parameters_take_precedence_over_params() {
  let registry = Registry::builtin();
  let both = canonicalize_node(
    &node(json!({
      "processor": "FloatAddOperation",
      "parameters": {"addend": 2.0},
      "params": {"addend": 5.0}
    })),
    0,
    &registry,
  )
  .unwrap();
  assert_eq!(both.parameters.get("addend"), Some(&Value::Float(2.0)));

  let empty_parameters = canonicalize_node(
    &node(json!({"processor": "FloatAddOperation", "parameters": {}, "params": {"addend": 5.0}})),
    0,
    &registry,
  )
  .unwrap();
  assert_eq!(empty_parameters.parameters.get("addend"), Some(&Value::Float(5.0)));
}
