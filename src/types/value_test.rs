//! Tests for `Value`.

use std::collections::BTreeMap;

use serde_json::json;

use super::Value;

#[test]
fn from_json_maps_every_kind() {
  let v = Value::from(json!({
    "n": null,
    "b": true,
    "i": 3,
    "f": 1.5,
    "s": "x",
    "l": [1, "two"],
    "m": {"k": 2}
  }));
  let m = v.as_map().unwrap();
  assert!(m["n"].is_null());
  assert_eq!(m["b"], Value::Bool(true));
  assert_eq!(m["i"], Value::Int(3));
  assert_eq!(m["f"], Value::Float(1.5));
  assert_eq!(m["s"].as_str(), Some("x"));
  assert_eq!(m["l"].as_seq().unwrap().len(), 2);
  assert_eq!(m["m"].get("k"), Some(&Value::Int(2)));
}

#[test]
fn opaque_roundtrips_through_json() {
  let v = Value::opaque("ImageHandle", "img://42");
  let text = serde_json::to_string(&v).unwrap();
  assert_eq!(text, r#"{"$opaque":{"ref":"img://42","type":"ImageHandle"}}"#);
  let back: Value = serde_json::from_str(&text).unwrap();
  assert_eq!(back, v);
}

#[test]
fn serialize_rejects_non_finite_floats() {
  assert!(serde_json::to_string(&Value::Float(f64::NAN)).is_err());
  assert!(serde_json::to_string(&Value::Float(f64::INFINITY)).is_err());
  let nested = Value::Seq(vec![Value::Int(1), Value::Float(f64::NEG_INFINITY)]);
  assert!(serde_json::to_string(&nested).is_err());
  assert!(!nested.is_finite());
}

#[test]
fn map_equality_ignores_insertion_order() {
  let mut a = BTreeMap::new();
  a.insert("z".to_string(), Value::Int(1));
  a.insert("a".to_string(), Value::Int(2));
  let b = Value::from(json!({"a": 2, "z": 1}));
  assert_eq!(Value::Map(a), b);
}

#[test]
fn numeric_views() {
  assert_eq!(Value::Int(2).as_f64(), Some(2.0));
  assert_eq!(Value::Float(2.5).as_f64(), Some(2.5));
  assert_eq!(Value::Float(2.5).as_i64(), None);
  assert_eq!(Value::from("x").type_name(), "string");
}
