//! Tests for the float processors.

use std::collections::BTreeMap;

use super::{
  DiscardSink, FloatAddOperation, FloatCollectionSumOperation, FloatMultiplyOperation,
  FloatSumOperation, FloatValueProbe, FloatValueSource,
};
use crate::processor::Processor;
use crate::types::{RunContext, Value};

fn params(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
  pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

#[tokio::test]
async fn source_emits_value() {
  let mut ctx = RunContext::new();
  let out = FloatValueSource
    .process(Value::Null, &params(&[("value", Value::Float(1.0))]), &mut ctx)
    .await
    .unwrap();
  assert_eq!(out, Value::Float(1.0));
}

#[tokio::test]
async fn add_multiply_and_sum() {
  let mut ctx = RunContext::new();
  let add = FloatAddOperation
    .process(Value::Float(1.0), &params(&[("addend", Value::Float(2.0))]), &mut ctx)
    .await
    .unwrap();
  assert_eq!(add, Value::Float(3.0));
  let mul = FloatMultiplyOperation
    .process(Value::Int(3), &params(&[("factor", Value::Float(0.5))]), &mut ctx)
    .await
    .unwrap();
  assert_eq!(mul, Value::Float(1.5));
  let sum = FloatSumOperation
    .process(Value::Float(1.0), &params(&[("other", Value::Float(4.0))]), &mut ctx)
    .await
    .unwrap();
  assert_eq!(sum, Value::Float(5.0));
}

#[tokio::test]
async fn non_numeric_input_is_an_error() {
  let mut ctx = RunContext::new();
  let err = FloatAddOperation
    .process(Value::from("x"), &params(&[("addend", Value::Float(2.0))]), &mut ctx)
    .await
    .unwrap_err();
  assert!(err.contains("expected float data"));
  let err = FloatAddOperation
    .process(Value::Float(1.0), &params(&[("addend", Value::from("y"))]), &mut ctx)
    .await
    .unwrap_err();
  assert!(err.contains("'addend'"));
}

#[tokio::test]
async fn collection_sum_reduces_sequence() {
  let mut ctx = RunContext::new();
  let data = Value::from(vec![Value::Float(1.0), Value::Int(2), Value::Float(3.5)]);
  let out = FloatCollectionSumOperation
    .process(data, &BTreeMap::new(), &mut ctx)
    .await
    .unwrap();
  assert_eq!(out, Value::Float(6.5));
}

#[tokio::test]
async fn probe_and_sink() {
  let mut ctx = RunContext::new();
  let probed = FloatValueProbe
    .process(Value::Float(7.0), &BTreeMap::new(), &mut ctx)
    .await
    .unwrap();
  assert_eq!(probed, Value::Float(7.0));
  let sunk = DiscardSink
    .process(Value::Float(7.0), &BTreeMap::new(), &mut ctx)
    .await
    .unwrap();
  assert!(sunk.is_null());
  assert!(ctx.is_empty());
}
