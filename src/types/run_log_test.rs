//! Tests for run log DTOs.

use std::collections::BTreeMap;

use super::{NodeProvenance, ProducerRef, RunLog, RunStatus};

fn step() -> NodeProvenance {
  NodeProvenance {
    step: 1,
    node_uuid: "n1".to_string(),
    processor_ref: "eir_pipeline::processors::FloatValueSource".to_string(),
    params: BTreeMap::new(),
    upstream: vec![],
    derived_upstream: vec![],
    context_writes: vec![],
    output_channel: "primary".to_string(),
    output_producer: ProducerRef::node("n1"),
  }
}

#[test]
fn new_log_is_running() {
  let log = RunLog::new("plid-x", "eirid-y", "2026-02-14T10:00:00Z");
  assert_eq!(log.status, RunStatus::Running);
  assert_eq!(log.finished_at, None);
  assert!(log.steps.is_empty());
}

#[test]
fn run_log_serializes_to_json() {
  let mut log = RunLog::new("plid-x", "eirid-y", "2026-02-14T10:00:00Z");
  log.steps.push(step());
  log.status = RunStatus::Succeeded;
  log.finished_at = Some("2026-02-14T10:01:00Z".to_string());
  let parsed = serde_json::to_value(&log).unwrap();
  assert_eq!(parsed["version"], 1);
  assert_eq!(parsed["status"], "succeeded");
  assert_eq!(parsed["steps"][0]["output_producer"]["kind"], "node");
  assert_eq!(parsed["steps"].as_array().unwrap().len(), 1);
}
