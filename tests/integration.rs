//! End-to-end compile + run scenarios through the public API.

use std::io::Write;

use eir_pipeline::types::{ParamSource, ProducerRef};
use eir_pipeline::{
  CompileOptions, EirDocument, PipelineSpec, Registry, RunContext, RunOptions, Value, compile_eir,
  load_pipeline_spec, run_eir,
};
use serde_json::json;

fn compile(nodes: serde_json::Value) -> EirDocument {
  let spec = PipelineSpec::from_nodes(serde_json::from_value(nodes).expect("node list"));
  compile_eir(&spec, &Registry::builtin(), &CompileOptions::default()).expect("compile")
}

#[tokio::test]
async fn source_then_bound_add_produces_three_and_stable_ids() {
  let nodes = json!([
    {"processor": "FloatValueSource", "parameters": {"value": 1.0}, "publish": {"channels": {"out": "primary"}}},
    {"processor": "FloatAddOperation", "parameters": {"addend": 2.0}, "bind": {"data": "channel:primary"}}
  ]);
  let first = compile(nodes.clone());
  let second = compile(nodes);
  assert_eq!(first.identity.pipeline_id, second.identity.pipeline_id);
  assert_eq!(first.identity.eir_id, second.identity.eir_id);

  let out = run_eir(
    &first,
    &Registry::builtin(),
    Value::Null,
    RunContext::new(),
    &RunOptions::default(),
  )
  .await
  .expect("run");
  assert_eq!(out.data, Value::Float(3.0));
}

#[tokio::test]
async fn named_channel_keeps_first_source_as_producer() {
  let doc = compile(json!([
    {"processor": "FloatValueSource", "parameters": {"value": 2.0}, "publish": {"channels": {"out": "addend"}}},
    {"processor": "FloatSumOperation", "bind": {"other": "channel:addend", "data": "channel:primary"}},
    {"processor": "FloatValueSource", "parameters": {"value": 5.0}, "publish": {"channels": {"out": "primary"}}}
  ]));
  let first_source = doc.graph.nodes[0].node_uuid.clone();
  let second_source = doc.graph.nodes[2].node_uuid.clone();

  let out = run_eir(
    &doc,
    &Registry::builtin(),
    Value::Float(1.0),
    RunContext::new(),
    &RunOptions::default(),
  )
  .await
  .expect("run");

  let sum = &out.state.provenance[1];
  let other = &sum.params["other"];
  assert_eq!(other.source, ParamSource::Channel);
  assert_eq!(
    other.source_ref.as_ref().expect("source ref").producer(),
    &ProducerRef::node(&first_source)
  );
  assert_ne!(first_source, second_source);
  assert_eq!(sum.upstream, vec![first_source.clone()]);
  assert_eq!(out.state.channels.get("addend"), Some(&Value::Float(2.0)));
  assert_eq!(out.data, Value::Float(5.0));
  assert_eq!(
    out.state.channels.primary().expect("primary").producer,
    ProducerRef::node(&second_source)
  );
}

#[tokio::test]
async fn context_only_node_does_not_launder_provenance() {
  let doc = compile(json!([
    {"processor": "FloatValueSource", "parameters": {"value": 7.0}},
    {"processor": "SetContext", "parameters": {"key": "stage", "value": "done"}},
    {"processor": "FloatValueProbe", "context_key": "seen"}
  ]));
  let out = run_eir(
    &doc,
    &Registry::builtin(),
    Value::Null,
    RunContext::new(),
    &RunOptions::default(),
  )
  .await
  .expect("run");
  let source = ProducerRef::node(&doc.graph.nodes[0].node_uuid);
  assert_eq!(out.state.channels.primary().expect("primary").producer, source);
  for record in &out.state.provenance[1..] {
    assert_eq!(record.output_producer, source);
    assert_eq!(record.params["data"].source_ref.as_ref().expect("ref").producer(), &source);
  }
  assert_eq!(out.state.context["seen"], Value::Float(7.0));
}

#[tokio::test]
async fn yaml_and_json_specs_compile_to_the_same_identity() {
  let dir = tempfile::tempdir().expect("tempdir");
  let yaml_path = dir.path().join("pipeline.yaml");
  let json_path = dir.path().join("pipeline.json");
  let mut yaml = std::fs::File::create(&yaml_path).expect("create yaml");
  writeln!(
    yaml,
    "pipeline:\n  nodes:\n    - processor: FloatValueSource\n      parameters:\n        value: 1.0\n    - processor: FloatAddOperation\n      parameters: {{addend: 2.0}}"
  )
  .expect("write yaml");
  std::fs::write(
    &json_path,
    r#"{"nodes": [{"parameters": {"value": 1.0}, "processor": "FloatValueSource"}, {"processor": "FloatAddOperation", "parameters": {"addend": 2.0}}]}"#,
  )
  .expect("write json");

  let registry = Registry::builtin();
  let from_yaml = compile_eir(
    &load_pipeline_spec(&yaml_path).expect("load yaml"),
    &registry,
    &CompileOptions::default(),
  )
  .expect("compile yaml");
  let from_json = compile_eir(
    &load_pipeline_spec(&json_path).expect("load json"),
    &registry,
    &CompileOptions::default(),
  )
  .expect("compile json");
  assert_eq!(from_yaml.identity, from_json.identity);
  assert_eq!(from_yaml.source.kind, "yaml_path");
  assert_eq!(from_json.source.kind, "json_path");
  assert_ne!(
    from_yaml.source.pipeline_spec_fingerprint,
    from_json.source.pipeline_spec_fingerprint
  );
}

#[tokio::test]
async fn document_survives_a_json_roundtrip_and_still_runs() {
  let doc = compile(json!([
    {"processor": "FloatValueSource", "parameters": {"value": 1.0}},
    {"processor": "FloatMultiplyOperation", "parameters": {"factor": 4.0}}
  ]));
  let text = serde_json::to_string(&doc).expect("encode");
  let back: EirDocument = serde_json::from_str(&text).expect("decode");
  assert_eq!(back, doc);
  let out = run_eir(
    &back,
    &Registry::builtin(),
    Value::Null,
    RunContext::new(),
    &RunOptions::default(),
  )
  .await
  .expect("run");
  assert_eq!(out.data, Value::Float(4.0));
}
