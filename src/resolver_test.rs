//! Tests for parameter resolution precedence and conflict detection.

use std::collections::BTreeMap;

use crate::channel_store::{ChannelStore, ContextProducers};
use crate::error::EirError;
use crate::resolver::ResolutionScope;
use crate::types::{
  ChannelEntry, ParamSource, ProducerRef, RunContext, SourceRef, SourceRefDetail, Value,
};

struct Fixture {
  bind: BTreeMap<String, SourceRef>,
  node_params: BTreeMap<String, Value>,
  channels: ChannelStore,
  context: RunContext,
  producers: ContextProducers,
}

impl Fixture {
  fn new() -> Self {
    let mut bind = BTreeMap::new();
    bind.insert("data".to_string(), SourceRef::primary());
    Self {
      bind,
      node_params: BTreeMap::new(),
      channels: ChannelStore::seeded(Value::Float(1.0)),
      context: RunContext::new(),
      producers: ContextProducers::default(),
    }
  }

  fn with_context(mut self, key: &str, value: Value) -> Self {
    self.context.insert(key.to_string(), value);
    self.producers = ContextProducers::new(&self.context);
    self
  }

  fn scope(&self) -> ResolutionScope<'_> {
    ResolutionScope {
      bind: &self.bind,
      node_params: &self.node_params,
      channels: &self.channels,
      context: &self.context,
      producers: &self.producers,
    }
  }
}

fn resolution_message(err: EirError) -> String {
  match err {
    EirError::Resolution(msg) => msg,
    other => panic!("expected resolution error, got {:?}", other),
  }
}

#[test]
fn data_resolves_to_primary_channel() {
  let f = Fixture::new();
  let r = f.scope().resolve("data", None).unwrap();
  assert_eq!(r.value, Value::Float(1.0));
  assert_eq!(r.source, ParamSource::Channel);
  assert_eq!(
    r.source_ref,
    Some(SourceRefDetail::Channel {
      channel: "primary".to_string(),
      producer: ProducerRef::PipelineInputData,
    })
  );
}

#[test]
fn bind_wins_when_nothing_conflicts() {
  let mut f = Fixture::new();
  f.channels.set_entry("addend", ChannelEntry::new(Value::Float(2.0), ProducerRef::node("src")));
  f.bind.insert("addend".to_string(), SourceRef::channel("addend"));
  let r = f.scope().resolve("addend", Some(&Value::Float(9.0))).unwrap();
  assert_eq!(r.value, Value::Float(2.0));
  assert_eq!(r.source_ref.unwrap().producer().node_uuid(), Some("src"));
}

#[test]
fn bind_plus_node_param_is_ambiguous() {
  let mut f = Fixture::new();
  f.bind.insert("factor".to_string(), SourceRef::context("factor"));
  f.node_params.insert("factor".to_string(), Value::Int(2));
  let err = f.scope().resolve("factor", None).unwrap_err();
  assert_eq!(
    resolution_message(err),
    "Ambiguous resolution for 'factor': bind conflicts with node parameters."
  );
}

#[test]
fn bind_plus_node_param_plus_context_names_both_locations() {
  let mut f = Fixture::new().with_context("factor", Value::Int(3));
  f.bind.insert("factor".to_string(), SourceRef::context("factor"));
  f.node_params.insert("factor".to_string(), Value::Int(2));
  let err = f.scope().resolve("factor", None).unwrap_err();
  assert_eq!(
    resolution_message(err),
    "Ambiguous resolution for 'factor': bind conflicts with node parameters and context."
  );
}

#[test]
fn context_key_named_data_conflicts_with_implicit_bind() {
  let f = Fixture::new().with_context("data", Value::Int(3));
  let err = f.scope().resolve("data", None).unwrap_err();
  assert!(resolution_message(err).contains("bind conflicts with context"));
}

#[test]
fn missing_bound_channel_names_parameter_and_channel() {
  let mut f = Fixture::new();
  f.bind.insert("other".to_string(), SourceRef::channel("addend"));
  let err = f.scope().resolve("other", None).unwrap_err();
  assert_eq!(
    resolution_message(err),
    "Channel 'addend' is not available for parameter 'other'."
  );
}

#[test]
fn missing_bound_context_key_is_an_error() {
  let mut f = Fixture::new();
  f.bind.insert("factor".to_string(), SourceRef::context("scale"));
  let err = f.scope().resolve("factor", None).unwrap_err();
  assert_eq!(
    resolution_message(err),
    "Context key 'scale' is not available for parameter 'factor'."
  );
}

#[test]
fn node_param_beats_context_and_default() {
  let mut f = Fixture::new().with_context("factor", Value::Int(3));
  f.node_params.insert("factor".to_string(), Value::Int(2));
  let r = f.scope().resolve("factor", Some(&Value::Int(1))).unwrap();
  assert_eq!(r.value, Value::Int(2));
  assert_eq!(r.source, ParamSource::Node);
  assert_eq!(r.source_ref, None);
}

#[test]
fn context_beats_default_and_carries_producer() {
  let mut f = Fixture::new().with_context("factor", Value::Int(3));
  f.producers.mark_written("factor", ProducerRef::node("writer"));
  let r = f.scope().resolve("factor", Some(&Value::Int(1))).unwrap();
  assert_eq!(r.value, Value::Int(3));
  assert_eq!(r.source, ParamSource::Context);
  assert_eq!(r.source_ref.unwrap().producer().node_uuid(), Some("writer"));
}

#[test]
fn default_is_last_resort() {
  let f = Fixture::new();
  let r = f.scope().resolve("factor", Some(&Value::Float(1.0))).unwrap();
  assert_eq!(r.source, ParamSource::Default);
  let err = f.scope().resolve("factor", None).unwrap_err();
  assert_eq!(
    resolution_message(err),
    "Unable to resolve parameter 'factor' via bind/node/context/default."
  );
}
