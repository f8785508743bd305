//! Tests for the channel store and context producer tracking.

use std::collections::BTreeMap;

use crate::channel_store::{
  ChannelStore, ContextProducers, detect_context_writes, removed_context_keys,
};
use crate::types::{ChannelEntry, ProducerRef, RunContext, Value};

#[test]
fn seeded_store_holds_primary_from_pipeline_input() {
  let store = ChannelStore::seeded(Value::Float(1.5));
  let primary = store.primary().unwrap();
  assert_eq!(primary.value, Value::Float(1.5));
  assert_eq!(primary.producer, ProducerRef::PipelineInputData);
  assert!(store.contains("primary"));
  assert!(!store.contains("addend"));
}

#[test]
fn set_entry_replaces_last_writer() {
  let mut store = ChannelStore::seeded(Value::Null);
  store.set_entry("addend", ChannelEntry::new(Value::Int(1), ProducerRef::node("a")));
  store.set_entry("addend", ChannelEntry::new(Value::Int(2), ProducerRef::node("b")));
  let entry = store.entry("addend").unwrap();
  assert_eq!(entry.value, Value::Int(2));
  assert_eq!(entry.producer.node_uuid(), Some("b"));
  assert_eq!(store.get("addend"), Some(&Value::Int(2)));
  assert_eq!(store.channels().count(), 2);
}

#[test]
fn initial_context_keys_are_pipeline_input() {
  let mut ctx = RunContext::new();
  ctx.insert("seed".to_string(), Value::Int(7));
  let mut producers = ContextProducers::new(&ctx);
  assert_eq!(
    producers.producer_of("seed"),
    Some(&ProducerRef::PipelineInputContext)
  );
  producers.mark_written("seed", ProducerRef::node("n1"));
  assert_eq!(producers.producer_of("seed").and_then(ProducerRef::node_uuid), Some("n1"));
  producers.forget("seed");
  assert_eq!(producers.producer_of("seed"), None);
}

#[test]
fn context_writes_cover_new_and_changed_keys() {
  let before: RunContext = BTreeMap::from([
    ("same".to_string(), Value::Int(1)),
    ("changed".to_string(), Value::Int(1)),
    ("gone".to_string(), Value::Int(1)),
  ]);
  let after: RunContext = BTreeMap::from([
    ("same".to_string(), Value::Int(1)),
    ("changed".to_string(), Value::Float(1.0)),
    ("added".to_string(), Value::from("x")),
  ]);
  assert_eq!(detect_context_writes(&before, &after), vec!["added", "changed"]);
  assert_eq!(removed_context_keys(&before, &after), vec!["gone"]);
}

#[test]
fn unchanged_context_has_no_writes() {
  let ctx: RunContext = BTreeMap::from([("k".to_string(), Value::from("v"))]);
  assert!(detect_context_writes(&ctx, &ctx.clone()).is_empty());
}
