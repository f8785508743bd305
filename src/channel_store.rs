//! Per-run channel store and context-key producer tracking.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::{ChannelEntry, PRIMARY_CHANNEL, ProducerRef, RunContext, Value};

/// Named channels of one run. `primary` is seeded with the run's input data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelStore {
  entries: BTreeMap<String, ChannelEntry>,
}

impl ChannelStore {
  /// Store holding only `primary = (data, PipelineInputData)`.
  pub fn seeded(data: Value) -> Self {
    let mut entries = BTreeMap::new();
    entries.insert(
      PRIMARY_CHANNEL.to_string(),
      ChannelEntry::new(data, ProducerRef::PipelineInputData),
    );
    Self { entries }
  }

  pub fn entry(&self, channel: &str) -> Option<&ChannelEntry> {
    self.entries.get(channel)
  }

  pub fn get(&self, channel: &str) -> Option<&Value> {
    self.entries.get(channel).map(|e| &e.value)
  }

  pub fn contains(&self, channel: &str) -> bool {
    self.entries.contains_key(channel)
  }

  /// Replaces the channel's entry (last writer wins).
  pub fn set_entry(&mut self, channel: impl Into<String>, entry: ChannelEntry) {
    self.entries.insert(channel.into(), entry);
  }

  pub fn primary(&self) -> Option<&ChannelEntry> {
    self.entry(PRIMARY_CHANNEL)
  }

  pub fn channels(&self) -> impl Iterator<Item = (&str, &ChannelEntry)> {
    self.entries.iter().map(|(k, v)| (k.as_str(), v))
  }
}

/// Producer of every context key currently present.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ContextProducers {
  producers: BTreeMap<String, ProducerRef>,
}

impl ContextProducers {
  /// Every initial key is attributed to the pipeline input.
  pub fn new(initial: &RunContext) -> Self {
    let producers = initial
      .keys()
      .map(|k| (k.clone(), ProducerRef::PipelineInputContext))
      .collect();
    Self { producers }
  }

  pub fn producer_of(&self, key: &str) -> Option<&ProducerRef> {
    self.producers.get(key)
  }

  pub fn mark_written(&mut self, key: impl Into<String>, producer: ProducerRef) {
    self.producers.insert(key.into(), producer);
  }

  pub fn forget(&mut self, key: &str) {
    self.producers.remove(key);
  }
}

/// Context writes made between two snapshots: new keys plus keys whose value changed.
///
/// Returned sorted. Removed keys are not writes; see [removed_context_keys].
pub fn detect_context_writes(before: &RunContext, after: &RunContext) -> Vec<String> {
  after
    .iter()
    .filter(|(key, value)| before.get(key.as_str()) != Some(*value))
    .map(|(key, _)| key.clone())
    .collect()
}

/// Keys present in `before` but gone from `after`, sorted.
pub fn removed_context_keys(before: &RunContext, after: &RunContext) -> Vec<String> {
  before
    .keys()
    .filter(|key| !after.contains_key(key.as_str()))
    .cloned()
    .collect()
}
