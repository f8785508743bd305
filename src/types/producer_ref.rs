//! Origin of a channel entry or context value.

use serde::{Deserialize, Serialize};

use super::DEFAULT_OUTPUT_SLOT;

/// Who produced a value: the pipeline input, or a node's output slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProducerRef {
  /// Initial context keys supplied with the run.
  PipelineInputContext,
  /// Initial data seeded into the primary channel.
  PipelineInputData,
  Node {
    node_uuid: String,
    output_slot: String,
  },
}

impl ProducerRef {
  /// Producer for a node writing through the default `out` slot.
  pub fn node(node_uuid: impl Into<String>) -> Self {
    ProducerRef::Node {
      node_uuid: node_uuid.into(),
      output_slot: DEFAULT_OUTPUT_SLOT.to_string(),
    }
  }

  pub fn node_uuid(&self) -> Option<&str> {
    match self {
      ProducerRef::Node { node_uuid, .. } => Some(node_uuid),
      _ => None,
    }
  }
}
