//! Per-node resolved-parameter provenance, as handed to trace sinks and run logs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{ProducerRef, Value};

/// Which precedence level supplied a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamSource {
  /// Explicit bind to a channel.
  Channel,
  /// Explicit bind to a context key, or implicit context lookup by name.
  Context,
  /// Literal node parameter.
  Node,
  /// Processor-declared default.
  Default,
}

/// Location a bound or context-read value came from, plus its producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceRefDetail {
  Channel { channel: String, producer: ProducerRef },
  Context { key: String, producer: ProducerRef },
}

impl SourceRefDetail {
  pub fn producer(&self) -> &ProducerRef {
    match self {
      SourceRefDetail::Channel { producer, .. } | SourceRefDetail::Context { producer, .. } => {
        producer
      }
    }
  }
}

/// One resolved parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParam {
  pub value: Value,
  pub source: ParamSource,
  pub source_ref: Option<SourceRefDetail>,
}

/// Serializable record of a resolved parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamRecord {
  /// Display rendering of the value; non-finite floats become tagged strings.
  pub value: serde_json::Value,
  pub source: ParamSource,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub source_ref: Option<SourceRefDetail>,
}

/// Audit record for one executed node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeProvenance {
  /// 1-based position in the plan.
  pub step: u32,
  pub node_uuid: String,
  pub processor_ref: String,
  pub params: BTreeMap<String, ParamRecord>,
  /// Producing nodes of the values this node read, in first-seen order.
  pub upstream: Vec<String>,
  /// Nodes this node depends on per the derived edges.
  pub derived_upstream: Vec<String>,
  /// Context keys this node wrote, sorted.
  pub context_writes: Vec<String>,
  pub output_channel: String,
  pub output_producer: ProducerRef,
}
