//! Ordered canonical graph and the normalized bind/publish form.

use serde::{Deserialize, Serialize};

use super::CanonicalNode;

/// Chain edge between two declaration-consecutive nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
  pub source: String,
  pub target: String,
}

/// `{version, nodes, edges}`. Hashed into `pipeline_id` for specs without explicit topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalGraph {
  pub version: u32,
  pub nodes: Vec<CanonicalNode>,
  pub edges: Vec<GraphEdge>,
}

/// Normalized bind/publish form (`{version, nodes}`).
///
/// Hashed into `pipeline_id` when any node declares explicit topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalPipelineSpec {
  pub version: u32,
  pub nodes: Vec<CanonicalNode>,
}
