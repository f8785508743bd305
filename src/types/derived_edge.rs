//! Dependency edge inferred from bind/publish topology.

use serde::{Deserialize, Serialize};

use super::SourceRef;

/// Informational edge; never part of any identity hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedEdge {
  pub source_node_uuid: String,
  pub target_node_uuid: String,
  pub target_param: String,
  pub source_ref: SourceRef,
  /// Set only when the producer published through a slot other than `out`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub source_output_slot: Option<String>,
}
