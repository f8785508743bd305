//! Compiled IR document (`eir_version` 1).
//!
//! Only `eir_version`, the pipeline/variant identities, `graph`, `parameters`, `plan`,
//! `semantics` and `lineage` feed `eir_id`. `canonical_pipeline_spec`, `derived`, `source` and
//! `build` are informational.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{CanonicalNode, CanonicalPipelineSpec, DerivedEdge, GraphEdge, PayloadForm, Value};

pub const EIR_VERSION: u32 = 1;

/// The three layered identities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Identity {
  pub pipeline_id: String,
  pub pipeline_variant_id: String,
  pub eir_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSection {
  pub graph_version: u32,
  pub nodes: Vec<CanonicalNode>,
  pub edges: Vec<GraphEdge>,
}

/// `objects` is keyed `params:<node_uuid>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ParametersSection {
  pub objects: BTreeMap<String, BTreeMap<String, Value>>,
}

impl ParametersSection {
  pub fn key_for(node_uuid: &str) -> String {
    format!("params:{}", node_uuid)
  }

  pub fn for_node(&self, node_uuid: &str) -> Option<&BTreeMap<String, Value>> {
    self.objects.get(&Self::key_for(node_uuid))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
  ClassicLinear,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSegment {
  pub kind: SegmentKind,
  pub node_order: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
  pub plan_version: u32,
  pub segments: Vec<PlanSegment>,
}

impl Plan {
  /// Node execution order across all segments.
  pub fn node_order(&self) -> impl Iterator<Item = &str> {
    self
      .segments
      .iter()
      .flat_map(|s| s.node_order.iter().map(String::as_str))
  }
}

/// Declared I/O of one node and its payload forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeIo {
  pub processor_ref: String,
  pub input_type: Option<String>,
  pub output_type: Option<String>,
  pub input_form: PayloadForm,
  pub output_form: PayloadForm,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadForms {
  pub version: u32,
  pub root_form: PayloadForm,
  pub terminal_form: PayloadForm,
  pub node_io: BTreeMap<String, NodeIo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredIo {
  pub input_type: Option<String>,
  pub output_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotEntry {
  pub name: String,
  #[serde(rename = "type")]
  pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct InferredSlots {
  pub inputs: Vec<SlotEntry>,
  pub output: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSlots {
  pub declared_io: DeclaredIo,
  pub inferred_slots: InferredSlots,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slots {
  pub version: u32,
  pub node_slots: BTreeMap<String, NodeSlots>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Semantics {
  pub payload_forms: PayloadForms,
  pub slots: Slots,
}

/// Derived topology facts: edges, upstream map and diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DerivedSection {
  pub edges: Vec<DerivedEdge>,
  pub upstream: BTreeMap<String, Vec<String>>,
  pub diagnostics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
  /// `node_list`, `node_list_lossy`, `yaml_path` or `json_path`.
  pub kind: String,
  pub pipeline_spec_fingerprint: String,
  pub extensions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
  pub compiler_version: String,
  pub crate_version: String,
  /// RFC 3339 UTC timestamp.
  pub created_at: String,
}

/// Versioned compiled IR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EirDocument {
  pub eir_version: u32,
  pub identity: Identity,
  pub graph: GraphSection,
  pub parameters: ParametersSection,
  pub plan: Plan,
  pub semantics: Semantics,
  pub lineage: BTreeMap<String, Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub canonical_pipeline_spec: Option<CanonicalPipelineSpec>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub derived: Option<DerivedSection>,
  pub source: SourceInfo,
  pub build: BuildInfo,
}

impl EirDocument {
  /// Canonical node by uuid.
  pub fn node(&self, node_uuid: &str) -> Option<&CanonicalNode> {
    self.graph.nodes.iter().find(|n| n.node_uuid == node_uuid)
  }
}
