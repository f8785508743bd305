//! Data model shared by the compiler and the runtime.

use std::collections::BTreeMap;

mod canonical_graph;
mod canonical_node;
mod channel_entry;
mod data_type;
mod derived_edge;
mod eir_document;
mod node_provenance;
mod producer_ref;
mod publish_spec;
mod run_log;
#[cfg(test)]
mod run_log_test;
mod source_ref;
#[cfg(test)]
mod source_ref_test;
mod value;
#[cfg(test)]
mod value_test;

pub use canonical_graph::{CanonicalGraph, CanonicalPipelineSpec, GraphEdge};
pub use canonical_node::CanonicalNode;
pub use channel_entry::ChannelEntry;
pub use data_type::{DataType, PayloadForm, form_of};
pub use derived_edge::DerivedEdge;
pub use eir_document::{
  BuildInfo, DeclaredIo, DerivedSection, EIR_VERSION, EirDocument, GraphSection, Identity,
  InferredSlots, NodeIo, NodeSlots, ParametersSection, PayloadForms, Plan, PlanSegment,
  SegmentKind, Semantics, SlotEntry, Slots, SourceInfo,
};
pub use node_provenance::{NodeProvenance, ParamRecord, ParamSource, ResolvedParam, SourceRefDetail};
pub use producer_ref::ProducerRef;
pub use publish_spec::PublishSpec;
pub use run_log::{RunErrorRecord, RunLog, RunStatus};
pub use source_ref::{DATA_PARAM, DEFAULT_OUTPUT_SLOT, PRIMARY_CHANNEL, SourceRef};
pub use value::{OPAQUE_KEY, OpaqueRef, Value};

/// Key-value context shared across the pipeline run.
pub type RunContext = BTreeMap<String, Value>;
