//! Deterministic identities: `node_uuid`, `pipeline_id`, `pipeline_variant_id` and `eir_id`.
//!
//! Every identity is computed over stable JSON. `eir_id` deliberately ignores `source`,
//! `build`, `canonical_pipeline_spec` and `derived`.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::error::Result;
use crate::stable_json::{stable_digest, to_stable_string};
use crate::types::{
  CanonicalGraph, CanonicalPipelineSpec, EirDocument, GraphSection, ParametersSection, Plan,
  Semantics, Value,
};

/// Namespace salt for `node_uuid`. Changing it is a breaking identity migration.
pub const NODE_NAMESPACE: Uuid = Uuid::nil();

pub const PIPELINE_ID_PREFIX: &str = "plid-";
pub const VARIANT_ID_PREFIX: &str = "pvid-";
pub const EIR_ID_PREFIX: &str = "eirid-";

/// UUIDv5 of the stable JSON of `basis` under [NODE_NAMESPACE].
pub fn node_uuid<T: Serialize + ?Sized>(basis: &T) -> Result<String> {
  let text = to_stable_string(basis)?;
  Ok(Uuid::new_v5(&NODE_NAMESPACE, text.as_bytes()).to_string())
}

/// `pipeline_id` of a spec without explicit topology.
#[instrument(level = "trace", skip(graph))]
pub fn pipeline_id_for_graph(graph: &CanonicalGraph) -> Result<String> {
  Ok(format!("{}{}", PIPELINE_ID_PREFIX, stable_digest(graph)?))
}

/// `pipeline_id` of a spec declaring bind/publish topology.
#[instrument(level = "trace", skip(spec))]
pub fn pipeline_id_for_spec(spec: &CanonicalPipelineSpec) -> Result<String> {
  Ok(format!("{}{}", PIPELINE_ID_PREFIX, stable_digest(spec)?))
}

/// Optional IR feature whose use is folded into `pipeline_variant_id`.
///
/// The list is closed; each variant names the condition that enables it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SemanticModule {
  /// `semantics.payload_forms` is emitted. Always on.
  PayloadForms,
  /// Some node consumes or produces a channel-form payload.
  ChannelForm,
  /// Some node consumes or produces a lane-bundle payload.
  LaneBundleForm,
  /// Some node has declared data slots.
  SlotInference,
  /// The spec declares explicit bind/publish topology.
  PayloadAlgebra,
  /// Some node is a derived processor.
  Derive,
}

impl SemanticModule {
  pub fn name(&self) -> &'static str {
    match self {
      SemanticModule::PayloadForms => "payload_forms",
      SemanticModule::ChannelForm => "payload_forms.channel",
      SemanticModule::LaneBundleForm => "payload_forms.lane_bundle",
      SemanticModule::SlotInference => "slots",
      SemanticModule::PayloadAlgebra => "payload_algebra",
      SemanticModule::Derive => "derive",
    }
  }
}

impl fmt::Display for SemanticModule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

#[derive(Serialize)]
struct VariantBasis<'a> {
  eir_version: u32,
  pipeline_id: &'a str,
  semantic_modules: Vec<&'static str>,
}

/// `pipeline_variant_id` over the version, the pipeline id and the sorted module names.
#[instrument(level = "trace")]
pub fn pipeline_variant_id(
  eir_version: u32,
  pipeline_id: &str,
  modules: &BTreeSet<SemanticModule>,
) -> Result<String> {
  let mut semantic_modules: Vec<&'static str> = modules.iter().map(SemanticModule::name).collect();
  semantic_modules.sort_unstable();
  let basis = VariantBasis {
    eir_version,
    pipeline_id,
    semantic_modules,
  };
  Ok(format!("{}{}", VARIANT_ID_PREFIX, stable_digest(&basis)?))
}

#[derive(Serialize)]
struct IdentitySubset<'a> {
  pipeline_id: &'a str,
  pipeline_variant_id: &'a str,
}

#[derive(Serialize)]
struct EirIdBasis<'a> {
  eir_version: u32,
  identity: IdentitySubset<'a>,
  graph: &'a GraphSection,
  parameters: &'a ParametersSection,
  plan: &'a Plan,
  semantics: &'a Semantics,
  lineage: &'a BTreeMap<String, Value>,
}

/// `eir_id` of a document. The document's current `eir_id` does not participate.
#[instrument(level = "trace", skip(doc))]
pub fn eir_id(doc: &EirDocument) -> Result<String> {
  let basis = EirIdBasis {
    eir_version: doc.eir_version,
    identity: IdentitySubset {
      pipeline_id: &doc.identity.pipeline_id,
      pipeline_variant_id: &doc.identity.pipeline_variant_id,
    },
    graph: &doc.graph,
    parameters: &doc.parameters,
    plan: &doc.plan,
    semantics: &doc.semantics,
    lineage: &doc.lineage,
  };
  Ok(format!("{}{}", EIR_ID_PREFIX, stable_digest(&basis)?))
}
