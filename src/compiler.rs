//! Compiles a pipeline spec into an [EirDocument].
//!
//! - canonicalize nodes and fold them into the canonical graph
//! - derive topology edges (fatal on topology errors)
//! - choose `pipeline_id`: canonical graph, or the normalized bind/publish form when any node
//!   declares explicit topology
//! - classify per-node payload forms and slots from declared processor metadata
//! - compute `pipeline_variant_id` and `eir_id`
//!
//! Compilation is pure apart from the build timestamp, which never enters an identity.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{info, instrument};

use crate::canonicalize::{build_canonical_graph, build_canonical_pipeline_spec, canonicalize_nodes};
use crate::derived_edges::{compute_upstream_map, derive_edges};
use crate::error::Result;
use crate::identity::{
  SemanticModule, eir_id, pipeline_id_for_graph, pipeline_id_for_spec, pipeline_variant_id,
};
use crate::registry::Registry;
use crate::spec_loader::{PipelineSpec, fingerprint_source};
use crate::types::{
  BuildInfo, CanonicalNode, DeclaredIo, DerivedSection, EIR_VERSION, EirDocument, GraphSection,
  Identity, NodeIo, NodeSlots, ParametersSection, PayloadForm, PayloadForms, Plan, PlanSegment,
  SegmentKind, Semantics, Slots, SourceInfo, form_of,
};

/// Default `build.compiler_version`.
pub const COMPILER_VERSION: &str = "eir-compiler-1";

/// Compiler options. None of them affect any identity.
#[derive(Debug, Clone)]
pub struct CompileOptions {
  pub compiler_version: String,
  /// Embed `canonical_pipeline_spec` and the `derived` section.
  pub embed_canonical_spec: bool,
  /// Build timestamp; `None` means now.
  pub created_at: Option<DateTime<Utc>>,
}

impl Default for CompileOptions {
  fn default() -> Self {
    Self {
      compiler_version: COMPILER_VERSION.to_string(),
      embed_canonical_spec: true,
      created_at: None,
    }
  }
}

/// Compiles `spec` against `registry`.
#[instrument(level = "trace", skip(spec, registry, options))]
pub fn compile_eir(
  spec: &PipelineSpec,
  registry: &Registry,
  options: &CompileOptions,
) -> Result<EirDocument> {
  info!(node_count = spec.nodes.len(), "compiling pipeline spec");

  let canonical = canonicalize_nodes(&spec.nodes, registry)?;
  let edges = derive_edges(&canonical.nodes)?;
  let upstream = compute_upstream_map(&canonical.nodes, &edges);
  let graph = build_canonical_graph(canonical.nodes.clone());
  let cpsv1 = build_canonical_pipeline_spec(canonical.nodes);

  let pipeline_id = if canonical.explicit_topology {
    pipeline_id_for_spec(&cpsv1)?
  } else {
    pipeline_id_for_graph(&graph)?
  };

  let mut node_io = BTreeMap::new();
  let mut node_slots = BTreeMap::new();
  let mut objects = BTreeMap::new();
  let mut node_order = Vec::with_capacity(graph.nodes.len());
  for node in &graph.nodes {
    let (io, slots) = node_semantics(node, registry)?;
    node_io.insert(node.node_uuid.clone(), io);
    node_slots.insert(node.node_uuid.clone(), slots);
    objects.insert(
      ParametersSection::key_for(&node.node_uuid),
      node.parameters.clone(),
    );
    node_order.push(node.node_uuid.clone());
  }

  let (root_form, terminal_form) = boundary_forms(&node_order, &node_io);
  let modules = semantic_modules(&graph.nodes, &node_io, &node_slots, canonical.explicit_topology);

  let semantics = Semantics {
    payload_forms: PayloadForms {
      version: 1,
      root_form,
      terminal_form,
      node_io,
    },
    slots: Slots {
      version: 1,
      node_slots,
    },
  };

  let (source_kind, fingerprint) = fingerprint_source(spec);
  let created_at = options
    .created_at
    .unwrap_or_else(Utc::now)
    .to_rfc3339_opts(SecondsFormat::Secs, true);

  let mut doc = EirDocument {
    eir_version: EIR_VERSION,
    identity: Identity {
      pipeline_variant_id: pipeline_variant_id(EIR_VERSION, &pipeline_id, &modules)?,
      pipeline_id,
      eir_id: String::new(),
    },
    graph: GraphSection {
      graph_version: graph.version,
      nodes: graph.nodes,
      edges: graph.edges,
    },
    parameters: ParametersSection { objects },
    plan: Plan {
      plan_version: 1,
      segments: vec![PlanSegment {
        kind: SegmentKind::ClassicLinear,
        node_order,
      }],
    },
    semantics,
    lineage: BTreeMap::new(),
    canonical_pipeline_spec: None,
    derived: None,
    source: SourceInfo {
      kind: source_kind,
      pipeline_spec_fingerprint: fingerprint,
      extensions: spec.extensions.clone(),
    },
    build: BuildInfo {
      compiler_version: options.compiler_version.clone(),
      crate_version: env!("CARGO_PKG_VERSION").to_string(),
      created_at,
    },
  };
  if options.embed_canonical_spec {
    doc.canonical_pipeline_spec = Some(cpsv1);
    doc.derived = Some(DerivedSection {
      edges,
      upstream,
      diagnostics: Vec::new(),
    });
  }
  doc.identity.eir_id = eir_id(&doc)?;

  info!(
    pipeline_id = %doc.identity.pipeline_id,
    eir_id = %doc.identity.eir_id,
    node_count = doc.graph.nodes.len(),
    "compiled pipeline"
  );
  Ok(doc)
}

/// Declared I/O and slots of one node, from its (element) processor's metadata.
fn node_semantics(node: &CanonicalNode, registry: &Registry) -> Result<(NodeIo, NodeSlots)> {
  let spec = registry.spec(&node.processor_ref)?;
  let (input, output) = spec.declared_io();
  let input_type = input.map(|t| t.name.to_string());
  let output_type = output.map(|t| t.name.to_string());
  let io = NodeIo {
    processor_ref: node.processor_ref.clone(),
    input_type: input_type.clone(),
    output_type: output_type.clone(),
    input_form: form_of(input),
    output_form: form_of(output),
  };
  let slots = NodeSlots {
    declared_io: DeclaredIo {
      input_type,
      output_type,
    },
    inferred_slots: spec.inferred_slots(),
  };
  Ok((io, slots))
}

/// Root form: the first node's input form when it declares an input type, else its output
/// form. Terminal form: the last node's output form.
fn boundary_forms(
  node_order: &[String],
  node_io: &BTreeMap<String, NodeIo>,
) -> (PayloadForm, PayloadForm) {
  let first = node_order.first().and_then(|id| node_io.get(id));
  let last = node_order.last().and_then(|id| node_io.get(id));
  let root = first
    .map(|io| {
      if io.input_type.is_some() {
        io.input_form
      } else {
        io.output_form
      }
    })
    .unwrap_or_default();
  let terminal = last.map(|io| io.output_form).unwrap_or_default();
  (root, terminal)
}

/// Closed set of semantic modules this compilation exercises.
fn semantic_modules(
  nodes: &[CanonicalNode],
  node_io: &BTreeMap<String, NodeIo>,
  node_slots: &BTreeMap<String, NodeSlots>,
  explicit_topology: bool,
) -> BTreeSet<SemanticModule> {
  let mut modules = BTreeSet::from([SemanticModule::PayloadForms]);
  let forms = node_io.values().flat_map(|io| [io.input_form, io.output_form]);
  for form in forms {
    match form {
      PayloadForm::Channel => {
        modules.insert(SemanticModule::ChannelForm);
      }
      PayloadForm::LaneBundle => {
        modules.insert(SemanticModule::LaneBundleForm);
      }
      PayloadForm::Scalar => {}
    }
  }
  if node_slots
    .values()
    .any(|s| !s.inferred_slots.inputs.is_empty() || s.inferred_slots.output.is_some())
  {
    modules.insert(SemanticModule::SlotInference);
  }
  if explicit_topology {
    modules.insert(SemanticModule::PayloadAlgebra);
  }
  if nodes.iter().any(|n| n.derive.is_some()) {
    modules.insert(SemanticModule::Derive);
  }
  modules
}
