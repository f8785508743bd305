//! Node and graph canonicalization.
//!
//! One raw node declaration becomes a [CanonicalNode] with a position-sensitive `node_uuid`;
//! the ordered list folds into a [CanonicalGraph] (chain edges) and the normalized
//! [CanonicalPipelineSpec].

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::bind_publish::{RawNode, declares_explicit_topology, normalize_bind, normalize_publish, present};
use crate::error::{EirError, Result};
use crate::identity;
use crate::registry::Registry;
use crate::types::{
  CanonicalGraph, CanonicalNode, CanonicalPipelineSpec, GraphEdge, PublishSpec, SourceRef, Value,
};

pub const GRAPH_VERSION: u32 = 1;
pub const CANONICAL_SPEC_VERSION: u32 = 1;
pub const DERIVE_VERSION: i64 = 1;

const DEFAULT_ROLE: &str = "processor";
const SWEEP: &str = "parameter_sweep";
const SLICE: &str = "slice";

/// Canonicalized node list plus whether any node declared explicit topology.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalNodes {
  pub nodes: Vec<CanonicalNode>,
  pub explicit_topology: bool,
}

/// Every canonical field except `node_uuid`.
#[derive(Serialize)]
struct NodeBasis<'a> {
  role: &'a str,
  processor_ref: &'a str,
  parameters: &'a BTreeMap<String, Value>,
  ports: &'a BTreeMap<String, Value>,
  derive: &'a Option<Value>,
  bind: &'a BTreeMap<String, SourceRef>,
  publish: &'a PublishSpec,
  declaration_index: u64,
  declaration_subindex: u64,
}

impl<'a> From<&'a CanonicalNode> for NodeBasis<'a> {
  fn from(n: &'a CanonicalNode) -> Self {
    Self {
      role: &n.role,
      processor_ref: &n.processor_ref,
      parameters: &n.parameters,
      ports: &n.ports,
      derive: &n.derive,
      bind: &n.bind,
      publish: &n.publish,
      declaration_index: n.declaration_index,
      declaration_subindex: n.declaration_subindex,
    }
  }
}

/// Recomputes the `node_uuid` a canonical node should carry.
pub fn compute_node_uuid(node: &CanonicalNode) -> Result<String> {
  identity::node_uuid(&NodeBasis::from(node))
}

/// Canonicalizes one raw node declared at `declaration_index`.
#[instrument(level = "trace", skip(raw, registry))]
pub fn canonicalize_node(
  raw: &Value,
  declaration_index: u64,
  registry: &Registry,
) -> Result<CanonicalNode> {
  let Value::Map(node) = raw else {
    return Err(EirError::config("each node must be a mapping"));
  };

  let role = match present(node, "role") {
    None => DEFAULT_ROLE.to_string(),
    Some(Value::Str(s)) if !s.is_empty() => s.clone(),
    Some(_) => return Err(EirError::config("role must be a non-empty string")),
  };

  let spec = registry.resolve(processor_symbol(node)?)?;
  let mut processor_ref = spec.fqn.clone();
  let mut derive = present(node, "derive").cloned();
  if let Some(preprocessor) = &spec.derived {
    let (kind, element_ref) = registered_derive(preprocessor, &spec.fqn)?;
    processor_ref = registry.resolve(&element_ref)?.fqn.clone();
    if derive.is_none() {
      let mut wrapper = BTreeMap::new();
      wrapper.insert(kind.to_string(), preprocessor.clone());
      derive = Some(Value::Map(wrapper));
    }
  }
  let derive = match derive {
    None => None,
    Some(d) => {
      let (normalized, element_ref) = normalize_derive(&d, &processor_ref, registry)?;
      processor_ref = element_ref;
      Some(normalized)
    }
  };

  let parameters = mapping_field(node, &["parameters", "params"], "parameters/params")?;
  let ports = mapping_field(node, &["ports"], "ports")?;
  let declaration_subindex = match present(node, "declaration_subindex") {
    None => 0,
    Some(Value::Int(i)) if *i >= 0 => *i as u64,
    Some(_) => {
      return Err(EirError::config(
        "declaration_subindex must be a non-negative integer",
      ));
    }
  };

  let bind = normalize_bind(present(node, "bind"))?;
  let publish = normalize_publish(node)?;

  let mut canonical = CanonicalNode {
    role,
    processor_ref,
    parameters,
    ports,
    derive,
    bind,
    publish,
    declaration_index,
    declaration_subindex,
    node_uuid: String::new(),
  };
  canonical.node_uuid = compute_node_uuid(&canonical)?;
  debug!(node_uuid = %canonical.node_uuid, processor_ref = %canonical.processor_ref, "canonicalized node");
  Ok(canonical)
}

/// Canonicalizes every node in declaration order.
#[instrument(level = "trace", skip(raw_nodes, registry))]
pub fn canonicalize_nodes(raw_nodes: &[Value], registry: &Registry) -> Result<CanonicalNodes> {
  let mut nodes = Vec::with_capacity(raw_nodes.len());
  let mut explicit_topology = false;
  for (index, raw) in raw_nodes.iter().enumerate() {
    let node = canonicalize_node(raw, index as u64, registry)?;
    if let Value::Map(m) = raw {
      explicit_topology |= declares_explicit_topology(m, &node.publish);
    }
    nodes.push(node);
  }
  Ok(CanonicalNodes {
    nodes,
    explicit_topology,
  })
}

/// Folds ordered canonical nodes into a graph with chain edges.
pub fn build_canonical_graph(nodes: Vec<CanonicalNode>) -> CanonicalGraph {
  let edges = nodes
    .windows(2)
    .map(|pair| GraphEdge {
      source: pair[0].node_uuid.clone(),
      target: pair[1].node_uuid.clone(),
    })
    .collect();
  CanonicalGraph {
    version: GRAPH_VERSION,
    nodes,
    edges,
  }
}

pub fn build_canonical_pipeline_spec(nodes: Vec<CanonicalNode>) -> CanonicalPipelineSpec {
  CanonicalPipelineSpec {
    version: CANONICAL_SPEC_VERSION,
    nodes,
  }
}

/// The processor symbol: exactly one of `processor` / `processor_ref`.
fn processor_symbol(node: &RawNode) -> Result<&str> {
  match (present(node, "processor"), present(node, "processor_ref")) {
    (Some(_), Some(_)) => Err(EirError::config(
      "Node config must not set both 'processor' and 'processor_ref'",
    )),
    (None, None) => Err(EirError::config(
      "Node config must set either 'processor' or 'processor_ref'",
    )),
    (Some(Value::Str(s)), None) | (None, Some(Value::Str(s))) if !s.trim().is_empty() => Ok(s.trim()),
    _ => Err(EirError::config(
      "processor and processor_ref must be non-empty strings",
    )),
  }
}

/// First non-empty mapping among `keys`, so `parameters` wins over `params` unless it is empty.
/// Absent means empty.
fn mapping_field(node: &RawNode, keys: &[&str], label: &str) -> Result<BTreeMap<String, Value>> {
  for key in keys {
    match present(node, key) {
      None => continue,
      Some(Value::Map(m)) if m.is_empty() => continue,
      Some(Value::Map(m)) => return Ok(m.clone()),
      Some(_) => {
        return Err(EirError::config(format!("{} must be a mapping if provided", label)));
      }
    }
  }
  Ok(BTreeMap::new())
}

/// Kind and element reference of a registered derived processor's metadata.
fn registered_derive(preprocessor: &Value, fqn: &str) -> Result<(&'static str, String)> {
  let kind = match preprocessor.get("type").and_then(Value::as_str) {
    Some("derive.parameter_sweep") => SWEEP,
    Some("derive.slice") => SLICE,
    _ => {
      return Err(EirError::config(format!(
        "derived processor '{}' has no derive.parameter_sweep or derive.slice type",
        fqn
      )));
    }
  };
  let element_ref = preprocessor
    .get("element_ref")
    .and_then(Value::as_str)
    .filter(|s| !s.is_empty())
    .ok_or_else(|| EirError::config(format!("derived processor '{}' has no element_ref", fqn)))?;
  Ok((kind, element_ref.to_string()))
}

/// Normalizes a `derive` payload to `{<kind>: {type, version, element_ref, ..}}`, filling
/// defaults so equivalent payloads from different frontends hash identically.
///
/// Returns the payload and the resolved element reference.
fn normalize_derive(derive: &Value, processor_ref: &str, registry: &Registry) -> Result<(Value, String)> {
  let Some(outer) = derive.as_map() else {
    return Err(EirError::config("derive must be a mapping if provided"));
  };
  let mut entries = outer.iter();
  let (kind, inner) = match (entries.next(), entries.next()) {
    (Some((kind, inner)), None) if kind == SWEEP || kind == SLICE => (kind.as_str(), inner),
    _ => {
      return Err(EirError::config(
        "derive must contain exactly one of 'parameter_sweep' or 'slice'",
      ));
    }
  };
  let Some(inner) = inner.as_map() else {
    return Err(EirError::config(format!("derive.{} must be a mapping", kind)));
  };

  let mut payload = inner.clone();
  let type_tag = format!("derive.{}", kind);
  match payload.get("type") {
    None => {
      payload.insert("type".to_string(), Value::Str(type_tag));
    }
    Some(Value::Str(t)) if *t == type_tag => {}
    Some(_) => {
      return Err(EirError::config(format!(
        "derive.{}.type must be '{}'",
        kind, type_tag
      )));
    }
  }
  payload
    .entry("version".to_string())
    .or_insert(Value::Int(DERIVE_VERSION));
  let element_ref = match payload.get("element_ref") {
    None => processor_ref.to_string(),
    Some(Value::Str(s)) => registry.resolve(s)?.fqn.clone(),
    Some(_) => {
      return Err(EirError::config(format!(
        "derive.{}.element_ref must be a string",
        kind
      )));
    }
  };
  payload.insert("element_ref".to_string(), Value::Str(element_ref.clone()));

  if kind == SWEEP {
    normalize_sweep(&mut payload)?;
  }

  let mut wrapper = BTreeMap::new();
  wrapper.insert(kind.to_string(), Value::Map(payload));
  Ok((Value::Map(wrapper), element_ref))
}

fn normalize_sweep(payload: &mut BTreeMap<String, Value>) -> Result<()> {
  let Some(variables) = payload.get("variables").and_then(Value::as_map) else {
    return Err(EirError::config(
      "derive.parameter_sweep.variables must be a mapping of name to value list",
    ));
  };
  if variables.is_empty() {
    return Err(EirError::config(
      "derive.parameter_sweep.variables must not be empty",
    ));
  }
  let mut lengths = Vec::with_capacity(variables.len());
  for (name, values) in variables {
    match values.as_seq() {
      Some(items) if !items.is_empty() => lengths.push(items.len()),
      _ => {
        return Err(EirError::config(format!(
          "derive.parameter_sweep.variables.{} must be a non-empty list",
          name
        )));
      }
    }
  }
  let mode = match payload.get("mode") {
    None => "product",
    Some(Value::Str(m)) if m == "product" || m == "zip" => m.as_str(),
    Some(_) => {
      return Err(EirError::config(
        "derive.parameter_sweep.mode must be 'product' or 'zip'",
      ));
    }
  };
  if mode == "zip" && lengths.windows(2).any(|w| w[0] != w[1]) {
    return Err(EirError::config(
      "derive.parameter_sweep zip mode requires equal-length variable lists",
    ));
  }
  let mode = mode.to_string();
  payload.insert("mode".to_string(), Value::Str(mode));
  Ok(())
}
