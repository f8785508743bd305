//! IR document validation.
//!
//! [SchemaValidator] is the seam for an external JSON-Schema validator. Its errors are
//! propagated unchanged. [StructuralValidator] is the built-in implementation: required
//! sections, identity formats, payload-form enums and plan/graph consistency.

use std::collections::BTreeSet;

use regex::Regex;
use serde_json::Value as Json;
use tracing::instrument;

use crate::error::{EirError, Result, SchemaError};
use crate::types::{EIR_VERSION, EirDocument};

const IDENTITY_PATTERNS: [(&str, &str); 3] = [
  ("pipeline_id", r"^plid-[0-9a-f]{64}$"),
  ("pipeline_variant_id", r"^pvid-[0-9a-f]{64}$"),
  ("eir_id", r"^eirid-[0-9a-f]{64}$"),
];

const PAYLOAD_FORMS: [&str; 3] = ["scalar", "channel", "lane_bundle"];

/// Validates an IR document in its JSON form.
pub trait SchemaValidator: Send + Sync {
  fn validate(&self, doc: &Json) -> std::result::Result<(), SchemaError>;
}

/// Built-in structural validator for `eir_version` 1.
#[derive(Debug, Clone)]
pub struct StructuralValidator {
  identity_patterns: Vec<(&'static str, Regex)>,
}

impl StructuralValidator {
  pub fn new() -> Result<Self> {
    let identity_patterns = IDENTITY_PATTERNS
      .iter()
      .map(|(key, pattern)| Ok((*key, Regex::new(pattern)?)))
      .collect::<std::result::Result<Vec<_>, regex::Error>>()
      .map_err(|e| EirError::config(format!("invalid identity pattern: {}", e)))?;
    Ok(Self { identity_patterns })
  }
}

impl SchemaValidator for StructuralValidator {
  #[instrument(level = "trace", skip(self, doc))]
  fn validate(&self, doc: &Json) -> std::result::Result<(), SchemaError> {
    let root = object(doc, "")?;
    match root.get("eir_version").and_then(Json::as_u64) {
      Some(v) if v == u64::from(EIR_VERSION) => {}
      _ => {
        return Err(SchemaError::new(
          "/eir_version",
          format!("must be {}", EIR_VERSION),
        ));
      }
    }

    let identity = object(field(doc, "", "identity")?, "/identity")?;
    for (key, re) in &self.identity_patterns {
      let path = format!("/identity/{}", key);
      let value = identity
        .get(*key)
        .and_then(Json::as_str)
        .ok_or_else(|| SchemaError::new(&path, "required string"))?;
      if !re.is_match(value) {
        return Err(SchemaError::new(
          &path,
          format!("'{}' does not match {}", value, re.as_str()),
        ));
      }
    }

    let graph = field(doc, "", "graph")?;
    let nodes = array(field(graph, "/graph", "nodes")?, "/graph/nodes")?;
    array(field(graph, "/graph", "edges")?, "/graph/edges")?;
    let mut node_uuids = Vec::with_capacity(nodes.len());
    for (i, node) in nodes.iter().enumerate() {
      let path = format!("/graph/nodes/{}", i);
      let uuid = string(field(node, &path, "node_uuid")?, &format!("{}/node_uuid", path))?;
      if uuid::Uuid::parse_str(uuid).is_err() {
        return Err(SchemaError::new(
          format!("{}/node_uuid", path),
          format!("'{}' is not a UUID", uuid),
        ));
      }
      string(field(node, &path, "processor_ref")?, &format!("{}/processor_ref", path))?;
      node_uuids.push(uuid);
    }

    let objects = object(
      field(field(doc, "", "parameters")?, "/parameters", "objects")?,
      "/parameters/objects",
    )?;
    for uuid in &node_uuids {
      let key = format!("params:{}", uuid);
      if !objects.contains_key(&key) {
        return Err(SchemaError::new(
          "/parameters/objects",
          format!("missing '{}'", key),
        ));
      }
    }

    let plan = field(doc, "", "plan")?;
    let segments = array(field(plan, "/plan", "segments")?, "/plan/segments")?;
    let mut planned = Vec::new();
    for (i, segment) in segments.iter().enumerate() {
      let path = format!("/plan/segments/{}", i);
      let kind = string(field(segment, &path, "kind")?, &format!("{}/kind", path))?;
      if kind != "classic_linear" {
        return Err(SchemaError::new(
          format!("{}/kind", path),
          format!("unsupported segment kind '{}'", kind),
        ));
      }
      for (j, id) in array(field(segment, &path, "node_order")?, &format!("{}/node_order", path))?
        .iter()
        .enumerate()
      {
        planned.push(string(id, &format!("{}/node_order/{}", path, j))?);
      }
    }
    if planned != node_uuids {
      return Err(SchemaError::new(
        "/plan",
        "node_order must list every graph node exactly once, in graph order",
      ));
    }

    let semantics = field(doc, "", "semantics")?;
    let forms = field(semantics, "/semantics", "payload_forms")?;
    for key in ["root_form", "terminal_form"] {
      payload_form(field(forms, "/semantics/payload_forms", key)?, &format!("/semantics/payload_forms/{}", key))?;
    }
    let node_io = object(
      field(forms, "/semantics/payload_forms", "node_io")?,
      "/semantics/payload_forms/node_io",
    )?;
    let io_keys: BTreeSet<&str> = node_io.keys().map(String::as_str).collect();
    let graph_keys: BTreeSet<&str> = node_uuids.iter().copied().collect();
    if io_keys != graph_keys {
      return Err(SchemaError::new(
        "/semantics/payload_forms/node_io",
        "must have exactly one entry per graph node",
      ));
    }
    for (uuid, io) in node_io {
      let path = format!("/semantics/payload_forms/node_io/{}", uuid);
      for key in ["input_form", "output_form"] {
        payload_form(field(io, &path, key)?, &format!("{}/{}", path, key))?;
      }
    }
    object(
      field(field(semantics, "/semantics", "slots")?, "/semantics/slots", "node_slots")?,
      "/semantics/slots/node_slots",
    )?;

    object(field(doc, "", "lineage")?, "/lineage")?;
    object(field(doc, "", "source")?, "/source")?;
    object(field(doc, "", "build")?, "/build")?;
    Ok(())
  }
}

/// Validates a typed document through `validator`.
#[instrument(level = "trace", skip(validator, doc))]
pub fn validate_document(validator: &dyn SchemaValidator, doc: &EirDocument) -> Result<()> {
  let json = serde_json::to_value(doc).map_err(|e| EirError::StableJson(e.to_string()))?;
  validator.validate(&json)?;
  Ok(())
}

fn field<'a>(value: &'a Json, path: &str, key: &str) -> std::result::Result<&'a Json, SchemaError> {
  value
    .get(key)
    .ok_or_else(|| SchemaError::new(format!("{}/{}", path, key), "required"))
}

fn object<'a>(
  value: &'a Json,
  path: &str,
) -> std::result::Result<&'a serde_json::Map<String, Json>, SchemaError> {
  value
    .as_object()
    .ok_or_else(|| SchemaError::new(path, "must be an object"))
}

fn array<'a>(value: &'a Json, path: &str) -> std::result::Result<&'a Vec<Json>, SchemaError> {
  value
    .as_array()
    .ok_or_else(|| SchemaError::new(path, "must be an array"))
}

fn string<'a>(value: &'a Json, path: &str) -> std::result::Result<&'a str, SchemaError> {
  value
    .as_str()
    .ok_or_else(|| SchemaError::new(path, "must be a string"))
}

fn payload_form(value: &Json, path: &str) -> std::result::Result<(), SchemaError> {
  match value.as_str() {
    Some(form) if PAYLOAD_FORMS.contains(&form) => Ok(()),
    _ => Err(SchemaError::new(
      path,
      format!("must be one of {}", PAYLOAD_FORMS.join(", ")),
    )),
  }
}
