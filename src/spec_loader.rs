//! Pipeline spec loading: JSON or YAML files, or in-memory node lists.
//!
//! Accepted shapes: a bare node list, `{nodes: [..]}`, or `{pipeline: {nodes: [..]},
//! extensions: [..]}`.

use std::path::Path;

use tracing::instrument;

use crate::error::{EirError, Result};
use crate::stable_json::{sha256_hex, stable_digest, to_lossy_json, to_stable_string};
use crate::types::Value;

/// Where a spec came from, with a fingerprint of its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecOrigin {
  /// `yaml_path` or `json_path`.
  pub kind: String,
  pub fingerprint: String,
}

/// Authoring input to the compiler.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PipelineSpec {
  pub nodes: Vec<Value>,
  /// Declared extension names; recorded in the IR source section.
  pub extensions: Vec<String>,
  pub origin: Option<SpecOrigin>,
}

impl PipelineSpec {
  pub fn from_nodes(nodes: Vec<Value>) -> Self {
    Self {
      nodes,
      ..Default::default()
    }
  }

  /// Parses any accepted document shape.
  pub fn from_document(doc: Value) -> Result<Self> {
    let (nodes, extensions) = match doc {
      Value::Seq(nodes) => (nodes, Vec::new()),
      Value::Map(mut top) => {
        let extensions = extension_list(top.remove("extensions"))?;
        let nodes = match (top.remove("pipeline"), top.remove("nodes")) {
          (Some(Value::Map(mut pipeline)), _) => {
            let nested = extension_list(pipeline.remove("extensions"))?;
            let extensions = if extensions.is_empty() { nested } else { extensions };
            return Ok(Self {
              nodes: node_list(pipeline.remove("nodes"))?,
              extensions,
              origin: None,
            });
          }
          (Some(_), _) => return Err(EirError::config("pipeline must be a mapping")),
          (None, nodes @ Some(_)) => node_list(nodes)?,
          (None, None) => {
            return Err(EirError::config(
              "Unsupported pipeline specification shape; expected mapping with 'pipeline'/'nodes' or a list of nodes.",
            ));
          }
        };
        (nodes, extensions)
      }
      _ => {
        return Err(EirError::config(
          "Unsupported pipeline specification shape; expected mapping with 'pipeline'/'nodes' or a list of nodes.",
        ));
      }
    };
    Ok(Self {
      nodes,
      extensions,
      origin: None,
    })
  }

  pub fn from_json_str(text: &str) -> Result<Self> {
    let doc: Value =
      serde_json::from_str(text).map_err(|e| EirError::config(format!("invalid JSON spec: {}", e)))?;
    Self::from_document(doc)
  }

  pub fn from_yaml_str(text: &str) -> Result<Self> {
    let doc: Value =
      serde_yaml::from_str(text).map_err(|e| EirError::config(format!("invalid YAML spec: {}", e)))?;
    Self::from_document(doc)
  }
}

fn node_list(nodes: Option<Value>) -> Result<Vec<Value>> {
  match nodes {
    None | Some(Value::Null) => Ok(Vec::new()),
    Some(Value::Seq(items)) => Ok(items),
    Some(_) => Err(EirError::config("nodes must be a list of node mappings")),
  }
}

fn extension_list(raw: Option<Value>) -> Result<Vec<String>> {
  match raw {
    None | Some(Value::Null) => Ok(Vec::new()),
    Some(Value::Str(s)) => Ok(vec![s]),
    Some(Value::Seq(items)) => items
      .into_iter()
      .map(|item| match item {
        Value::Str(s) => Ok(s),
        other => Err(EirError::config(format!(
          "extensions must be strings, got {}",
          other.type_name()
        ))),
      })
      .collect(),
    Some(other) => Err(EirError::config(format!(
      "extensions must be a string or a list, got {}",
      other.type_name()
    ))),
  }
}

/// Loads a spec file; `.yaml`/`.yml` parse as YAML, `.json` as JSON.
#[instrument(level = "trace")]
pub fn load_pipeline_spec(path: &Path) -> Result<PipelineSpec> {
  let bytes = std::fs::read(path)
    .map_err(|e| EirError::Io(format!("reading {}: {}", path.display(), e)))?;
  let text = String::from_utf8(bytes.clone())
    .map_err(|e| EirError::Io(format!("{} is not UTF-8: {}", path.display(), e)))?;
  let extension = path
    .extension()
    .and_then(|e| e.to_str())
    .map(str::to_ascii_lowercase);
  let (mut spec, kind) = match extension.as_deref() {
    Some("yaml") | Some("yml") => (PipelineSpec::from_yaml_str(&text)?, "yaml_path"),
    Some("json") => (PipelineSpec::from_json_str(&text)?, "json_path"),
    _ => {
      return Err(EirError::config(format!(
        "unsupported spec file extension for {}; expected .yaml, .yml or .json",
        path.display()
      )));
    }
  };
  spec.origin = Some(SpecOrigin {
    kind: kind.to_string(),
    fingerprint: sha256_hex(&bytes),
  });
  Ok(spec)
}

/// Best-effort `(kind, fingerprint)` of the authoring input, for the IR source section.
///
/// File-backed specs hash their bytes. Node lists hash their stable JSON, falling back to a
/// lossy rendering (`node_list_lossy`) when a value is not strictly encodable. The lossy form
/// may collide and is for display only.
pub fn fingerprint_source(spec: &PipelineSpec) -> (String, String) {
  if let Some(origin) = &spec.origin {
    return (origin.kind.clone(), origin.fingerprint.clone());
  }
  match stable_digest(&spec.nodes) {
    Ok(digest) => ("node_list".to_string(), digest),
    Err(_) => {
      let lossy = to_lossy_json(&Value::Seq(spec.nodes.clone()));
      let text = to_stable_string(&lossy).unwrap_or_default();
      ("node_list_lossy".to_string(), sha256_hex(text.as_bytes()))
    }
  }
}
