//! Bind/publish normalization: turns a node's raw `bind`, `publish`, `data_key` and
//! `context_key` entries into explicit canonical form.
//!
//! Defaults are materialized, never left implicit: `data` is bound to `channel:primary` and the
//! `out` slot publishes to `primary` unless the author says otherwise.

use std::collections::BTreeMap;

use tracing::instrument;

use crate::error::{EirError, Result};
use crate::types::{
  DATA_PARAM, DEFAULT_OUTPUT_SLOT, PRIMARY_CHANNEL, PublishSpec, SourceRef, Value,
};

/// Raw node declaration.
pub type RawNode = BTreeMap<String, Value>;

/// Looks up `key`, treating an explicit `null` as absent.
pub(crate) fn present<'a>(node: &'a RawNode, key: &str) -> Option<&'a Value> {
  node.get(key).filter(|v| !v.is_null())
}

/// Normalizes a raw `bind` mapping into `param → SourceRef`, adding `data → channel:primary`.
#[instrument(level = "trace")]
pub fn normalize_bind(raw: Option<&Value>) -> Result<BTreeMap<String, SourceRef>> {
  let mut bind = BTreeMap::new();
  match raw {
    None | Some(Value::Null) => {}
    Some(Value::Map(entries)) => {
      for (param, source) in entries {
        let Value::Str(source) = source else {
          return Err(EirError::config(format!(
            "bind source references must be non-empty strings (param '{}' has a {})",
            param,
            source.type_name()
          )));
        };
        bind.insert(param.clone(), SourceRef::parse(source)?);
      }
    }
    Some(_) => return Err(EirError::config("bind must be a mapping if provided")),
  }
  bind
    .entry(DATA_PARAM.to_string())
    .or_insert_with(SourceRef::primary);
  Ok(bind)
}

/// Normalizes publication targets from `publish`, the legacy `data_key` and `context_key`.
#[instrument(level = "trace", skip(node))]
pub fn normalize_publish(node: &RawNode) -> Result<PublishSpec> {
  let publish = match present(node, "publish") {
    None => None,
    Some(Value::Map(m)) => Some(m),
    Some(_) => return Err(EirError::config("publish must be a mapping if provided")),
  };

  let mut channels = BTreeMap::new();
  match publish.and_then(|p| p.get("channels")) {
    None | Some(Value::Null) => {}
    Some(Value::Map(raw)) => {
      for (slot, name) in raw {
        channels.insert(slot.clone(), non_empty_str(name, &format!("publish.channels.{}", slot))?);
      }
    }
    Some(_) => return Err(EirError::config("publish.channels must be a mapping")),
  }

  if let Some(data_key) = present(node, "data_key") {
    channels.insert(
      DEFAULT_OUTPUT_SLOT.to_string(),
      non_empty_str(data_key, "data_key")?,
    );
  }
  channels
    .entry(DEFAULT_OUTPUT_SLOT.to_string())
    .or_insert_with(|| PRIMARY_CHANNEL.to_string());

  let context_key = match present(node, "context_key")
    .or_else(|| publish.and_then(|p| p.get("context_key")).filter(|v| !v.is_null()))
  {
    None => None,
    Some(v) => Some(non_empty_str(v, "context_key")?),
  };

  Ok(PublishSpec {
    channels,
    context_key,
  })
}

fn non_empty_str(value: &Value, field: &str) -> Result<String> {
  match value {
    Value::Str(s) if !s.is_empty() => Ok(s.clone()),
    _ => Err(EirError::config(format!(
      "{} must be a non-empty string when set",
      field
    ))),
  }
}

/// True when the node declares topology beyond the implicit defaults: an explicit `bind`,
/// a `data_key`, or a publish target other than `out → primary`.
pub fn declares_explicit_topology(node: &RawNode, publish: &PublishSpec) -> bool {
  present(node, "bind").is_some() || present(node, "data_key").is_some() || publish.has_named_target()
}
