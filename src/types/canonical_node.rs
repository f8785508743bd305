//! Canonical record of one declared node.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{PublishSpec, SourceRef, Value};

/// Canonical node. `node_uuid` is derived from every other field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalNode {
  pub role: String,
  /// Resolved fully-qualified processor name (the base element for derived nodes).
  pub processor_ref: String,
  pub parameters: BTreeMap<String, Value>,
  pub ports: BTreeMap<String, Value>,
  /// Derived-processor construction payload (`parameter_sweep` or `slice`).
  pub derive: Option<Value>,
  pub bind: BTreeMap<String, SourceRef>,
  pub publish: PublishSpec,
  pub declaration_index: u64,
  pub declaration_subindex: u64,
  pub node_uuid: String,
}

impl CanonicalNode {
  /// Explicit bind of `param`, if any. Includes the materialized `data → channel:primary`.
  pub fn bind_for(&self, param: &str) -> Option<&SourceRef> {
    self.bind.get(param)
  }
}
