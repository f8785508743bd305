//! Normalized publication targets of a node.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{DEFAULT_OUTPUT_SLOT, PRIMARY_CHANNEL};

/// Output slot → channel map, plus an optional context key that also receives the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishSpec {
  pub channels: BTreeMap<String, String>,
  pub context_key: Option<String>,
}

impl Default for PublishSpec {
  fn default() -> Self {
    let mut channels = BTreeMap::new();
    channels.insert(DEFAULT_OUTPUT_SLOT.to_string(), PRIMARY_CHANNEL.to_string());
    Self {
      channels,
      context_key: None,
    }
  }
}

impl PublishSpec {
  /// Channel receiving the `out` slot.
  pub fn out_channel(&self) -> &str {
    self
      .channels
      .get(DEFAULT_OUTPUT_SLOT)
      .map(String::as_str)
      .unwrap_or(PRIMARY_CHANNEL)
  }

  /// True when the node publishes anywhere beyond the implicit `out → primary`.
  pub fn has_named_target(&self) -> bool {
    self
      .channels
      .iter()
      .any(|(slot, channel)| slot != DEFAULT_OUTPUT_SLOT || channel != PRIMARY_CHANNEL)
  }
}
