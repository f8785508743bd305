//! Tagged reference to a channel or a context key.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{EirError, Result};

/// Default data-flow channel.
pub const PRIMARY_CHANNEL: &str = "primary";

/// Parameter that carries a node's input data.
pub const DATA_PARAM: &str = "data";

/// Output slot every node publishes from.
pub const DEFAULT_OUTPUT_SLOT: &str = "out";

/// Where a bound parameter reads its value from.
///
/// Grammar: `channel:<name>`, `context:<key>`, or an unprefixed `<name>` (a channel).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceRef {
  Channel(String),
  Context(String),
}

impl SourceRef {
  pub fn channel(name: impl Into<String>) -> Self {
    SourceRef::Channel(name.into())
  }

  pub fn context(key: impl Into<String>) -> Self {
    SourceRef::Context(key.into())
  }

  pub fn primary() -> Self {
    SourceRef::Channel(PRIMARY_CHANNEL.to_string())
  }

  /// Parses a raw bind source. Malformed input is a configuration error.
  pub fn parse(raw: &str) -> Result<Self> {
    if raw.is_empty() {
      return Err(EirError::config(
        "bind source references must be non-empty strings",
      ));
    }
    match raw.split_once(':') {
      None => Ok(SourceRef::Channel(raw.to_string())),
      Some(("channel", name)) if !name.is_empty() => Ok(SourceRef::Channel(name.to_string())),
      Some(("context", key)) if !key.is_empty() => Ok(SourceRef::Context(key.to_string())),
      Some(_) => Err(EirError::config(format!(
        "Unsupported SourceRef '{}'. Expected channel:<name> or context:<key>.",
        raw
      ))),
    }
  }

  /// `"channel"` or `"context"`.
  pub fn kind(&self) -> &'static str {
    match self {
      SourceRef::Channel(_) => "channel",
      SourceRef::Context(_) => "context",
    }
  }

  /// Channel name or context key.
  pub fn key(&self) -> &str {
    match self {
      SourceRef::Channel(k) | SourceRef::Context(k) => k,
    }
  }

  pub fn is_primary(&self) -> bool {
    matches!(self, SourceRef::Channel(name) if name == PRIMARY_CHANNEL)
  }
}

impl fmt::Display for SourceRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.kind(), self.key())
  }
}

impl Serialize for SourceRef {
  fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for SourceRef {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
    let raw = String::deserialize(deserializer)?;
    SourceRef::parse(&raw).map_err(serde::de::Error::custom)
  }
}
