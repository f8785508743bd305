//! Error taxonomy for compilation and execution.
//!
//! Every kind is fatal within this crate; nothing is retried or silently recovered.
//! Messages are deterministic for identical input so they can be compared in golden tests.

use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, EirError>;

/// Processor-reference resolution failure raised by the [crate::registry::Registry].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolError {
  /// No registered processor matches the symbol.
  #[error("Unknown processor reference '{symbol}'. Register the processor or use its fully-qualified name.")]
  Unknown { symbol: String },

  /// A short name matches two or more fully-qualified names.
  #[error(
    "Ambiguous processor symbol '{symbol}'. Candidates: [{}]. Fix: use an explicit processor_ref with a fully-qualified name, e.g. {{\"processor_ref\": \"{}\"}}",
    .candidates.join(", "),
    .candidates.first().map(String::as_str).unwrap_or("")
  )]
  Ambiguous {
    symbol: String,
    /// Sorted fully-qualified candidates.
    candidates: Vec<String>,
  },
}

/// Failure reported by a [crate::validation::SchemaValidator].
///
/// Carried through [EirError::Schema] untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: {message}")]
pub struct SchemaError {
  /// JSON-pointer-like location of the offending value (`/identity/eir_id`).
  pub path: String,
  pub message: String,
}

impl SchemaError {
  pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      path: path.into(),
      message: message.into(),
    }
  }
}

/// Errors that can occur while canonicalizing, compiling, validating, or executing a pipeline.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EirError {
  /// Malformed node declaration (bind/publish shape, processor reference, parameters).
  #[error("configuration error: {0}")]
  Configuration(String),

  /// Channel topology violation found while deriving dependency edges.
  #[error("topology error: {0}")]
  Topology(String),

  /// Runtime parameter or channel resolution failure.
  #[error("resolution error: {0}")]
  Resolution(String),

  #[error(transparent)]
  Symbol(#[from] SymbolError),

  #[error(transparent)]
  Schema(#[from] SchemaError),

  /// A value could not be encoded as strict stable JSON (non-finite float, bad key).
  #[error("stable json error: {0}")]
  StableJson(String),

  /// A processor returned an error while running a node.
  #[error("processor error in node {node_uuid}: {message}")]
  Processor { node_uuid: String, message: String },

  /// Reading or writing a spec file or run log failed.
  #[error("io error: {0}")]
  Io(String),
}

impl EirError {
  pub(crate) fn config(msg: impl Into<String>) -> Self {
    EirError::Configuration(msg.into())
  }

  pub(crate) fn topology(msg: impl Into<String>) -> Self {
    EirError::Topology(msg.into())
  }

  pub(crate) fn resolution(msg: impl Into<String>) -> Self {
    EirError::Resolution(msg.into())
  }

  /// Short stable tag for the error kind, used in run logs.
  pub fn kind(&self) -> &'static str {
    match self {
      EirError::Configuration(_) => "configuration",
      EirError::Topology(_) => "topology",
      EirError::Resolution(_) => "resolution",
      EirError::Symbol(_) => "symbol",
      EirError::Schema(_) => "schema",
      EirError::StableJson(_) => "stable_json",
      EirError::Processor { .. } => "processor",
      EirError::Io(_) => "io",
    }
  }
}

impl From<std::io::Error> for EirError {
  fn from(err: std::io::Error) -> Self {
    EirError::Io(err.to_string())
  }
}
