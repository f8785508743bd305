//! Explicit processor registry: fully-qualified name → metadata + factory, with a short-name
//! multimap for unambiguous lookups.
//!
//! A registry is a plain value. Build one per process (or per test) and pass it by reference;
//! compilation and execution only read from it.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::error::{Result, SymbolError};
use crate::processor::{Processor, ProcessorFactory, ProcessorSpec, short_name_of};

#[derive(Clone)]
struct RegistryEntry {
  spec: ProcessorSpec,
  factory: ProcessorFactory,
}

/// Name → processor lookup table.
#[derive(Clone, Default)]
pub struct Registry {
  entries: BTreeMap<String, RegistryEntry>,
  short_names: BTreeMap<String, BTreeSet<String>>,
}

impl fmt::Debug for Registry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Registry")
      .field("processors", &self.entries.keys().collect::<Vec<_>>())
      .finish()
  }
}

impl Registry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registry with the built-in float demo processors.
  pub fn builtin() -> Self {
    let mut registry = Self::new();
    crate::processors::register_builtins(&mut registry);
    registry
  }

  /// Registers `spec` under its FQN. Re-registering the same FQN replaces the entry.
  pub fn register<F>(&mut self, spec: ProcessorSpec, factory: F)
  where
    F: Fn() -> Box<dyn Processor> + Send + Sync + 'static,
  {
    debug!(fqn = %spec.fqn, "registering processor");
    let fqn = spec.fqn.clone();
    self
      .short_names
      .entry(short_name_of(&fqn).to_string())
      .or_default()
      .insert(fqn.clone());
    self.entries.insert(
      fqn,
      RegistryEntry {
        spec,
        factory: Arc::new(factory),
      },
    );
  }

  /// Fully-qualified names a short name maps to, sorted.
  pub fn candidates(&self, short_name: &str) -> Vec<String> {
    self
      .short_names
      .get(short_name)
      .map(|set| set.iter().cloned().collect())
      .unwrap_or_default()
  }

  /// Resolves a short or fully-qualified symbol to its processor metadata.
  #[instrument(level = "trace", skip(self))]
  pub fn resolve(&self, symbol: &str) -> Result<&ProcessorSpec> {
    if let Some(entry) = self.entries.get(symbol) {
      return Ok(&entry.spec);
    }
    if symbol.contains("::") {
      return Err(self.unknown(symbol));
    }
    let candidates = self.candidates(symbol);
    match candidates.as_slice() {
      [] => Err(self.unknown(symbol)),
      [fqn] => self
        .entries
        .get(fqn)
        .map(|e| &e.spec)
        .ok_or_else(|| self.unknown(symbol)),
      _ => Err(
        SymbolError::Ambiguous {
          symbol: symbol.to_string(),
          candidates,
        }
        .into(),
      ),
    }
  }

  /// Metadata of an exact FQN.
  pub fn spec(&self, fqn: &str) -> Result<&ProcessorSpec> {
    self
      .entries
      .get(fqn)
      .map(|e| &e.spec)
      .ok_or_else(|| self.unknown(fqn))
  }

  /// New processor instance for an exact FQN.
  pub fn create(&self, fqn: &str) -> Result<Box<dyn Processor>> {
    self
      .entries
      .get(fqn)
      .map(|e| (e.factory)())
      .ok_or_else(|| self.unknown(fqn))
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  fn unknown(&self, symbol: &str) -> crate::error::EirError {
    SymbolError::Unknown {
      symbol: symbol.to_string(),
    }
    .into()
  }
}
