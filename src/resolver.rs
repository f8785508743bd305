//! Runtime parameter resolution.
//!
//! Precedence for a parameter `p`:
//! 1. explicit bind (after checking it does not collide with a node parameter or a context key)
//! 2. literal node parameter
//! 3. context key of the same name
//! 4. declared default
//!
//! `data` always carries a bind (`channel:primary` unless overridden), so it takes path 1.

use std::collections::BTreeMap;

use tracing::{debug, instrument};

use crate::channel_store::{ChannelStore, ContextProducers};
use crate::error::{EirError, Result};
use crate::types::{
  ParamSource, ProducerRef, ResolvedParam, RunContext, SourceRef, SourceRefDetail, Value,
};

/// Read-only view of everything a node's parameters may resolve from.
///
/// `producers` must be the snapshot taken before the node runs.
pub struct ResolutionScope<'a> {
  pub bind: &'a BTreeMap<String, SourceRef>,
  pub node_params: &'a BTreeMap<String, Value>,
  pub channels: &'a ChannelStore,
  pub context: &'a RunContext,
  pub producers: &'a ContextProducers,
}

impl ResolutionScope<'_> {
  /// Resolves `param`, falling back to `default` when nothing else supplies it.
  #[instrument(level = "trace", skip(self, default))]
  pub fn resolve(&self, param: &str, default: Option<&Value>) -> Result<ResolvedParam> {
    if let Some(source) = self.bind.get(param) {
      self.check_conflicts(param)?;
      let resolved = self.resolve_bound(param, source)?;
      debug!(param, source = %source, "resolved parameter from bind");
      return Ok(resolved);
    }
    if let Some(value) = self.node_params.get(param) {
      debug!(param, "resolved parameter from node parameters");
      return Ok(ResolvedParam {
        value: value.clone(),
        source: ParamSource::Node,
        source_ref: None,
      });
    }
    if let Some(value) = self.context.get(param) {
      debug!(param, "resolved parameter from context");
      return Ok(ResolvedParam {
        value: value.clone(),
        source: ParamSource::Context,
        source_ref: Some(SourceRefDetail::Context {
          key: param.to_string(),
          producer: self.context_producer(param),
        }),
      });
    }
    if let Some(value) = default {
      debug!(param, "resolved parameter from default");
      return Ok(ResolvedParam {
        value: value.clone(),
        source: ParamSource::Default,
        source_ref: None,
      });
    }
    Err(EirError::resolution(format!(
      "Unable to resolve parameter '{}' via bind/node/context/default.",
      param
    )))
  }

  /// A bound parameter must not also be a node parameter or a context key.
  fn check_conflicts(&self, param: &str) -> Result<()> {
    let mut locations = Vec::new();
    if self.node_params.contains_key(param) {
      locations.push("node parameters");
    }
    if self.context.contains_key(param) {
      locations.push("context");
    }
    if locations.is_empty() {
      return Ok(());
    }
    Err(EirError::resolution(format!(
      "Ambiguous resolution for '{}': bind conflicts with {}.",
      param,
      locations.join(" and ")
    )))
  }

  fn resolve_bound(&self, param: &str, source: &SourceRef) -> Result<ResolvedParam> {
    match source {
      SourceRef::Channel(channel) => {
        let entry = self.channels.entry(channel).ok_or_else(|| {
          EirError::resolution(format!(
            "Channel '{}' is not available for parameter '{}'.",
            channel, param
          ))
        })?;
        Ok(ResolvedParam {
          value: entry.value.clone(),
          source: ParamSource::Channel,
          source_ref: Some(SourceRefDetail::Channel {
            channel: channel.clone(),
            producer: entry.producer.clone(),
          }),
        })
      }
      SourceRef::Context(key) => {
        let value = self.context.get(key).ok_or_else(|| {
          EirError::resolution(format!(
            "Context key '{}' is not available for parameter '{}'.",
            key, param
          ))
        })?;
        Ok(ResolvedParam {
          value: value.clone(),
          source: ParamSource::Context,
          source_ref: Some(SourceRefDetail::Context {
            key: key.clone(),
            producer: self.context_producer(key),
          }),
        })
      }
    }
  }

  /// Keys without a tracked producer were supplied with the run.
  fn context_producer(&self, key: &str) -> ProducerRef {
    self
      .producers
      .producer_of(key)
      .cloned()
      .unwrap_or(ProducerRef::PipelineInputContext)
  }
}
