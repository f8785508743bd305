//! Executes a compiled [EirDocument] node by node.
//!
//! - [run_eir]: validate, seed the channel store, run every node of the plan in order, and
//!   return the final primary value together with the run state.
//!
//! Each node resolves its parameters against a pre-execution snapshot of context producers,
//! runs its processor, has its context writes attributed to it, and publishes its output. A
//! failing node aborts the run; the partially mutated state is returned with the error.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::channel_store::{
  ChannelStore, ContextProducers, detect_context_writes, removed_context_keys,
};
use crate::derived_edges::{compute_upstream_map, derive_edges};
use crate::error::{EirError, Result};
use crate::processor::ProcessorKind;
use crate::processors::{sweep_variable_names, wrap_derived};
use crate::registry::Registry;
use crate::resolver::ResolutionScope;
use crate::run_log_io::{RUN_LOG_FILENAME, save_run_log};
use crate::stable_json::to_lossy_json;
use crate::trace_sink::TraceSink;
use crate::types::{
  CanonicalNode, ChannelEntry, DATA_PARAM, EirDocument, NodeProvenance, PRIMARY_CHANNEL,
  ParamRecord, ProducerRef, ResolvedParam, RunContext, RunErrorRecord, RunLog, RunStatus,
  SourceRef, Value,
};
use crate::validation::{StructuralValidator, validate_document};

/// Options for [run_eir].
#[derive(Clone)]
pub struct RunOptions {
  /// Validate the document structurally before running. Default: true.
  pub strict_validation: bool,
  /// If set, `run.log.json` is written here when the run ends (success or failure).
  pub run_dir: Option<PathBuf>,
  /// Receives one provenance record per node and the run log.
  pub trace: Option<Arc<dyn TraceSink>>,
}

impl Default for RunOptions {
  fn default() -> Self {
    Self {
      strict_validation: true,
      run_dir: None,
      trace: None,
    }
  }
}

/// Mutable per-run state: context, channels, context producers and the provenance trail.
#[derive(Debug, Clone, PartialEq)]
pub struct RunState {
  pub context: RunContext,
  pub channels: ChannelStore,
  pub context_producers: ContextProducers,
  pub provenance: Vec<NodeProvenance>,
}

impl RunState {
  fn new(data: Value, context: RunContext) -> Self {
    Self {
      context_producers: ContextProducers::new(&context),
      channels: ChannelStore::seeded(data),
      context,
      provenance: Vec::new(),
    }
  }
}

/// Successful run: the final primary value and the state it was produced in.
#[derive(Debug, Clone)]
pub struct RunOutcome {
  pub data: Value,
  pub state: RunState,
}

/// Failed run. `state` holds every mutation made before the failing node aborted.
#[derive(Debug, Clone, Error)]
#[error("{error}")]
pub struct RunFailure {
  pub error: EirError,
  pub state: Box<RunState>,
}

/// Runs `doc` with `data` seeded into `primary` and `context` as the initial context.
#[instrument(level = "trace", skip(doc, registry, data, context, options))]
pub async fn run_eir(
  doc: &EirDocument,
  registry: &Registry,
  data: Value,
  context: RunContext,
  options: &RunOptions,
) -> std::result::Result<RunOutcome, RunFailure> {
  let mut state = RunState::new(data, context);
  let mut log = RunLog::new(
    doc.identity.pipeline_id.clone(),
    doc.identity.eir_id.clone(),
    now_rfc3339(),
  );
  info!(
    pipeline_id = %doc.identity.pipeline_id,
    eir_id = %doc.identity.eir_id,
    "run starting"
  );

  let result = execute_plan(doc, registry, &mut state, options).await;
  log.finished_at = Some(now_rfc3339());
  log.steps = state.provenance.clone();
  log.final_primary = state.channels.primary().map(|e| to_lossy_json(&e.value));
  match &result {
    Ok(()) => log.status = RunStatus::Succeeded,
    Err(error) => {
      warn!(kind = error.kind(), error = %error, "run failed");
      log.status = RunStatus::Failed;
      log.error = Some(RunErrorRecord {
        kind: error.kind().to_string(),
        message: error.to_string(),
      });
    }
  }
  if let Some(trace) = &options.trace {
    trace.on_run_end(&log);
  }

  let written = match &options.run_dir {
    Some(dir) => save_run_log(&dir.join(RUN_LOG_FILENAME), &log).map_err(EirError::from),
    None => Ok(()),
  };

  let outcome = result.and(written).and_then(|()| {
    state
      .channels
      .primary()
      .map(|e| e.value.clone())
      .ok_or_else(primary_missing)
  });
  match outcome {
    Ok(data) => {
      info!(steps = state.provenance.len(), "run succeeded");
      Ok(RunOutcome { data, state })
    }
    Err(error) => Err(RunFailure {
      error,
      state: Box::new(state),
    }),
  }
}

async fn execute_plan(
  doc: &EirDocument,
  registry: &Registry,
  state: &mut RunState,
  options: &RunOptions,
) -> Result<()> {
  if options.strict_validation {
    let validator = StructuralValidator::new()?;
    validate_document(&validator, doc)?;
  }
  let upstream = match &doc.derived {
    Some(derived) => derived.upstream.clone(),
    None => {
      let edges = derive_edges(&doc.graph.nodes)?;
      compute_upstream_map(&doc.graph.nodes, &edges)
    }
  };

  for (index, node_uuid) in doc.plan.node_order().enumerate() {
    let node = doc.node(node_uuid).ok_or_else(|| {
      EirError::resolution(format!("Plan references unknown node '{}'.", node_uuid))
    })?;
    let step = u32::try_from(index + 1).unwrap_or(u32::MAX);
    let derived_upstream = upstream.get(node_uuid).cloned().unwrap_or_default();
    let record = execute_node(step, node, registry, state, derived_upstream).await?;
    if let Some(trace) = &options.trace {
      trace.on_node(&record);
    }
    state.provenance.push(record);
  }
  Ok(())
}

/// Runs one node and returns its provenance record.
#[instrument(level = "trace", skip(node, registry, state, derived_upstream), fields(node_uuid = %node.node_uuid))]
async fn execute_node(
  step: u32,
  node: &CanonicalNode,
  registry: &Registry,
  state: &mut RunState,
  derived_upstream: Vec<String>,
) -> Result<NodeProvenance> {
  info!(step, node_uuid = %node.node_uuid, processor_ref = %node.processor_ref, "executing node");
  let spec = registry.spec(&node.processor_ref)?;
  let mut processor = registry.create(&node.processor_ref)?;
  let mut swept = Vec::new();
  if let Some(derive) = &node.derive {
    processor = wrap_derived(derive, processor)?;
    swept = sweep_variable_names(derive);
  }

  // Resolution sees producers as they were before this node ran.
  let producers = state.context_producers.clone();
  let resolved = {
    let scope = ResolutionScope {
      bind: &node.bind,
      node_params: &node.parameters,
      channels: &state.channels,
      context: &state.context,
      producers: &producers,
    };
    let mut resolved: Vec<(String, ResolvedParam)> = Vec::new();
    resolved.push((DATA_PARAM.to_string(), scope.resolve(DATA_PARAM, None)?));
    for param in spec.parameters.iter().filter(|p| !swept.contains(&p.name)) {
      let value = scope.resolve(&param.name, param.default.as_ref())?;
      debug!(param = %param.name, source = ?value.source, "parameter resolved");
      resolved.push((param.name.clone(), value));
    }
    resolved
  };

  let data = resolved
    .first()
    .map(|(_, r)| r.value.clone())
    .unwrap_or_default();
  let params: BTreeMap<String, Value> = resolved
    .iter()
    .skip(1)
    .map(|(name, r)| (name.clone(), r.value.clone()))
    .collect();

  let out_channel = node.publish.out_channel().to_string();
  let pre_entry = state.channels.entry(&out_channel).cloned();
  let context_before = state.context.clone();

  let returned = processor
    .process(data.clone(), &params, &mut state.context)
    .await
    .map_err(|message| EirError::Processor {
      node_uuid: node.node_uuid.clone(),
      message,
    })?;

  let output = if spec.kind.is_pass_through() {
    data
  } else {
    returned.clone()
  };
  if let Some(key) = &node.publish.context_key {
    let published = match spec.kind {
      ProcessorKind::DataProbe => returned,
      _ => output.clone(),
    };
    state.context.insert(key.clone(), published);
  }

  let context_writes = detect_context_writes(&context_before, &state.context);
  for key in &context_writes {
    debug!(key = %key, "context write");
    state
      .context_producers
      .mark_written(key.clone(), ProducerRef::node(&node.node_uuid));
  }
  for key in removed_context_keys(&context_before, &state.context) {
    state.context_producers.forget(&key);
  }

  let input_channel = match node.bind_for(DATA_PARAM) {
    Some(SourceRef::Channel(name)) => Some(name.as_str()),
    _ => None,
  };
  let carried = pre_entry.filter(|entry| {
    spec.kind.is_pass_through()
      && input_channel == Some(out_channel.as_str())
      && entry.value == output
  });
  let output_producer = match carried {
    Some(entry) => entry.producer,
    None => ProducerRef::node(&node.node_uuid),
  };
  state.channels.set_entry(
    out_channel.clone(),
    ChannelEntry::new(output, output_producer.clone()),
  );
  if !state.channels.contains(PRIMARY_CHANNEL) {
    return Err(primary_missing());
  }

  let mut upstream: Vec<String> = Vec::new();
  for (_, r) in &resolved {
    let producer = r.source_ref.as_ref().and_then(|s| s.producer().node_uuid());
    if let Some(uuid) = producer.filter(|uuid| !upstream.iter().any(|u| u == uuid)) {
      upstream.push(uuid.to_string());
    }
  }

  Ok(NodeProvenance {
    step,
    node_uuid: node.node_uuid.clone(),
    processor_ref: node.processor_ref.clone(),
    params: resolved
      .into_iter()
      .map(|(name, r)| {
        (
          name,
          ParamRecord {
            value: to_lossy_json(&r.value),
            source: r.source,
            source_ref: r.source_ref,
          },
        )
      })
      .collect(),
    upstream,
    derived_upstream,
    context_writes,
    output_channel: out_channel,
    output_producer,
  })
}

fn primary_missing() -> EirError {
  EirError::resolution("Primary channel missing after publish; ensure a source populated it.")
}

fn now_rfc3339() -> String {
  Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
