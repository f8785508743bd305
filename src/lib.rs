//! # eir-pipeline
//!
//! Compiles declarative pipeline specs into a versioned, content-addressed intermediate
//! representation (the EIR document) and executes it over named payload channels with full
//! provenance tracking.
//!
//! ## Architecture
//!
//! Compilation is a chain of pure stages:
//!
//! spec → [canonicalize] (node_uuid, bind/publish defaults) → [derived_edges] (topology
//! checks) → [compiler] (payload forms, slots, `pipeline_id` / `pipeline_variant_id` /
//! `eir_id`).
//!
//! Execution ([runner]) walks the plan in order, resolving each parameter through
//! [resolver] against the [channel_store], and records per-node provenance for
//! [trace_sink]s and the run log.

pub mod bind_publish;
pub mod canonicalize;
#[cfg(test)]
mod canonicalize_test;
pub mod channel_store;
#[cfg(test)]
mod channel_store_test;
pub mod compiler;
pub mod derived_edges;
pub mod error;
pub mod identity;
#[cfg(test)]
mod identity_test;
pub mod processor;
pub mod processors;
pub mod registry;
pub mod resolver;
#[cfg(test)]
mod resolver_test;
pub mod run_log_io;
pub mod runner;
pub mod spec_loader;
pub mod stable_json;
pub mod trace_sink;
pub mod types;
pub mod validation;

pub use compiler::{CompileOptions, compile_eir};
pub use error::{EirError, Result, SchemaError, SymbolError};
pub use processor::{Processor, ProcessorKind, ProcessorSpec};
pub use registry::Registry;
pub use runner::{RunFailure, RunOptions, RunOutcome, RunState, run_eir};
pub use spec_loader::{PipelineSpec, load_pipeline_spec};
pub use trace_sink::{MemoryTraceSink, NullTraceSink, TraceSink};
pub use types::{EirDocument, RunContext, Value};
