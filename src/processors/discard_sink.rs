//! Sink that accepts any data and keeps nothing.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::debug;

use super::builtin_fqn;
use crate::processor::{ProcessResult, Processor, ProcessorKind, ProcessorSpec};
use crate::types::{RunContext, Value};

pub struct DiscardSink;

impl DiscardSink {
  pub fn spec() -> ProcessorSpec {
    ProcessorSpec::new(builtin_fqn("DiscardSink"), ProcessorKind::DataSink)
  }
}

#[async_trait]
impl Processor for DiscardSink {
  async fn process(
    &self,
    data: Value,
    _params: &BTreeMap<String, Value>,
    _context: &mut RunContext,
  ) -> ProcessResult {
    debug!(kind = data.type_name(), "discarding data");
    Ok(Value::Null)
  }
}
