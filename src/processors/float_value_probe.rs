//! Probe reporting the current float value.

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::{FLOAT, builtin_fqn, float_data};
use crate::processor::{ProcessResult, Processor, ProcessorKind, ProcessorSpec};
use crate::types::{RunContext, Value};

/// Returns the input value as its probe result; the data itself flows through unchanged.
pub struct FloatValueProbe;

impl FloatValueProbe {
  pub fn spec() -> ProcessorSpec {
    ProcessorSpec::new(builtin_fqn("FloatValueProbe"), ProcessorKind::DataProbe).input(FLOAT)
  }
}

#[async_trait]
impl Processor for FloatValueProbe {
  async fn process(
    &self,
    data: Value,
    _params: &BTreeMap<String, Value>,
    _context: &mut RunContext,
  ) -> ProcessResult {
    float_data(&data).map(Value::Float)
  }
}
