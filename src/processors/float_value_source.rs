//! Source emitting a constant float.

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::{FLOAT, builtin_fqn, float_param};
use crate::processor::{ProcessResult, Processor, ProcessorKind, ProcessorSpec};
use crate::types::{RunContext, Value};

/// Emits parameter `value` as float data.
pub struct FloatValueSource;

impl FloatValueSource {
  pub fn spec() -> ProcessorSpec {
    ProcessorSpec::new(builtin_fqn("FloatValueSource"), ProcessorKind::DataSource)
      .output(FLOAT)
      .param("value")
  }
}

#[async_trait]
impl Processor for FloatValueSource {
  async fn process(
    &self,
    _data: Value,
    params: &BTreeMap<String, Value>,
    _context: &mut RunContext,
  ) -> ProcessResult {
    float_param(params, "value").map(Value::Float)
  }
}
