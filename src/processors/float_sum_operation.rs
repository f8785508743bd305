//! Adds two float data inputs.

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::{FLOAT, builtin_fqn, float_data, float_param};
use crate::processor::{ProcessResult, Processor, ProcessorKind, ProcessorSpec};
use crate::types::{RunContext, Value};

/// `data + other`, where `other` is a second data slot usually bound to a channel.
pub struct FloatSumOperation;

impl FloatSumOperation {
  pub fn spec() -> ProcessorSpec {
    ProcessorSpec::new(builtin_fqn("FloatSumOperation"), ProcessorKind::DataOperation)
      .input(FLOAT)
      .output(FLOAT)
      .data_param("other", FLOAT)
  }
}

#[async_trait]
impl Processor for FloatSumOperation {
  async fn process(
    &self,
    data: Value,
    params: &BTreeMap<String, Value>,
    _context: &mut RunContext,
  ) -> ProcessResult {
    Ok(Value::Float(float_data(&data)? + float_param(params, "other")?))
  }
}
