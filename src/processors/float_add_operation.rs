//! Adds a constant to float data.

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::{FLOAT, builtin_fqn, float_data, float_param};
use crate::processor::{ProcessResult, Processor, ProcessorKind, ProcessorSpec};
use crate::types::{RunContext, Value};

/// `data + addend`.
pub struct FloatAddOperation;

impl FloatAddOperation {
  pub fn spec() -> ProcessorSpec {
    ProcessorSpec::new(builtin_fqn("FloatAddOperation"), ProcessorKind::DataOperation)
      .input(FLOAT)
      .output(FLOAT)
      .param("addend")
  }
}

#[async_trait]
impl Processor for FloatAddOperation {
  async fn process(
    &self,
    data: Value,
    params: &BTreeMap<String, Value>,
    _context: &mut RunContext,
  ) -> ProcessResult {
    Ok(Value::Float(float_data(&data)? + float_param(params, "addend")?))
  }
}
