//! Scales float data.

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::{FLOAT, builtin_fqn, float_data, float_param};
use crate::processor::{ProcessResult, Processor, ProcessorKind, ProcessorSpec};
use crate::types::{RunContext, Value};

/// `data * factor`; `factor` defaults to 1.
pub struct FloatMultiplyOperation;

impl FloatMultiplyOperation {
  pub fn spec() -> ProcessorSpec {
    ProcessorSpec::new(builtin_fqn("FloatMultiplyOperation"), ProcessorKind::DataOperation)
      .input(FLOAT)
      .output(FLOAT)
      .param_with_default("factor", 1.0)
  }
}

#[async_trait]
impl Processor for FloatMultiplyOperation {
  async fn process(
    &self,
    data: Value,
    params: &BTreeMap<String, Value>,
    _context: &mut RunContext,
  ) -> ProcessResult {
    Ok(Value::Float(float_data(&data)? * float_param(params, "factor")?))
  }
}
