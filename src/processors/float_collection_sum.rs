//! Reduces a float sequence to its sum.

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::{FLOAT, FLOAT_COLLECTION, builtin_fqn, float_data};
use crate::processor::{ProcessResult, Processor, ProcessorKind, ProcessorSpec};
use crate::types::{RunContext, Value};

pub struct FloatCollectionSumOperation;

impl FloatCollectionSumOperation {
  pub fn spec() -> ProcessorSpec {
    ProcessorSpec::new(
      builtin_fqn("FloatCollectionSumOperation"),
      ProcessorKind::DataOperation,
    )
    .input(FLOAT_COLLECTION)
    .output(FLOAT)
  }
}

#[async_trait]
impl Processor for FloatCollectionSumOperation {
  async fn process(
    &self,
    data: Value,
    _params: &BTreeMap<String, Value>,
    _context: &mut RunContext,
  ) -> ProcessResult {
    let items = data
      .as_seq()
      .ok_or_else(|| format!("expected a float sequence, got {}", data.type_name()))?;
    let mut total = 0.0;
    for item in items {
      total += float_data(item)?;
    }
    Ok(Value::Float(total))
  }
}
