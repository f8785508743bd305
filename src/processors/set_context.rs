//! Context processor writing one key.

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::builtin_fqn;
use crate::processor::{ProcessResult, Processor, ProcessorKind, ProcessorSpec};
use crate::types::{RunContext, Value};

/// Sets context `key` to `value`. Data is untouched.
pub struct SetContext;

impl SetContext {
  pub fn spec() -> ProcessorSpec {
    ProcessorSpec::new(builtin_fqn("SetContext"), ProcessorKind::ContextProcessor)
      .param("key")
      .param("value")
  }
}

#[async_trait]
impl Processor for SetContext {
  async fn process(
    &self,
    data: Value,
    params: &BTreeMap<String, Value>,
    context: &mut RunContext,
  ) -> ProcessResult {
    let key = params
      .get("key")
      .and_then(Value::as_str)
      .filter(|k| !k.is_empty())
      .ok_or("parameter 'key' must be a non-empty string")?;
    let value = params.get("value").cloned().unwrap_or_default();
    context.insert(key.to_string(), value);
    Ok(data)
  }
}
