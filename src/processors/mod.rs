//! Built-in float processors and the derived-processor wrappers.
//!
//! The float set is small on purpose: it is enough to author and run real pipelines from the
//! CLI and the end-to-end tests.

mod derived;
mod discard_sink;
mod float_add_operation;
mod float_collection_sum;
mod float_multiply_operation;
#[cfg(test)]
mod float_operations_test;
mod float_sum_operation;
mod float_value_probe;
mod float_value_source;
mod set_context;

pub use derived::{ParameterSweep, Slice, sweep_variable_names, wrap_derived};
pub use discard_sink::DiscardSink;
pub use float_add_operation::FloatAddOperation;
pub use float_collection_sum::FloatCollectionSumOperation;
pub use float_multiply_operation::FloatMultiplyOperation;
pub use float_sum_operation::FloatSumOperation;
pub use float_value_probe::FloatValueProbe;
pub use float_value_source::FloatValueSource;
pub use set_context::SetContext;

use std::collections::BTreeMap;

use crate::registry::Registry;
use crate::types::{DataType, Value};

/// Path prefix of built-in processor names.
pub const BUILTIN_PREFIX: &str = "eir_pipeline::processors";

pub const FLOAT: DataType = DataType::scalar("FloatDataType");
pub const FLOAT_COLLECTION: DataType = DataType::scalar("FloatDataCollection");

/// Fully-qualified name of a built-in processor.
pub fn builtin_fqn(name: &str) -> String {
  format!("{}::{}", BUILTIN_PREFIX, name)
}

/// Registers every built-in processor.
pub fn register_builtins(registry: &mut Registry) {
  registry.register(FloatValueSource::spec(), || Box::new(FloatValueSource));
  registry.register(FloatAddOperation::spec(), || Box::new(FloatAddOperation));
  registry.register(FloatMultiplyOperation::spec(), || Box::new(FloatMultiplyOperation));
  registry.register(FloatSumOperation::spec(), || Box::new(FloatSumOperation));
  registry.register(FloatCollectionSumOperation::spec(), || {
    Box::new(FloatCollectionSumOperation)
  });
  registry.register(FloatValueProbe::spec(), || Box::new(FloatValueProbe));
  registry.register(DiscardSink::spec(), || Box::new(DiscardSink));
  registry.register(SetContext::spec(), || Box::new(SetContext));
}

/// Numeric view of the input data.
pub(crate) fn float_data(data: &Value) -> Result<f64, String> {
  data
    .as_f64()
    .ok_or_else(|| format!("expected float data, got {}", data.type_name()))
}

/// Numeric view of a resolved parameter.
pub(crate) fn float_param(params: &BTreeMap<String, Value>, name: &str) -> Result<f64, String> {
  match params.get(name) {
    Some(v) => v
      .as_f64()
      .ok_or_else(|| format!("parameter '{}' must be a number, got {}", name, v.type_name())),
    None => Err(format!("parameter '{}' was not resolved", name)),
  }
}
