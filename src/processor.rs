//! Processor contract: the async trait concrete processors implement, their capability class,
//! and the static metadata the registry holds for each of them.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::types::{DATA_PARAM, DataType, InferredSlots, RunContext, SlotEntry, Value};

/// Outcome of one processor call. Errors are plain messages; the executor attaches the node.
pub type ProcessResult = std::result::Result<Value, String>;

/// Capability class of a processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessorKind {
  /// Transforms its input data into new data.
  DataOperation,
  /// Produces data, ignoring its input.
  DataSource,
  /// Inspects data; its result is written to `publish.context_key` when set.
  DataProbe,
  /// Consumes data without producing any.
  DataSink,
  /// Mutates the context only.
  ContextProcessor,
}

impl ProcessorKind {
  /// Non-transforming kinds forward their input unchanged and keep its producer.
  pub fn is_pass_through(&self) -> bool {
    matches!(
      self,
      ProcessorKind::DataProbe | ProcessorKind::DataSink | ProcessorKind::ContextProcessor
    )
  }
}

/// A processing parameter and its declared default.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
  pub name: String,
  pub default: Option<Value>,
}

/// A concrete processor.
///
/// `data` is the resolved `data` parameter, `params` the resolved processing parameters.
/// Context writes are detected by the executor; processors just mutate `context`.
#[async_trait]
pub trait Processor: Send + Sync {
  async fn process(
    &self,
    data: Value,
    params: &BTreeMap<String, Value>,
    context: &mut RunContext,
  ) -> ProcessResult;
}

/// Builds a fresh processor instance.
pub type ProcessorFactory = Arc<dyn Fn() -> Box<dyn Processor> + Send + Sync>;

/// Static metadata registered alongside a processor factory.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessorSpec {
  /// Fully-qualified name, e.g. `eir_pipeline::processors::FloatAddOperation`.
  pub fqn: String,
  pub kind: ProcessorKind,
  pub input_type: Option<DataType>,
  pub output_type: Option<DataType>,
  pub parameters: Vec<ParamSpec>,
  /// Extra typed data inputs besides `data` (e.g. a second operand).
  pub extra_inputs: Vec<(String, DataType)>,
  /// For registered derived processors: `{type, element_ref, ..}` construction metadata.
  pub derived: Option<Value>,
}

impl ProcessorSpec {
  pub fn new(fqn: impl Into<String>, kind: ProcessorKind) -> Self {
    Self {
      fqn: fqn.into(),
      kind,
      input_type: None,
      output_type: None,
      parameters: Vec::new(),
      extra_inputs: Vec::new(),
      derived: None,
    }
  }

  pub fn input(mut self, data_type: DataType) -> Self {
    self.input_type = Some(data_type);
    self
  }

  pub fn output(mut self, data_type: DataType) -> Self {
    self.output_type = Some(data_type);
    self
  }

  /// Required processing parameter.
  pub fn param(mut self, name: impl Into<String>) -> Self {
    self.parameters.push(ParamSpec {
      name: name.into(),
      default: None,
    });
    self
  }

  pub fn param_with_default(mut self, name: impl Into<String>, default: impl Into<Value>) -> Self {
    self.parameters.push(ParamSpec {
      name: name.into(),
      default: Some(default.into()),
    });
    self
  }

  /// Typed processing parameter that is also a data slot.
  pub fn data_param(mut self, name: impl Into<String>, data_type: DataType) -> Self {
    let name = name.into();
    self.parameters.push(ParamSpec {
      name: name.clone(),
      default: None,
    });
    self.extra_inputs.push((name, data_type));
    self
  }

  pub fn derived_from(mut self, payload: Value) -> Self {
    self.derived = Some(payload);
    self
  }

  /// Short name: the last `::` segment of the FQN.
  pub fn short_name(&self) -> &str {
    short_name_of(&self.fqn)
  }

  /// Input type, falling back to the output type when only one is declared.
  pub fn declared_io(&self) -> (Option<&DataType>, Option<&DataType>) {
    let input = self.input_type.as_ref();
    let output = self.output_type.as_ref().or(input);
    (input, output)
  }

  /// Data slots from declared descriptors: `data` first, then extra inputs in declaration order.
  pub fn inferred_slots(&self) -> InferredSlots {
    let mut inputs = Vec::new();
    // Sources take no data input.
    if let Some(t) = self.input_type.as_ref().filter(|_| self.kind != ProcessorKind::DataSource) {
      inputs.push(SlotEntry {
        name: DATA_PARAM.to_string(),
        type_name: t.name.to_string(),
      });
    }
    for (name, t) in &self.extra_inputs {
      inputs.push(SlotEntry {
        name: name.clone(),
        type_name: t.name.to_string(),
      });
    }
    InferredSlots {
      inputs,
      output: self.output_type.as_ref().map(|t| t.name.to_string()),
    }
  }
}

/// Last `::` segment of a path.
pub fn short_name_of(fqn: &str) -> &str {
  fqn.rsplit("::").next().unwrap_or(fqn)
}
