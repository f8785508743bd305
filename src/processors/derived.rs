//! Runtime wrappers for derived processors: parameter sweeps and per-element slices.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::{EirError, Result};
use crate::processor::{ProcessResult, Processor};
use crate::types::{RunContext, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SweepMode {
  Product,
  Zip,
}

/// Runs the element once per variable assignment and returns the sequence of outputs.
pub struct ParameterSweep {
  element: Box<dyn Processor>,
  /// Variables in key order.
  variables: Vec<(String, Vec<Value>)>,
  mode: SweepMode,
}

impl ParameterSweep {
  /// Builds a sweep from a normalized `parameter_sweep` payload.
  pub fn from_payload(payload: &Value, element: Box<dyn Processor>) -> Result<Self> {
    let variables = payload
      .get("variables")
      .and_then(Value::as_map)
      .ok_or_else(|| EirError::config("parameter_sweep payload has no variables mapping"))?
      .iter()
      .map(|(name, values)| {
        values
          .as_seq()
          .map(|items| (name.clone(), items.to_vec()))
          .ok_or_else(|| {
            EirError::config(format!("parameter_sweep variable '{}' is not a list", name))
          })
      })
      .collect::<Result<Vec<_>>>()?;
    let mode = match payload.get("mode").and_then(Value::as_str) {
      None | Some("product") => SweepMode::Product,
      Some("zip") => SweepMode::Zip,
      Some(other) => {
        return Err(EirError::config(format!(
          "unknown parameter_sweep mode '{}'",
          other
        )));
      }
    };
    Ok(Self {
      element,
      variables,
      mode,
    })
  }

  /// Assignments in sweep order. Product: the last variable varies fastest.
  pub fn assignments(&self) -> Vec<BTreeMap<String, Value>> {
    match self.mode {
      SweepMode::Zip => {
        let len = self
          .variables
          .iter()
          .map(|(_, v)| v.len())
          .min()
          .unwrap_or(0);
        (0..len)
          .map(|i| {
            self
              .variables
              .iter()
              .map(|(name, values)| (name.clone(), values[i].clone()))
              .collect()
          })
          .collect()
      }
      SweepMode::Product => {
        let mut out = vec![BTreeMap::new()];
        for (name, values) in &self.variables {
          out = out
            .into_iter()
            .flat_map(|partial: BTreeMap<String, Value>| {
              values.iter().map(move |v| {
                let mut next = partial.clone();
                next.insert(name.clone(), v.clone());
                next
              })
            })
            .collect();
        }
        out
      }
    }
  }
}

#[async_trait]
impl Processor for ParameterSweep {
  async fn process(
    &self,
    data: Value,
    params: &BTreeMap<String, Value>,
    context: &mut RunContext,
  ) -> ProcessResult {
    let mut outputs = Vec::new();
    for assignment in self.assignments() {
      let mut merged = params.clone();
      merged.extend(assignment);
      outputs.push(self.element.process(data.clone(), &merged, context).await?);
    }
    Ok(Value::Seq(outputs))
  }
}

/// Maps the element over every item of a sequence input.
pub struct Slice {
  element: Box<dyn Processor>,
}

impl Slice {
  pub fn new(element: Box<dyn Processor>) -> Self {
    Self { element }
  }
}

#[async_trait]
impl Processor for Slice {
  async fn process(
    &self,
    data: Value,
    params: &BTreeMap<String, Value>,
    context: &mut RunContext,
  ) -> ProcessResult {
    let Value::Seq(items) = data else {
      return Err(format!("slice expects a sequence input, got {}", data.type_name()));
    };
    let mut outputs = Vec::with_capacity(items.len());
    for item in items {
      outputs.push(self.element.process(item, params, context).await?);
    }
    Ok(Value::Seq(outputs))
  }
}

/// Wraps `element` according to a normalized `derive` payload.
pub fn wrap_derived(derive: &Value, element: Box<dyn Processor>) -> Result<Box<dyn Processor>> {
  if let Some(payload) = derive.get("parameter_sweep") {
    return Ok(Box::new(ParameterSweep::from_payload(payload, element)?));
  }
  if derive.get("slice").is_some() {
    return Ok(Box::new(Slice::new(element)));
  }
  Err(EirError::config(
    "derive must contain exactly one of 'parameter_sweep' or 'slice'",
  ))
}

/// Parameters supplied by a sweep rather than by resolution.
pub fn sweep_variable_names(derive: &Value) -> Vec<String> {
  derive
    .get("parameter_sweep")
    .and_then(|p| p.get("variables"))
    .and_then(Value::as_map)
    .map(|vars| vars.keys().cloned().collect())
    .unwrap_or_default()
}
