//! Declared data-type descriptors and payload-form classification.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Shape of a payload flowing between nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PayloadForm {
  #[default]
  Scalar,
  /// Multi-channel container.
  Channel,
  /// Bundle of parallel lanes.
  LaneBundle,
}

impl PayloadForm {
  pub fn as_str(&self) -> &'static str {
    match self {
      PayloadForm::Scalar => "scalar",
      PayloadForm::Channel => "channel",
      PayloadForm::LaneBundle => "lane_bundle",
    }
  }
}

impl fmt::Display for PayloadForm {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Declared input or output data type of a processor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataType {
  pub name: &'static str,
  pub form: PayloadForm,
}

impl DataType {
  pub const fn scalar(name: &'static str) -> Self {
    Self {
      name,
      form: PayloadForm::Scalar,
    }
  }

  pub const fn channel(name: &'static str) -> Self {
    Self {
      name,
      form: PayloadForm::Channel,
    }
  }

  pub const fn lane_bundle(name: &'static str) -> Self {
    Self {
      name,
      form: PayloadForm::LaneBundle,
    }
  }
}

/// Payload form of an optional declared type; undeclared types are scalar.
pub fn form_of(data_type: Option<&DataType>) -> PayloadForm {
  data_type.map(|t| t.form).unwrap_or_default()
}
