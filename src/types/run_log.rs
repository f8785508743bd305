//! DTOs for `run.log.json`: outcome and per-node provenance of one run.

use serde::{Deserialize, Serialize};

use super::NodeProvenance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
  Running,
  Succeeded,
  Failed,
}

/// Error recorded when a run fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunErrorRecord {
  /// Short kind tag (`resolution`, `processor`, ..).
  pub kind: String,
  pub message: String,
}

/// Root structure for `run.log.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLog {
  /// Log format version.
  pub version: u32,
  pub pipeline_id: String,
  pub eir_id: String,
  /// RFC 3339 timestamp when the run started.
  pub started_at: String,
  /// RFC 3339 timestamp when the run finished (None while running).
  pub finished_at: Option<String>,
  pub status: RunStatus,
  pub error: Option<RunErrorRecord>,
  /// Display rendering of the final primary channel.
  pub final_primary: Option<serde_json::Value>,
  pub steps: Vec<NodeProvenance>,
}

impl RunLog {
  pub fn new(pipeline_id: impl Into<String>, eir_id: impl Into<String>, started_at: impl Into<String>) -> Self {
    Self {
      version: 1,
      pipeline_id: pipeline_id.into(),
      eir_id: eir_id.into(),
      started_at: started_at.into(),
      finished_at: None,
      status: RunStatus::Running,
      error: None,
      final_primary: None,
      steps: Vec::new(),
    }
  }
}
