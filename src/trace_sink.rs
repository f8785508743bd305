//! Trace sinks: receivers of per-node provenance records and the final run log.

use std::sync::Mutex;

use crate::types::{NodeProvenance, RunLog};

/// Receives one record per executed node and the run log once the run ends.
pub trait TraceSink: Send + Sync {
  fn on_node(&self, record: &NodeProvenance);

  fn on_run_end(&self, _log: &RunLog) {}
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct NullTraceSink;

impl TraceSink for NullTraceSink {
  fn on_node(&self, _record: &NodeProvenance) {}
}

/// Collects records in memory.
#[derive(Debug, Default)]
pub struct MemoryTraceSink {
  records: Mutex<Vec<NodeProvenance>>,
  run_log: Mutex<Option<RunLog>>,
}

impl MemoryTraceSink {
  pub fn new() -> Self {
    Self::default()
  }

  /// Node records received so far, in execution order.
  pub fn records(&self) -> Vec<NodeProvenance> {
    self
      .records
      .lock()
      .map(|r| r.clone())
      .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
  }

  /// The run log, once the run has ended.
  pub fn run_log(&self) -> Option<RunLog> {
    self
      .run_log
      .lock()
      .map(|l| l.clone())
      .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
  }
}

impl TraceSink for MemoryTraceSink {
  fn on_node(&self, record: &NodeProvenance) {
    let mut records = self.records.lock().unwrap_or_else(|p| p.into_inner());
    records.push(record.clone());
  }

  fn on_run_end(&self, log: &RunLog) {
    let mut slot = self.run_log.lock().unwrap_or_else(|p| p.into_inner());
    *slot = Some(log.clone());
  }
}
