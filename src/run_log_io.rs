//! Run log save/load to a run directory (JSON).

use crate::types::RunLog;
use std::path::Path;
use tracing::instrument;

/// Default filename for the run log under a run directory.
pub const RUN_LOG_FILENAME: &str = "run.log.json";

/// Saves a run log to `path` as pretty JSON. Creates the parent directory if needed.
#[instrument(level = "trace", skip(path, log))]
pub fn save_run_log(path: &Path, log: &RunLog) -> Result<(), std::io::Error> {
  let json = serde_json::to_string_pretty(log)
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent)?;
  }
  std::fs::write(path, json)
}

/// Loads a run log from `path`. Returns error if file is missing or invalid JSON.
#[instrument(level = "trace", skip(path))]
pub fn load_run_log(path: &Path) -> Result<RunLog, std::io::Error> {
  let bytes = std::fs::read(path)?;
  serde_json::from_slice(&bytes)
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}
