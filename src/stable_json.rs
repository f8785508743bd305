//! Stable JSON encoding used wherever an identity hash is computed.
//!
//! Contract: object keys sorted by code point, compact separators, UTF-8 output without ASCII
//! escaping, and non-finite floats rejected. No fallback encoding: a value that cannot be
//! encoded is an error.

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::instrument;

use crate::error::{EirError, Result};
use crate::types::Value;

/// Returns the stable JSON text of `value`.
#[instrument(level = "trace", skip(value))]
pub fn to_stable_string<T: Serialize + ?Sized>(value: &T) -> Result<String> {
  let json = serde_json::to_value(value).map_err(|e| EirError::StableJson(e.to_string()))?;
  let mut out = String::new();
  write_sorted(&json, &mut out)?;
  Ok(out)
}

/// UTF-8 bytes of [to_stable_string].
pub fn to_stable_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
  to_stable_string(value).map(String::into_bytes)
}

/// Lowercase hex SHA-256 of raw bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(bytes);
  format!("{:x}", hasher.finalize())
}

/// Lowercase hex SHA-256 of the stable JSON encoding of `value`.
pub fn stable_digest<T: Serialize + ?Sized>(value: &T) -> Result<String> {
  Ok(sha256_hex(&to_stable_bytes(value)?))
}

fn write_sorted(value: &serde_json::Value, out: &mut String) -> Result<()> {
  match value {
    serde_json::Value::Null => out.push_str("null"),
    serde_json::Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
    serde_json::Value::Number(n) => {
      if n.as_f64().is_some_and(|f| !f.is_finite()) {
        return Err(EirError::StableJson(format!("non-finite number {n}")));
      }
      out.push_str(&n.to_string());
    }
    serde_json::Value::String(s) => write_string(s, out)?,
    serde_json::Value::Array(items) => {
      out.push('[');
      for (i, item) in items.iter().enumerate() {
        if i > 0 {
          out.push(',');
        }
        write_sorted(item, out)?;
      }
      out.push(']');
    }
    serde_json::Value::Object(map) => {
      let mut keys: Vec<&String> = map.keys().collect();
      keys.sort();
      out.push('{');
      for (i, key) in keys.into_iter().enumerate() {
        if i > 0 {
          out.push(',');
        }
        write_string(key, out)?;
        out.push(':');
        write_sorted(&map[key.as_str()], out)?;
      }
      out.push('}');
    }
  }
  Ok(())
}

fn write_string(s: &str, out: &mut String) -> Result<()> {
  let quoted = serde_json::to_string(s).map_err(|e| EirError::StableJson(e.to_string()))?;
  out.push_str(&quoted);
  Ok(())
}

/// Best-effort JSON rendering of a value for display and source fingerprints only.
///
/// Non-finite floats become tagged strings instead of failing. Two different values may map to
/// the same rendering, so the result must never feed an identity hash.
pub fn to_lossy_json(value: &Value) -> serde_json::Value {
  match value {
    Value::Float(f) if !f.is_finite() => serde_json::Value::String(format!("unserializable:float:{f}")),
    Value::Seq(items) => serde_json::Value::Array(items.iter().map(to_lossy_json).collect()),
    Value::Map(m) => serde_json::Value::Object(
      m.iter()
        .map(|(k, v)| (k.clone(), to_lossy_json(v)))
        .collect(),
    ),
    other => serde_json::to_value(other).unwrap_or(serde_json::Value::Null),
  }
}
