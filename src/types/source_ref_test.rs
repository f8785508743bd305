//! Tests for `SourceRef`.

use super::SourceRef;
use crate::error::EirError;

#[test]
fn unprefixed_defaults_to_channel() {
  assert_eq!(SourceRef::parse("addend").unwrap(), SourceRef::channel("addend"));
}

#[test]
fn prefixed_forms_parse() {
  assert_eq!(SourceRef::parse("channel:x").unwrap(), SourceRef::channel("x"));
  assert_eq!(SourceRef::parse("context:k").unwrap(), SourceRef::context("k"));
  assert!(SourceRef::parse("channel:primary").unwrap().is_primary());
}

#[test]
fn display_is_canonical() {
  assert_eq!(SourceRef::parse("y").unwrap().to_string(), "channel:y");
  assert_eq!(SourceRef::context("k").to_string(), "context:k");
}

#[test]
fn rejects_empty_and_unknown_prefixes() {
  for raw in ["", "channel:", "context:", "lane:x"] {
    match SourceRef::parse(raw) {
      Err(EirError::Configuration(_)) => {}
      other => panic!("expected configuration error for {:?}, got {:?}", raw, other),
    }
  }
}

#[test]
fn serializes_as_string() {
  let json = serde_json::to_string(&SourceRef::context("gain")).unwrap();
  assert_eq!(json, "\"context:gain\"");
  let back: SourceRef = serde_json::from_str("\"out2\"").unwrap();
  assert_eq!(back, SourceRef::channel("out2"));
}
