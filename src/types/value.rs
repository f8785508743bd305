//! Closed tagged value used for node parameters, context entries and channel payloads.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{Error as _, SerializeMap};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Key under which [OpaqueRef] values are encoded in JSON.
pub const OPAQUE_KEY: &str = "$opaque";

/// Reference to a value that cannot be represented structurally (a handle, a file, a model).
///
/// Only the type tag and the reference string participate in serialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OpaqueRef {
  pub type_tag: String,
  pub reference: String,
}

/// Parameter / context / channel value.
///
/// Mappings are key-sorted, so two values built from differently ordered sources compare and
/// serialize identically.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
  #[default]
  Null,
  Bool(bool),
  Int(i64),
  Float(f64),
  Str(String),
  Seq(Vec<Value>),
  Map(BTreeMap<String, Value>),
  Opaque(OpaqueRef),
}

impl Value {
  pub fn opaque(type_tag: impl Into<String>, reference: impl Into<String>) -> Self {
    Value::Opaque(OpaqueRef {
      type_tag: type_tag.into(),
      reference: reference.into(),
    })
  }

  pub fn is_null(&self) -> bool {
    matches!(self, Value::Null)
  }

  /// Numeric view; integers widen to `f64`.
  pub fn as_f64(&self) -> Option<f64> {
    match self {
      Value::Int(i) => Some(*i as f64),
      Value::Float(f) => Some(*f),
      _ => None,
    }
  }

  pub fn as_i64(&self) -> Option<i64> {
    match self {
      Value::Int(i) => Some(*i),
      _ => None,
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Value::Str(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
    match self {
      Value::Map(m) => Some(m),
      _ => None,
    }
  }

  pub fn as_seq(&self) -> Option<&[Value]> {
    match self {
      Value::Seq(s) => Some(s),
      _ => None,
    }
  }

  /// Looks up `key` when this value is a mapping.
  pub fn get(&self, key: &str) -> Option<&Value> {
    self.as_map().and_then(|m| m.get(key))
  }

  /// Kind name used in error messages.
  pub fn type_name(&self) -> &'static str {
    match self {
      Value::Null => "null",
      Value::Bool(_) => "bool",
      Value::Int(_) => "int",
      Value::Float(_) => "float",
      Value::Str(_) => "string",
      Value::Seq(_) => "sequence",
      Value::Map(_) => "mapping",
      Value::Opaque(_) => "opaque",
    }
  }

  /// True when no float anywhere in the value is NaN or infinite.
  pub fn is_finite(&self) -> bool {
    match self {
      Value::Float(f) => f.is_finite(),
      Value::Seq(items) => items.iter().all(Value::is_finite),
      Value::Map(m) => m.values().all(Value::is_finite),
      _ => true,
    }
  }
}

impl Serialize for Value {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    match self {
      Value::Null => serializer.serialize_unit(),
      Value::Bool(b) => serializer.serialize_bool(*b),
      Value::Int(i) => serializer.serialize_i64(*i),
      Value::Float(f) => {
        if !f.is_finite() {
          return Err(S::Error::custom(format!(
            "non-finite float {f} is not representable in strict JSON"
          )));
        }
        serializer.serialize_f64(*f)
      }
      Value::Str(s) => serializer.serialize_str(s),
      Value::Seq(items) => items.serialize(serializer),
      Value::Map(m) => m.serialize(serializer),
      Value::Opaque(o) => {
        let mut inner = BTreeMap::new();
        inner.insert("ref", o.reference.as_str());
        inner.insert("type", o.type_tag.as_str());
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(OPAQUE_KEY, &inner)?;
        map.end()
      }
    }
  }
}

impl<'de> Deserialize<'de> for Value {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    deserializer.deserialize_any(ValueVisitor)
  }
}

/// Builds a [Value] from any self-describing format. Floats are kept as read, including
/// non-finite ones, so the strict encoder can reject them later.
struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
  type Value = Value;

  fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str("a null, bool, number, string, sequence or mapping")
  }

  fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
    Ok(Value::Null)
  }

  fn visit_none<E: de::Error>(self) -> Result<Value, E> {
    Ok(Value::Null)
  }

  fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
    Value::deserialize(deserializer)
  }

  fn visit_bool<E: de::Error>(self, b: bool) -> Result<Value, E> {
    Ok(Value::Bool(b))
  }

  fn visit_i64<E: de::Error>(self, i: i64) -> Result<Value, E> {
    Ok(Value::Int(i))
  }

  fn visit_u64<E: de::Error>(self, u: u64) -> Result<Value, E> {
    Ok(match i64::try_from(u) {
      Ok(i) => Value::Int(i),
      Err(_) => Value::Float(u as f64),
    })
  }

  fn visit_f64<E: de::Error>(self, f: f64) -> Result<Value, E> {
    Ok(Value::Float(f))
  }

  fn visit_str<E: de::Error>(self, s: &str) -> Result<Value, E> {
    Ok(Value::Str(s.to_string()))
  }

  fn visit_string<E: de::Error>(self, s: String) -> Result<Value, E> {
    Ok(Value::Str(s))
  }

  fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
    let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
    while let Some(item) = seq.next_element::<Value>()? {
      items.push(item);
    }
    Ok(Value::Seq(items))
  }

  fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Value, A::Error> {
    let mut map = BTreeMap::new();
    while let Some((key, value)) = access.next_entry::<String, Value>()? {
      map.insert(key, value);
    }
    Ok(opaque_from_map(&map).unwrap_or(Value::Map(map)))
  }
}

/// Recognizes `{"$opaque": {"type": .., "ref": ..}}`.
fn opaque_from_map(map: &BTreeMap<String, Value>) -> Option<Value> {
  if map.len() != 1 {
    return None;
  }
  let inner = map.get(OPAQUE_KEY)?.as_map()?;
  let type_tag = inner.get("type")?.as_str()?;
  let reference = inner.get("ref")?.as_str()?;
  Some(Value::opaque(type_tag, reference))
}

impl From<serde_json::Value> for Value {
  fn from(v: serde_json::Value) -> Self {
    match v {
      serde_json::Value::Null => Value::Null,
      serde_json::Value::Bool(b) => Value::Bool(b),
      serde_json::Value::Number(n) => match n.as_i64() {
        Some(i) => Value::Int(i),
        None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
      },
      serde_json::Value::String(s) => Value::Str(s),
      serde_json::Value::Array(items) => Value::Seq(items.into_iter().map(Value::from).collect()),
      serde_json::Value::Object(map) => {
        if let Some(opaque) = opaque_from_json(&map) {
          return opaque;
        }
        Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
      }
    }
  }
}

/// Recognizes `{"$opaque": {"type": .., "ref": ..}}`.
fn opaque_from_json(map: &serde_json::Map<String, serde_json::Value>) -> Option<Value> {
  if map.len() != 1 {
    return None;
  }
  let inner = map.get(OPAQUE_KEY)?.as_object()?;
  let type_tag = inner.get("type")?.as_str()?;
  let reference = inner.get("ref")?.as_str()?;
  Some(Value::opaque(type_tag, reference))
}

impl From<bool> for Value {
  fn from(b: bool) -> Self {
    Value::Bool(b)
  }
}

impl From<i64> for Value {
  fn from(i: i64) -> Self {
    Value::Int(i)
  }
}

impl From<i32> for Value {
  fn from(i: i32) -> Self {
    Value::Int(i64::from(i))
  }
}

impl From<f64> for Value {
  fn from(f: f64) -> Self {
    Value::Float(f)
  }
}

impl From<&str> for Value {
  fn from(s: &str) -> Self {
    Value::Str(s.to_string())
  }
}

impl From<String> for Value {
  fn from(s: String) -> Self {
    Value::Str(s)
  }
}

impl From<Vec<Value>> for Value {
  fn from(items: Vec<Value>) -> Self {
    Value::Seq(items)
  }
}

impl From<BTreeMap<String, Value>> for Value {
  fn from(m: BTreeMap<String, Value>) -> Self {
    Value::Map(m)
  }
}
