//! One slot of the runtime channel store.

use serde::Serialize;

use super::{ProducerRef, Value};

/// Value held by a channel together with its producer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelEntry {
  pub value: Value,
  pub producer: ProducerRef,
}

impl ChannelEntry {
  pub fn new(value: Value, producer: ProducerRef) -> Self {
    Self { value, producer }
  }
}
