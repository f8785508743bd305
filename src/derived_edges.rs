//! Derived dependency edges from bind/publish topology.
//!
//! Pure and deterministic over the canonical node list. Edges are informational and never
//! enter an identity hash, but topology violations found here are fatal.

use std::collections::{BTreeMap, BTreeSet};

use tracing::instrument;

use crate::error::{EirError, Result};
use crate::types::{CanonicalNode, DEFAULT_OUTPUT_SLOT, DerivedEdge, PRIMARY_CHANNEL, SourceRef};

/// Producer of a named channel: node, output slot and declaration position.
struct ChannelProducer<'a> {
  node_uuid: &'a str,
  output_slot: &'a str,
  index: usize,
}

/// Derives edges in declaration order. Each node registers its published channels before its
/// binds are visited, and binds within a node are visited in parameter order.
///
/// A bind to a channel that only a later node publishes is reported as out of order rather
/// than missing.
///
/// Errors: a second writer of a non-primary channel, a bind to a channel nobody publishes, or a
/// producer that does not precede its consumer.
#[instrument(level = "trace", skip(nodes))]
pub fn derive_edges(nodes: &[CanonicalNode]) -> Result<Vec<DerivedEdge>> {
  let published: BTreeSet<&str> = nodes
    .iter()
    .flat_map(|n| n.publish.channels.values())
    .map(String::as_str)
    .filter(|c| *c != PRIMARY_CHANNEL)
    .collect();
  let mut producers: BTreeMap<&str, ChannelProducer<'_>> = BTreeMap::new();
  let mut edges = Vec::new();
  let mut previous: Option<&str> = None;

  for (index, node) in nodes.iter().enumerate() {
    register_producers(&mut producers, node, index)?;

    for (param, source) in &node.bind {
      let channel = match source {
        SourceRef::Context(_) => continue,
        SourceRef::Channel(name) => name,
      };
      if source.is_primary() {
        if let Some(prev) = previous {
          edges.push(DerivedEdge {
            source_node_uuid: prev.to_string(),
            target_node_uuid: node.node_uuid.clone(),
            target_param: param.clone(),
            source_ref: source.clone(),
            source_output_slot: None,
          });
        }
        continue;
      }
      let producer = match producers.get(channel.as_str()) {
        Some(producer) if producer.index < index => producer,
        None if !published.contains(channel.as_str()) => {
          return Err(EirError::topology(format!(
            "Missing producer for channel '{}' (node {}, param {}).",
            channel, node.node_uuid, param
          )));
        }
        _ => {
          return Err(EirError::topology(format!(
            "Producer must precede consumer for channel '{}'.",
            channel
          )));
        }
      };
      edges.push(DerivedEdge {
        source_node_uuid: producer.node_uuid.to_string(),
        target_node_uuid: node.node_uuid.clone(),
        target_param: param.clone(),
        source_ref: source.clone(),
        source_output_slot: (producer.output_slot != DEFAULT_OUTPUT_SLOT)
          .then(|| producer.output_slot.to_string()),
      });
    }

    previous = Some(&node.node_uuid);
  }
  Ok(edges)
}

/// Records `node` as the single writer of each non-primary channel it publishes.
fn register_producers<'a>(
  producers: &mut BTreeMap<&'a str, ChannelProducer<'a>>,
  node: &'a CanonicalNode,
  index: usize,
) -> Result<()> {
  for (slot, channel) in &node.publish.channels {
    if channel == PRIMARY_CHANNEL {
      continue;
    }
    if let Some(existing) = producers.get(channel.as_str()) {
      return Err(EirError::topology(format!(
        "Channel '{}' has multiple writers: {} (idx={}) and {} (idx={}).",
        channel, existing.node_uuid, existing.index, node.node_uuid, index
      )));
    }
    producers.insert(
      channel.as_str(),
      ChannelProducer {
        node_uuid: &node.node_uuid,
        output_slot: slot,
        index,
      },
    );
  }
  Ok(())
}

/// `node_uuid → sorted upstream node_uuids`; every node appears, possibly with no upstream.
pub fn compute_upstream_map(
  nodes: &[CanonicalNode],
  edges: &[DerivedEdge],
) -> BTreeMap<String, Vec<String>> {
  let mut upstream: BTreeMap<String, BTreeSet<String>> = nodes
    .iter()
    .map(|n| (n.node_uuid.clone(), BTreeSet::new()))
    .collect();
  for edge in edges {
    upstream
      .entry(edge.target_node_uuid.clone())
      .or_default()
      .insert(edge.source_node_uuid.clone());
  }
  upstream
    .into_iter()
    .map(|(node, sources)| (node, sources.into_iter().collect()))
    .collect()
}
