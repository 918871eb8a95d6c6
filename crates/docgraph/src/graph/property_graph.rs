//! In-memory property graph with adjacency indexes.

use super::property::PropertyMap;
use super::types::{Direction, Edge, EdgeId, Node, NodeId};
use crate::error::{GraphError, Result};
use log::debug;
use std::collections::{BTreeMap, BTreeSet};

/// A labelled property graph held entirely in memory.
///
/// Nodes and edges are kept in id order, so scans and neighbor lookups are
/// deterministic. The graph is `Clone` so callers can stage a batch of
/// mutations on a copy and swap it in only when the whole batch succeeds.
#[derive(Debug, Clone, Default)]
pub struct PropertyGraph {
    // Node and edge counters for monotonic ID generation
    node_counter: NodeId,
    edge_counter: EdgeId,
    nodes: BTreeMap<NodeId, Node>,
    edges: BTreeMap<EdgeId, Edge>,
    // Adjacency indexes for neighbor lookups
    adjacency_out: BTreeMap<NodeId, BTreeSet<EdgeId>>,
    adjacency_in: BTreeMap<NodeId, BTreeSet<EdgeId>>,
}

impl PropertyGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node to the graph and return its assigned ID.
    pub fn add_node(&mut self, label: Option<String>, properties: PropertyMap) -> NodeId {
        let node_id = self.next_node_id();
        debug!("Adding node: id={node_id}, label={label:?}");
        self.nodes
            .insert(node_id, Node::new(node_id, label, properties));
        node_id
    }

    /// Get a node by ID.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidOperation`] if the node doesn't exist.
    pub fn get_node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(&id).ok_or_else(|| GraphError::InvalidOperation {
            message: format!("node {id} does not exist"),
        })
    }

    /// Look a node up without treating absence as an error.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Iterate over all nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Find nodes carrying `label` (when given) and every property in `properties`.
    pub fn find_nodes<'a>(
        &'a self,
        label: Option<&'a str>,
        properties: &'a PropertyMap,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.nodes
            .values()
            .filter(move |node| label.map_or(true, |l| node.has_label(l)))
            .filter(move |node| node.properties.contains_all(properties))
            .map(|node| node.id)
    }

    /// Add a typed edge from `source_id` to `target_id`.
    ///
    /// # Errors
    ///
    /// Returns error if either endpoint doesn't exist.
    pub fn add_edge(
        &mut self,
        source_id: NodeId,
        target_id: NodeId,
        edge_type: impl Into<String>,
    ) -> Result<EdgeId> {
        let edge_type = edge_type.into();
        debug!("Adding edge: source={source_id}, target={target_id}, type={edge_type}");
        self.get_node(source_id)?;
        self.get_node(target_id)?;

        let edge_id = self.next_edge_id();
        self.adjacency_out
            .entry(source_id)
            .or_default()
            .insert(edge_id);
        self.adjacency_in
            .entry(target_id)
            .or_default()
            .insert(edge_id);
        self.edges
            .insert(edge_id, Edge::new(edge_id, source_id, target_id, edge_type));

        Ok(edge_id)
    }

    /// Neighbors of `node_id` reachable over edges in `direction`, optionally
    /// restricted to one edge type.
    ///
    /// Returns `(edge_id, neighbor_id)` pairs in edge id order. An edge that
    /// loops back to `node_id` is reported once even for [`Direction::Both`].
    pub fn neighbors(
        &self,
        node_id: NodeId,
        direction: Direction,
        edge_type: Option<&str>,
    ) -> Vec<(EdgeId, NodeId)> {
        let mut edge_ids: BTreeSet<EdgeId> = BTreeSet::new();
        if matches!(direction, Direction::Outgoing | Direction::Both) {
            if let Some(out_edges) = self.adjacency_out.get(&node_id) {
                edge_ids.extend(out_edges.iter().copied());
            }
        }
        if matches!(direction, Direction::Incoming | Direction::Both) {
            if let Some(in_edges) = self.adjacency_in.get(&node_id) {
                edge_ids.extend(in_edges.iter().copied());
            }
        }

        edge_ids
            .into_iter()
            .filter_map(|edge_id| self.edges.get(&edge_id))
            .filter(|edge| edge_type.map_or(true, |t| edge.edge_type == t))
            .map(|edge| {
                let neighbor = if edge.source_id == node_id {
                    edge.target_id
                } else {
                    edge.source_id
                };
                (edge.id, neighbor)
            })
            .collect()
    }

    /// Get the total number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get the total number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn next_node_id(&mut self) -> NodeId {
        let id = self.node_counter;
        self.node_counter += 1;
        id
    }

    fn next_edge_id(&mut self) -> EdgeId {
        let id = self.edge_counter;
        self.edge_counter += 1;
        id
    }
}
