//! Core graph types: nodes, edges, IDs, and traversal direction.

use super::property::{PropertyMap, PropertyValue};
use serde::{Deserialize, Serialize};

/// Identifier for a node (monotonic counter).
///
/// Compiler-local ids and store-assigned ids share this representation but
/// never refer to the same numbering.
pub type NodeId = u64;

/// Identifier for an edge (monotonic counter).
pub type EdgeId = u64;

/// Direction of a traversal, relative to the node the traversal starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Follow outgoing edges: `(n)-[]->(r)`
    Outgoing,
    /// Follow incoming edges: `(n)<-[]-(r)`
    Incoming,
    /// Follow edges in both directions: `(n)-[]-(r)`
    Both,
}

impl Direction {
    /// Arrow prefix placed before the relationship bracket.
    pub fn left_arrow(self) -> &'static str {
        match self {
            Direction::Incoming => "<",
            Direction::Outgoing | Direction::Both => "",
        }
    }

    /// Arrow suffix placed after the relationship bracket.
    pub fn right_arrow(self) -> &'static str {
        match self {
            Direction::Outgoing => ">",
            Direction::Incoming | Direction::Both => "",
        }
    }
}

/// A node stored in a [`PropertyGraph`](super::PropertyGraph).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier (assigned by the graph)
    pub id: NodeId,
    /// Optional type tag
    pub label: Option<String>,
    /// Key-value metadata
    pub properties: PropertyMap,
}

impl Node {
    /// Create a new node (ID will be assigned by graph).
    pub fn new(id: NodeId, label: Option<String>, properties: PropertyMap) -> Self {
        Self {
            id,
            label,
            properties,
        }
    }

    /// Add or update a property.
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.properties.insert(key, value);
    }

    /// Get a property value.
    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// Whether the node carries the given label.
    pub fn has_label(&self, label: &str) -> bool {
        self.label.as_deref() == Some(label)
    }
}

/// A directed, typed edge between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Unique identifier (assigned by the graph)
    pub id: EdgeId,
    /// Source node ID
    pub source_id: NodeId,
    /// Target node ID
    pub target_id: NodeId,
    /// Relationship type
    pub edge_type: String,
}

impl Edge {
    /// Create a new edge (ID will be assigned by graph).
    pub fn new(
        id: EdgeId,
        source_id: NodeId,
        target_id: NodeId,
        edge_type: impl Into<String>,
    ) -> Self {
        Self {
            id,
            source_id,
            target_id,
            edge_type: edge_type.into(),
        }
    }
}
