//! Core graph types and the in-memory property graph.
//!
//! This module defines the fundamental building blocks:
//! - [`PropertyValue`] / [`PropertyMap`]: scalar metadata and result cells
//! - [`Node`], [`Edge`]: stored vertices and typed relationships
//! - [`PropertyGraph`]: the graph the embedded store executes statements against

mod property;
mod property_graph;
mod types;

pub use property::{PropertyMap, PropertyValue};
pub use property_graph::PropertyGraph;
pub use types::{Direction, Edge, EdgeId, Node, NodeId};
