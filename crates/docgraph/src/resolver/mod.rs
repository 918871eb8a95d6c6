//! Field resolvers over opaque node references.
//!
//! A [`Resolver`] computes one field for one node. It is handed a [`NodeRef`]
//! (the store identifier of the parent entity, never its data) and issues at
//! most one statement to the store. Nothing is batched or cached: resolving
//! a field on N references costs N round trips.
//!
//! ```text
//! Query.posts          MATCH (n:Post) RETURN id(n)
//!   Post.title         MATCH (n) WHERE id(n)=0 RETURN n.title
//!   Post.comments      MATCH (n)<-[:comment]-(r) WHERE id(n)=0 RETURN id(r)
//! ```

pub mod executor;
pub mod schema;

pub use executor::{Executor, Selection};
pub use schema::{FieldDef, FieldType, Schema, TypeDef};

use crate::error::{GraphError, Result};
use crate::graph::{Direction, NodeId, PropertyValue};
use crate::search::SearchParams;
use crate::store::GraphStore;
use log::trace;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Argument read by [`Resolver::SearchEntry`].
pub const KEYWORDS_ARGUMENT: &str = "keywords";

/// Opaque handle on a stored node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRef {
    /// Store-assigned node identifier
    pub id: NodeId,
    /// Concrete type name, when the producing query knew it
    pub type_name: Option<String>,
}

impl NodeRef {
    /// Reference without a known type name.
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            type_name: None,
        }
    }

    /// Reference carrying its concrete type name.
    pub fn typed(id: NodeId, type_name: impl Into<String>) -> Self {
        Self {
            id,
            type_name: Some(type_name.into()),
        }
    }
}

/// Value produced by a resolver.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    /// Leaf value
    Scalar(PropertyValue),
    /// Zero or one related node
    Reference(Option<NodeRef>),
    /// Ordered related nodes
    References(Vec<NodeRef>),
}

/// How many references a relation yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Multiplicity {
    /// First match or nothing
    Single,
    /// Every match, in store order
    Many,
}

/// One field's resolution strategy, configured by explicit immutable fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolver {
    /// The source's own identifier; issues no query.
    Identity,
    /// A named property of the source node.
    Property {
        /// Property key
        field: String,
    },
    /// Nodes connected to the source by one edge.
    Relation {
        /// Single or many results
        multiplicity: Multiplicity,
        /// Edge type filter
        relation: Option<String>,
        /// Edge direction relative to the source
        direction: Direction,
        /// Label filter on the far node
        target_label: Option<String>,
    },
    /// Entry point: nodes matching the `keywords` search text.
    SearchEntry,
    /// Entry point: every node carrying a label.
    CollectionEntry {
        /// Label to scan
        label: String,
    },
}

impl Resolver {
    /// Property resolver for `field`.
    pub fn property(field: impl Into<String>) -> Self {
        Resolver::Property {
            field: field.into(),
        }
    }

    /// Relation resolver with no target label.
    pub fn relation(multiplicity: Multiplicity, relation: &str, direction: Direction) -> Self {
        Resolver::Relation {
            multiplicity,
            relation: Some(relation.to_string()),
            direction,
            target_label: None,
        }
    }

    /// Relation resolver restricted to far nodes labelled `label`.
    pub fn relation_to(
        multiplicity: Multiplicity,
        relation: &str,
        direction: Direction,
        label: &str,
    ) -> Self {
        Resolver::Relation {
            multiplicity,
            relation: Some(relation.to_string()),
            direction,
            target_label: Some(label.to_string()),
        }
    }

    /// Collection entry point for `label`.
    pub fn collection(label: impl Into<String>) -> Self {
        Resolver::CollectionEntry {
            label: label.into(),
        }
    }

    /// Whether this resolver runs without a source reference.
    pub fn is_entry_point(&self) -> bool {
        matches!(self, Resolver::SearchEntry | Resolver::CollectionEntry { .. })
    }

    /// Statement issued for `source`, or `None` when no query is needed.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidOperation`] if a field resolver is given
    /// no source, or if the search `keywords` argument is not a string.
    pub fn statement(
        &self,
        source: Option<&NodeRef>,
        args: &Map<String, Value>,
    ) -> Result<Option<String>> {
        let statement = match self {
            Resolver::Identity => None,
            Resolver::Property { field } => {
                let id = require(source, self)?.id;
                Some(format!("MATCH (n) WHERE id(n)={id} RETURN n.{field}"))
            }
            Resolver::Relation {
                relation,
                direction,
                target_label,
                ..
            } => {
                let id = require(source, self)?.id;
                let rel = relation.as_deref().map(|r| format!(":{r}")).unwrap_or_default();
                let label = target_label
                    .as_deref()
                    .map(|l| format!(":{l}"))
                    .unwrap_or_default();
                Some(format!(
                    "MATCH (n){}-[{rel}]-{}(r{label}) WHERE id(n)={id} RETURN id(r)",
                    direction.left_arrow(),
                    direction.right_arrow(),
                ))
            }
            Resolver::SearchEntry => {
                let keywords = match args.get(KEYWORDS_ARGUMENT) {
                    None | Some(Value::Null) => "",
                    Some(Value::String(text)) => text.as_str(),
                    Some(other) => {
                        return Err(GraphError::InvalidOperation {
                            message: format!(
                                "Argument \"{KEYWORDS_ARGUMENT}\" must be a string, got {other}"
                            ),
                        })
                    }
                };
                let params = SearchParams::parse(keywords);
                Some(format!("MATCH (n) {params} RETURN id(n),labels(n)"))
            }
            Resolver::CollectionEntry { label } => Some(format!("MATCH (n:{label}) RETURN id(n)")),
        };
        Ok(statement)
    }

    /// Resolve this field for `source`.
    ///
    /// Unmatched references yield `Null`, `Reference(None)` or an empty list,
    /// never an error.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidOperation`] if a field resolver is given
    /// no source, or whatever error the store reports.
    pub async fn resolve(
        &self,
        store: &dyn GraphStore,
        source: Option<&NodeRef>,
        args: &Map<String, Value>,
    ) -> Result<Resolved> {
        let statement = match self.statement(source, args)? {
            Some(statement) => statement,
            None => return Ok(Resolved::Scalar(require(source, self)?.id.into())),
        };

        trace!("Resolving {self:?} with \"{statement}\"");
        let response = store.execute(&statement).await?;

        let resolved = match self {
            Resolver::Identity | Resolver::Property { .. } => {
                Resolved::Scalar(response.first_value().cloned().unwrap_or(PropertyValue::Null))
            }
            Resolver::Relation { multiplicity, .. } => {
                let mut refs = response.first_column().filter_map(reference);
                match multiplicity {
                    Multiplicity::Single => Resolved::Reference(refs.next()),
                    Multiplicity::Many => Resolved::References(refs.collect()),
                }
            }
            Resolver::CollectionEntry { .. } => {
                Resolved::References(response.first_column().filter_map(reference).collect())
            }
            Resolver::SearchEntry => Resolved::References(
                response
                    .rows
                    .iter()
                    .filter_map(|row| {
                        let mut node = reference(row.first()?)?;
                        node.type_name = row.get(1).and_then(first_label);
                        Some(node)
                    })
                    .collect(),
            ),
        };
        Ok(resolved)
    }
}

fn require<'a>(source: Option<&'a NodeRef>, resolver: &Resolver) -> Result<&'a NodeRef> {
    source.ok_or_else(|| GraphError::InvalidOperation {
        message: format!("{resolver:?} needs a source reference"),
    })
}

fn reference(value: &PropertyValue) -> Option<NodeRef> {
    value
        .as_int()
        .and_then(|id| NodeId::try_from(id).ok())
        .map(NodeRef::new)
}

/// First entry of a `labels(n)` cell.
fn first_label(value: &PropertyValue) -> Option<String> {
    match value {
        PropertyValue::List(labels) => labels
            .first()
            .and_then(PropertyValue::as_str)
            .map(str::to_string),
        PropertyValue::String(label) => Some(label.clone()),
        _ => None,
    }
}
