//! Syntax tree for the statement dialect.

use crate::graph::{Direction, PropertyValue};

/// A single query: clauses share one set of variable bindings.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Query {
    pub clauses: Vec<Clause>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Clause {
    Merge(Pattern),
    Match {
        pattern: Pattern,
        filter: Vec<Comparison>,
    },
    Return(Vec<ReturnItem>),
}

/// A node, optionally followed by one relationship hop.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Pattern {
    pub start: NodePattern,
    pub hop: Option<(RelationshipPattern, NodePattern)>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct NodePattern {
    pub variable: Option<String>,
    pub label: Option<String>,
    pub properties: Vec<(String, PropertyValue)>,
}

impl NodePattern {
    pub fn is_unconstrained(&self) -> bool {
        self.label.is_none() && self.properties.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RelationshipPattern {
    pub variable: Option<String>,
    pub rel_type: Option<String>,
    /// Direction as seen from the pattern's start node
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompareOp {
    Equals,
    NotEquals,
    Contains,
}

/// `left op right`; a WHERE clause is a conjunction of these.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Comparison {
    pub left: Operand,
    pub op: CompareOp,
    pub right: Operand,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Operand {
    Literal(PropertyValue),
    Property { variable: String, key: String },
    Id(String),
    Labels(String),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Projection {
    Value(Operand),
    Count(String),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ReturnItem {
    pub projection: Projection,
    /// Column name: the item's source text
    pub name: String,
}
