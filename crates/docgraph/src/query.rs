//! Statement builder for a single ingestion pass.
//!
//! [`QueryBuilder`] hands out compiler-local node identifiers and accumulates
//! the statements that reference them. It performs no validation: raw text
//! appended with [`QueryBuilder::append_statement`] is the caller's
//! responsibility.

use crate::graph::{NodeId, PropertyValue};
use std::fmt;

/// One mutation emitted by the document compiler.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Idempotent node upsert: `MERGE (n0:Post {id: 1, title: 'x'})`
    MergeNode {
        /// Compiler-local identifier, rendered as the variable `n{id}`
        id: NodeId,
        /// Label derived from the introducing field name
        label: String,
        /// Scalar properties in field-declaration order
        properties: Vec<(String, PropertyValue)>,
    },
    /// Idempotent relationship upsert from a child to its parent
    MergeEdge {
        /// Child node variable
        child: NodeId,
        /// Relationship type derived from the field name
        edge_type: String,
        /// Parent node variable
        parent: NodeId,
    },
    /// Caller-supplied statement text, rendered verbatim
    Raw(String),
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::MergeNode {
                id,
                label,
                properties,
            } => {
                write!(f, "MERGE (n{id}:{label} {{")?;
                for (i, (key, value)) in properties.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {}", format_literal(value))?;
                }
                writeln!(f, "}})")
            }
            Statement::MergeEdge {
                child,
                edge_type,
                parent,
            } => writeln!(f, "MERGE (n{child})-[:{edge_type}]->(n{parent})"),
            Statement::Raw(text) => write!(f, "{text}"),
        }
    }
}

/// Accumulates statements and allocates node identifiers for one pass.
///
/// # Examples
///
/// ```
/// use docgraph::QueryBuilder;
///
/// let mut builder = QueryBuilder::new();
/// let id = builder.allocate_id();
/// builder.append_statement(format!("MERGE (n{id}:Post {{id: 1}})\n"));
/// assert_eq!(builder.render(), "MERGE (n0:Post {id: 1})\n");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryBuilder {
    next_id: NodeId,
    statements: Vec<Statement>,
}

impl QueryBuilder {
    /// Create an empty builder whose first identifier is 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the next unused identifier.
    pub fn allocate_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// The identifier the next call to [`allocate_id`](Self::allocate_id) returns.
    pub fn next_id(&self) -> NodeId {
        self.next_id
    }

    /// Append raw statement text.
    pub fn append_statement(&mut self, text: impl Into<String>) {
        self.statements.push(Statement::Raw(text.into()));
    }

    /// Append a typed statement.
    pub fn push(&mut self, statement: Statement) {
        self.statements.push(statement);
    }

    /// Statements in append order.
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Number of appended statements.
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Whether nothing has been appended.
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Concatenate every statement in append order.
    pub fn render(&self) -> String {
        self.statements.iter().map(ToString::to_string).collect()
    }
}

/// Escape `'` and `\` with a backslash and wrap the result in single quotes.
pub fn quote_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        if c == '\'' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

/// Render a value as a statement literal.
///
/// Strings are quoted via [`quote_string`]; every other value uses its
/// natural textual form. Floats always keep a fractional part or exponent so
/// they read back as floats.
pub fn format_literal(value: &PropertyValue) -> String {
    match value {
        PropertyValue::String(s) => quote_string(s),
        PropertyValue::Float(f) => format!("{f:?}"),
        PropertyValue::List(items) => {
            let inner: Vec<String> = items.iter().map(format_literal).collect();
            format!("[{}]", inner.join(", "))
        }
        other => other.to_string(),
    }
}
