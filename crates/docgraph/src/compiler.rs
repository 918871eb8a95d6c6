//! Document compiler: nested JSON documents to MERGE statements.
//!
//! The compiler walks a document depth-first in field-declaration order.
//! Every object becomes a node whose scalar fields are its properties; every
//! object- or array-valued field becomes a child node linked to its parent
//! by a relationship named after the field. Arrays are transparent: their
//! elements are compiled as if each were the field's value.
//!
//! ```text
//! {"id": 1, "comments": [{"id": 2}]}
//!
//! MERGE (n0:Post {id: 1})
//! MERGE (n1:Comment {id: 2})
//! MERGE (n1)-[:comment]->(n0)
//! ```

use crate::error::{GraphError, Result};
use crate::graph::{NodeId, PropertyValue};
use crate::query::{QueryBuilder, Statement};
use crate::store::is_plain_identifier;
use log::{debug, trace};
use serde_json::{Map, Value};

/// Label given to root entries, which have no field name to derive one from.
pub const DEFAULT_LABEL: &str = "Post";

/// Compiles documents into [`QueryBuilder`] statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentCompiler {
    default_label: String,
}

impl Default for DocumentCompiler {
    fn default() -> Self {
        Self::new(DEFAULT_LABEL)
    }
}

impl DocumentCompiler {
    /// Create a compiler that labels root entries with `default_label`.
    pub fn new(default_label: impl Into<String>) -> Self {
        Self {
            default_label: default_label.into(),
        }
    }

    /// Label used for root entries.
    pub fn default_label(&self) -> &str {
        &self.default_label
    }

    /// Compile a whole document into a fresh builder.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::MalformedDocument`] if the root is not an object
    /// or array, or if a field name cannot be used as a property key, label
    /// or relationship type. No partial builder is returned on failure.
    pub fn compile(&self, document: &Value) -> Result<QueryBuilder> {
        if !matches!(document, Value::Object(_) | Value::Array(_)) {
            return Err(GraphError::malformed(format!(
                "root must be an object or array, got {}",
                json_kind(document)
            )));
        }

        let builder = self.compile_into(document, None, None, QueryBuilder::new())?;
        debug!(
            "Compiled document into {} statements ({} node ids)",
            builder.len(),
            builder.next_id()
        );
        Ok(builder)
    }

    /// Compile `fragment` into `builder`, returning the builder.
    ///
    /// `parent` and `relation` describe the field that introduced the
    /// fragment; a relationship is emitted only when both are present.
    ///
    /// # Errors
    ///
    /// See [`compile`](Self::compile).
    pub fn compile_into(
        &self,
        fragment: &Value,
        parent: Option<NodeId>,
        relation: Option<&str>,
        builder: QueryBuilder,
    ) -> Result<QueryBuilder> {
        match fragment {
            Value::Object(fields) => self.compile_object(fields, parent, relation, builder),
            Value::Array(items) => items.iter().try_fold(builder, |builder, item| {
                self.compile_into(item, parent, relation, builder)
            }),
            other => {
                trace!("Dropping scalar array element: {other}");
                Ok(builder)
            }
        }
    }

    fn compile_object(
        &self,
        fields: &Map<String, Value>,
        parent: Option<NodeId>,
        relation: Option<&str>,
        mut builder: QueryBuilder,
    ) -> Result<QueryBuilder> {
        let id = builder.allocate_id();

        let mut structural: Vec<(&str, &Value)> = Vec::new();
        let mut properties: Vec<(String, PropertyValue)> = Vec::new();
        for (key, value) in fields {
            match value {
                Value::Object(_) | Value::Array(_) => structural.push((key.as_str(), value)),
                Value::Null => trace!("Dropping null field '{key}' on n{id}"),
                scalar => {
                    if let Some(value) = PropertyValue::from_json_scalar(scalar) {
                        properties.push((checked_identifier(key, "property key")?, value));
                    }
                }
            }
        }

        if !properties.is_empty() {
            let label = match relation {
                Some(relation) => to_label(relation),
                None => self.default_label.clone(),
            };
            let label = checked_identifier(&label, "label")?;
            builder.push(Statement::MergeNode {
                id,
                label,
                properties,
            });

            if let (Some(parent), Some(relation)) = (parent, relation) {
                let edge_type = checked_identifier(&to_edge_type(relation), "relationship type")?;
                builder.push(Statement::MergeEdge {
                    child: id,
                    edge_type,
                    parent,
                });
            }
        }

        structural
            .into_iter()
            .try_fold(builder, |builder, (key, value)| {
                self.compile_into(value, Some(id), Some(key), builder)
            })
    }
}

/// Drop a single trailing `s`. Irregular plurals are left alone.
pub fn singularize(name: &str) -> &str {
    name.strip_suffix('s').unwrap_or(name)
}

/// Node label for a field name: singular, first letter capitalized.
///
/// ```
/// assert_eq!(docgraph::compiler::to_label("comments"), "Comment");
/// assert_eq!(docgraph::compiler::to_label("user"), "User");
/// ```
pub fn to_label(name: &str) -> String {
    let singular = singularize(name);
    let mut chars = singular.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Relationship type for a field name: singular, case unchanged.
pub fn to_edge_type(name: &str) -> String {
    singularize(name).to_string()
}

fn checked_identifier(name: &str, what: &str) -> Result<String> {
    if is_plain_identifier(name) {
        Ok(name.to_string())
    } else {
        Err(GraphError::malformed(format!(
            "'{name}' cannot be used as a {what}"
        )))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
