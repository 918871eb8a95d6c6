//! Executes parsed field selections against a [`Schema`].
//!
//! Sibling fields are resolved concurrently; list elements likewise. Each
//! resolver invocation is one store round trip, so a selection of M children
//! under one root costs 1 + M statements. A failing field resolves to `null`
//! and records an error carrying its path; its siblings are unaffected.
//! Store failures are logged and reported with the generic database message
//! whether or not the store sits behind a [`Database`](crate::store::Database).

use super::schema::{FieldType, Schema, QUERY_TYPE};
use super::{NodeRef, Resolved};
use crate::error::GraphError;
use crate::store::GraphStore;
use futures::future::{join_all, BoxFuture, FutureExt};
use log::{debug, error};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::{Arc, Mutex};

/// Field name answered from the schema rather than the store.
pub const TYPENAME_FIELD: &str = "__typename";

/// One requested field and its sub-selections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Field name in the schema
    pub name: String,
    /// Key used in the response instead of `name`
    #[serde(default)]
    pub alias: Option<String>,
    /// Explicit argument values
    #[serde(default)]
    pub arguments: Map<String, Value>,
    /// Fields requested on the result, for object and list fields
    #[serde(default)]
    pub selections: Vec<Selection>,
}

impl Selection {
    /// Select field `name` with no arguments or sub-selections.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder pattern: set the response key.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Builder pattern: supply an argument.
    pub fn with_argument(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(name.into(), value.into());
        self
    }

    /// Builder pattern: add a sub-selection.
    pub fn select(mut self, child: Selection) -> Self {
        self.selections.push(child);
        self
    }

    /// Key this field appears under in the response.
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Step in a [`FieldError`] path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Response key
    Key(String),
    /// List position
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{key}"),
            PathSegment::Index(i) => write!(f, "{i}"),
        }
    }
}

/// Failure of one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Caller-safe description
    pub message: String,
    /// Response path of the failed field
    pub path: Vec<PathSegment>,
}

/// Result of executing a selection set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Resolved values keyed like the selections
    pub data: Value,
    /// Field failures, omitted when empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl Response {
    /// The response as a JSON value.
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        out.insert("data".into(), self.data.clone());
        if !self.errors.is_empty() {
            let errors = self
                .errors
                .iter()
                .map(|e| {
                    let path = e
                        .path
                        .iter()
                        .map(|p| match p {
                            PathSegment::Key(k) => Value::from(k.as_str()),
                            PathSegment::Index(i) => Value::from(*i),
                        })
                        .collect();
                    let mut error = Map::new();
                    error.insert("message".into(), Value::from(e.message.as_str()));
                    error.insert("path".into(), Value::Array(path));
                    Value::Object(error)
                })
                .collect();
            out.insert("errors".into(), Value::Array(errors));
        }
        Value::Object(out)
    }
}

/// Resolves selections against a schema and a store.
#[derive(Clone)]
pub struct Executor {
    schema: Arc<Schema>,
    store: Arc<dyn GraphStore>,
}

type Path = Vec<PathSegment>;

impl Executor {
    /// Executor over `schema`, issuing statements to `store`.
    pub fn new(schema: Arc<Schema>, store: Arc<dyn GraphStore>) -> Self {
        Self { schema, store }
    }

    /// The schema selections are checked against.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Execute `selections` on the root query type.
    pub async fn execute(&self, selections: &[Selection]) -> Response {
        let errors = Mutex::new(Vec::new());
        let data = self
            .resolve_object(&errors, QUERY_TYPE, None, selections, Vec::new())
            .await;
        let errors = errors.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
        Response { data, errors }
    }

    fn resolve_object<'a>(
        &'a self,
        errors: &'a Mutex<Vec<FieldError>>,
        type_name: &'a str,
        source: Option<&'a NodeRef>,
        selections: &'a [Selection],
        path: Path,
    ) -> BoxFuture<'a, Value> {
        async move {
            let fields = selections.iter().map(|selection| {
                let mut field_path = path.clone();
                field_path.push(PathSegment::Key(selection.response_key().to_string()));
                self.resolve_field(errors, type_name, source, selection, field_path)
            });
            let values = join_all(fields).await;

            let mut object = Map::new();
            for (selection, value) in selections.iter().zip(values) {
                object.insert(selection.response_key().to_string(), value);
            }
            Value::Object(object)
        }
        .boxed()
    }

    async fn resolve_field(
        &self,
        errors: &Mutex<Vec<FieldError>>,
        type_name: &str,
        source: Option<&NodeRef>,
        selection: &Selection,
        path: Path,
    ) -> Value {
        if selection.name == TYPENAME_FIELD {
            return Value::from(type_name);
        }

        let field = match self.schema.field(type_name, &selection.name) {
            Ok(field) => field,
            Err(err) => return record(errors, path, err),
        };

        let arguments = field.arguments(&selection.arguments);
        let resolved = match field
            .resolver
            .resolve(self.store.as_ref(), source, &arguments)
            .await
        {
            Ok(resolved) => resolved,
            Err(err) => return record(errors, path, err),
        };

        match (&field.field_type, resolved) {
            (FieldType::Scalar, Resolved::Scalar(value)) => value.to_json(),
            (FieldType::Object(_), Resolved::Reference(None)) => Value::Null,
            (FieldType::Object(declared), Resolved::Reference(Some(node))) => {
                self.complete_node(errors, declared, node, selection, path).await
            }
            (FieldType::List(declared), Resolved::References(nodes)) => {
                let items = nodes.into_iter().enumerate().map(|(i, node)| {
                    let mut item_path = path.clone();
                    item_path.push(PathSegment::Index(i));
                    self.complete_node(errors, declared, node, selection, item_path)
                });
                Value::Array(join_all(items).await)
            }
            (expected, got) => record(
                errors,
                path,
                GraphError::InvalidOperation {
                    message: format!(
                        "Field \"{}\" expected {expected:?} but resolved {got:?}",
                        selection.name
                    ),
                },
            ),
        }
    }

    fn complete_node<'a>(
        &'a self,
        errors: &'a Mutex<Vec<FieldError>>,
        declared: &'a str,
        node: NodeRef,
        selection: &'a Selection,
        path: Path,
    ) -> BoxFuture<'a, Value> {
        async move {
            if selection.selections.is_empty() {
                let err = GraphError::InvalidOperation {
                    message: format!(
                        "Field \"{}\" of type \"{declared}\" must have a selection of subfields",
                        selection.name
                    ),
                };
                return record(errors, path, err);
            }

            let concrete = match self.schema.concrete_type(declared, &node) {
                Ok(concrete) => concrete.to_string(),
                Err(err) => return record(errors, path, err),
            };
            self.resolve_object(errors, &concrete, Some(&node), &selection.selections, path)
                .await
        }
        .boxed()
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

fn record(errors: &Mutex<Vec<FieldError>>, path: Path, err: GraphError) -> Value {
    let rendered: Vec<String> = path.iter().map(ToString::to_string).collect();
    let err = match err {
        GraphError::InvalidOperation { .. } | GraphError::Database => {
            debug!("Field {} failed: {err}", rendered.join("."));
            err
        }
        other => {
            error!("Field {} failed: {other}", rendered.join("."));
            GraphError::Database
        }
    };
    if let Ok(mut errors) = errors.lock() {
        errors.push(FieldError {
            message: err.to_string(),
            path,
        });
    }
    Value::Null
}
