//! Type tables mapping each exposed field to its [`Resolver`].

use super::{Multiplicity, NodeRef, Resolver, KEYWORDS_ARGUMENT};
use crate::error::{GraphError, Result};
use crate::graph::Direction;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Name of the root type holding the entry points.
pub const QUERY_TYPE: &str = "Query";

/// Shape of a field's value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// Leaf value
    Scalar,
    /// Zero or one value of the named type
    Object(String),
    /// Ordered values of the named type
    List(String),
}

/// One field of an object type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    /// Field name as selected
    pub name: String,
    /// Result shape
    pub field_type: FieldType,
    /// How the field is computed
    pub resolver: Resolver,
    /// Argument values used when a selection omits them
    pub defaults: Map<String, Value>,
}

impl FieldDef {
    /// Leaf field.
    pub fn scalar(name: impl Into<String>, resolver: Resolver) -> Self {
        Self::new(name, FieldType::Scalar, resolver)
    }

    /// Field yielding at most one `type_name`.
    pub fn object(name: impl Into<String>, type_name: &str, resolver: Resolver) -> Self {
        Self::new(name, FieldType::Object(type_name.to_string()), resolver)
    }

    /// Field yielding a list of `type_name`.
    pub fn list(name: impl Into<String>, type_name: &str, resolver: Resolver) -> Self {
        Self::new(name, FieldType::List(type_name.to_string()), resolver)
    }

    fn new(name: impl Into<String>, field_type: FieldType, resolver: Resolver) -> Self {
        Self {
            name: name.into(),
            field_type,
            resolver,
            defaults: Map::new(),
        }
    }

    /// Builder pattern: add a default argument value.
    pub fn with_default(mut self, argument: &str, value: impl Into<Value>) -> Self {
        self.defaults.insert(argument.to_string(), value.into());
        self
    }

    /// `defaults` overlaid with the explicitly supplied `arguments`.
    pub fn arguments(&self, arguments: &Map<String, Value>) -> Map<String, Value> {
        let mut merged = self.defaults.clone();
        for (key, value) in arguments {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }
}

/// An object type or a union of object types.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDef {
    /// Named fields resolved against a node reference
    Object {
        /// Type name
        name: String,
        /// Fields in declaration order
        fields: Vec<FieldDef>,
    },
    /// A value of one of several object types, chosen by the reference's type name
    Union {
        /// Type name
        name: String,
        /// Member object type names
        members: Vec<String>,
    },
}

impl TypeDef {
    /// Object type with no fields yet.
    pub fn object(name: impl Into<String>) -> Self {
        TypeDef::Object {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Union over `members`.
    pub fn union(name: impl Into<String>, members: &[&str]) -> Self {
        TypeDef::Union {
            name: name.into(),
            members: members.iter().map(|m| m.to_string()).collect(),
        }
    }

    /// Builder pattern: append a field to an object type. Unions are unchanged.
    pub fn field(mut self, field: FieldDef) -> Self {
        if let TypeDef::Object { fields, .. } = &mut self {
            fields.push(field);
        }
        self
    }

    /// Type name.
    pub fn name(&self) -> &str {
        match self {
            TypeDef::Object { name, .. } | TypeDef::Union { name, .. } => name,
        }
    }
}

/// The set of types a selection is executed against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    types: BTreeMap<String, TypeDef>,
}

impl Schema {
    /// Empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: register a type, replacing any type of the same name.
    pub fn with_type(mut self, type_def: TypeDef) -> Self {
        self.types.insert(type_def.name().to_string(), type_def);
        self
    }

    /// Look a type up by name.
    pub fn get_type(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    /// Field `field` of object type `type_name`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidOperation`] if the type is unknown, is a
    /// union, or has no such field.
    pub fn field(&self, type_name: &str, field: &str) -> Result<&FieldDef> {
        match self.types.get(type_name) {
            Some(TypeDef::Object { fields, .. }) => {
                fields.iter().find(|f| f.name == field).ok_or_else(|| {
                    invalid(format!(
                        "Cannot query field \"{field}\" on type \"{type_name}\""
                    ))
                })
            }
            Some(TypeDef::Union { .. }) => Err(invalid(format!(
                "Cannot query field \"{field}\" on union \"{type_name}\" without a concrete type"
            ))),
            None => Err(invalid(format!("Unknown type \"{type_name}\""))),
        }
    }

    /// Concrete object type of `node` when declared as `declared`.
    ///
    /// Object types are their own concrete type. A union takes the node's
    /// type name, which must be one of its members.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidOperation`] if a union member cannot be
    /// determined.
    pub fn concrete_type<'a>(&'a self, declared: &'a str, node: &'a NodeRef) -> Result<&'a str> {
        match self.types.get(declared) {
            Some(TypeDef::Union { members, .. }) => node
                .type_name
                .as_deref()
                .filter(|t| members.iter().any(|m| m == t))
                .ok_or_else(|| {
                    invalid(format!(
                        "Abstract type \"{declared}\" could not resolve node {} ({:?})",
                        node.id, node.type_name
                    ))
                }),
            Some(TypeDef::Object { .. }) => Ok(declared),
            None => Err(invalid(format!("Unknown type \"{declared}\""))),
        }
    }

    /// The question-and-answer dataset schema.
    ///
    /// Compiled datasets store posts at the root with nested `user`,
    /// `comments` and `answers` fields; every child points at its parent
    /// through an edge named after the (singular) field.
    pub fn dataset() -> Self {
        use Multiplicity::{Many, Single};
        use Resolver as R;

        let author = || R::relation(Single, "user", Direction::Incoming);
        let comments = || R::relation(Many, "comment", Direction::Incoming);

        let post = TypeDef::object("Post")
            .field(FieldDef::scalar("_id", R::Identity))
            .field(FieldDef::scalar("id", R::property("id")))
            .field(FieldDef::scalar("title", R::property("title")))
            .field(FieldDef::scalar("body", R::property("body")))
            .field(FieldDef::scalar("creation", R::property("creation")))
            .field(FieldDef::scalar("score", R::property("score")))
            .field(FieldDef::object("user", "User", author()))
            .field(FieldDef::list("comments", "Comment", comments()))
            .field(FieldDef::list(
                "answers",
                "Answer",
                R::relation(Many, "answer", Direction::Incoming),
            ));

        let comment = TypeDef::object("Comment")
            .field(FieldDef::scalar("_id", R::Identity))
            .field(FieldDef::scalar("id", R::property("id")))
            .field(FieldDef::scalar("body", R::property("body")))
            .field(FieldDef::object("user", "User", author()));

        let answer = TypeDef::object("Answer")
            .field(FieldDef::scalar("_id", R::Identity))
            .field(FieldDef::scalar("id", R::property("id")))
            .field(FieldDef::scalar("body", R::property("body")))
            .field(FieldDef::scalar("creation", R::property("creation")))
            .field(FieldDef::scalar("score", R::property("score")))
            .field(FieldDef::object("user", "User", author()))
            .field(FieldDef::scalar("accepted", R::property("accepted")))
            .field(FieldDef::list("comments", "Comment", comments()))
            .field(FieldDef::object(
                "answers",
                "Post",
                R::relation_to(Single, "comment", Direction::Outgoing, "Post"),
            ));

        let user = TypeDef::object("User")
            .field(FieldDef::scalar("_id", R::Identity))
            .field(FieldDef::scalar("id", R::property("id")))
            .field(FieldDef::scalar("name", R::property("name")))
            .field(FieldDef::list(
                "posts",
                "Post",
                R::relation_to(Many, "user", Direction::Outgoing, "Post"),
            ))
            .field(FieldDef::list(
                "comments",
                "Comment",
                R::relation_to(Many, "user", Direction::Outgoing, "Comment"),
            ))
            .field(FieldDef::list(
                "answers",
                "Answer",
                R::relation_to(Many, "user", Direction::Outgoing, "Answer"),
            ));

        let query = TypeDef::object(QUERY_TYPE)
            .field(
                FieldDef::list("search", "SearchResult", R::SearchEntry)
                    .with_default(KEYWORDS_ARGUMENT, ""),
            )
            .field(FieldDef::list("posts", "Post", R::collection("Post")))
            .field(FieldDef::list("users", "User", R::collection("User")));

        Schema::new()
            .with_type(post)
            .with_type(comment)
            .with_type(answer)
            .with_type(user)
            .with_type(TypeDef::union("SearchResult", &["Post", "Comment", "Answer", "User"]))
            .with_type(query)
    }
}

fn invalid(message: String) -> GraphError {
    GraphError::InvalidOperation { message }
}
