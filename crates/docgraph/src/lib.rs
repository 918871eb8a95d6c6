//! # docgraph
//!
//! Turn nested documents into a property graph, then answer typed field
//! queries over that graph one traversal at a time.
//!
//! ## Core Principles
//!
//! - **Deterministic Output**: The same document always compiles to the same statements
//! - **Idempotent Ingestion**: Every statement is a MERGE, so re-running is harmless
//! - **Opaque References**: Resolvers pass node ids around, never node data
//! - **No Leaks**: Store diagnostics are logged, callers get a generic error
//!
//! ## Architecture
//!
//! ```text
//! Selections (parsed by the caller)
//!     ↓
//! Executor + Schema (field tables, concurrent siblings)
//!     ↓
//! Resolvers (one statement per field)  ←  Search parser
//!     ↓
//! Database (logging, timeout, generic errors)
//!     ↓
//! GraphStore (MemoryStore or an external store)
//!     ↑
//! Ingestion  ←  Document compiler  →  Query builder
//! ```
//!
//! ## Example
//!
//! ```rust
//! use docgraph::{Database, DocumentCompiler, Executor, MemoryStore, Schema, Selection};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn run() -> docgraph::Result<()> {
//! let db = Database::new(Arc::new(MemoryStore::default()));
//!
//! let dataset = json!([{"id": 1, "title": "Exit vim?", "user": {"id": 7, "name": "Ann"}}]);
//! docgraph::ingest::import_document(&dataset, &DocumentCompiler::default(), &db).await?;
//!
//! let executor = Executor::new(Arc::new(Schema::dataset()), Arc::new(db));
//! let response = executor
//!     .execute(&[Selection::new("posts")
//!         .select(Selection::new("title"))
//!         .select(Selection::new("user").select(Selection::new("name")))])
//!     .await;
//!
//! assert_eq!(
//!     response.data,
//!     json!({"posts": [{"title": "Exit vim?", "user": {"name": "Ann"}}]})
//! );
//! # Ok(())
//! # }
//! # tokio::runtime::Runtime::new().unwrap().block_on(run()).unwrap();
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod compiler;
pub mod config;
pub mod error;
pub mod graph;
pub mod ingest;
pub mod query;
pub mod resolver;
pub mod search;
pub mod store;

// Re-export main types
pub use compiler::DocumentCompiler;
pub use config::Config;
pub use error::{GraphError, Result};
pub use graph::{
    Direction, Edge, EdgeId, Node, NodeId, PropertyGraph, PropertyMap, PropertyValue,
};
pub use ingest::{IngestOutcome, IngestReport};
pub use query::{QueryBuilder, Statement};
pub use resolver::executor::{FieldError, Response};
pub use resolver::{Executor, Multiplicity, NodeRef, Resolved, Resolver, Schema, Selection};
pub use search::{SearchParams, SearchPredicate};
pub use store::{Database, GraphStore, MemoryStore, StoreResponse};
