//! In-memory graph store.

use super::cypher::Script;
use super::{GraphStore, StoreResponse};
use crate::error::{GraphError, Result};
use crate::graph::PropertyGraph;
use async_trait::async_trait;
use log::debug;
use std::sync::{Arc, RwLock};
use std::time::Instant;

/// Embedded [`GraphStore`] backed by a [`PropertyGraph`].
///
/// Read-only statements share a read lock. Statements containing `MERGE`
/// run against a copy of the graph under the write lock; the copy replaces
/// the graph only if every clause succeeded, so a failing statement leaves
/// no trace. Cloning a `MemoryStore` yields another handle to the same graph.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    name: String,
    graph: Arc<RwLock<PropertyGraph>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new("docgraph")
    }
}

impl MemoryStore {
    /// Create an empty store for the graph called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            graph: Arc::new(RwLock::new(PropertyGraph::new())),
        }
    }

    /// Name of the graph this store holds.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Copy of the current graph, for inspection.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Store`] if a writer panicked while holding the lock.
    pub fn snapshot(&self) -> Result<PropertyGraph> {
        let graph = self.graph.read().map_err(|_| poisoned())?;
        Ok(graph.clone())
    }

    fn run(&self, statement: &str) -> Result<StoreResponse> {
        let started = Instant::now();
        let script = Script::parse(statement)?;

        let output = if script.is_read_only() {
            let graph = self.graph.read().map_err(|_| poisoned())?;
            script.run_read(&graph)?
        } else {
            let mut graph = self.graph.write().map_err(|_| poisoned())?;
            let mut staged = graph.clone();
            let output = script.run_write(&mut staged)?;
            *graph = staged;
            output
        };

        let mut stats = output.stats.lines();
        stats.push(format!(
            "Query internal execution time: {:.6} milliseconds",
            started.elapsed().as_secs_f64() * 1000.0
        ));
        debug!(
            "[{}] {} rows, {}",
            self.name,
            output.rows.len(),
            stats.join(", ")
        );

        Ok(StoreResponse {
            columns: output.columns,
            rows: output.rows,
            stats,
        })
    }
}

#[async_trait]
impl GraphStore for MemoryStore {
    async fn execute(&self, statement: &str) -> Result<StoreResponse> {
        self.run(statement)
    }
}

fn poisoned() -> GraphError {
    GraphError::Store {
        message: "graph lock poisoned".to_string(),
        source: None,
    }
}
