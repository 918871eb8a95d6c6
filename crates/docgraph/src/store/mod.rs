//! Graph store abstractions and implementations.
//!
//! This module defines the [`GraphStore`] trait through which the rest of the
//! crate issues statement text, and provides:
//! - [`MemoryStore`]: embedded store interpreting the statements this crate emits
//! - [`Database`]: the logging, timeout-enforcing boundary around any store
//!
//! Resolvers and ingestion only ever talk to a store through a [`Database`],
//! so store diagnostics are logged once and callers see
//! [`GraphError::Database`].

mod cypher;
mod memory;

pub(crate) use cypher::is_plain_identifier;
pub use memory::MemoryStore;

use crate::error::{GraphError, Result};
use crate::graph::PropertyValue;
use async_trait::async_trait;
use log::{error, trace};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Statement counting every node in the graph.
pub const COUNT_NODES_STATEMENT: &str = "MATCH (n) RETURN count(n)";

/// Tabular result of one statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreResponse {
    /// Column names, in `RETURN` order
    pub columns: Vec<String>,
    /// One entry per result row, aligned with `columns`
    pub rows: Vec<Vec<PropertyValue>>,
    /// Human-readable execution statistics (`Nodes created: 3`, ...)
    pub stats: Vec<String>,
}

impl StoreResponse {
    /// First value of the first row, if any.
    pub fn first_value(&self) -> Option<&PropertyValue> {
        self.rows.first().and_then(|row| row.first())
    }

    /// First column of every row.
    pub fn first_column(&self) -> impl Iterator<Item = &PropertyValue> {
        self.rows.iter().filter_map(|row| row.first())
    }
}

/// A property-graph store that accepts statement text.
///
/// Implementations must accept concurrent calls and apply each statement
/// atomically: a failing statement leaves the graph unchanged.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Run one statement (which may hold several clauses).
    ///
    /// # Errors
    ///
    /// Returns an error if the statement cannot be parsed or executed.
    async fn execute(&self, statement: &str) -> Result<StoreResponse>;

    /// Number of nodes currently in the graph.
    ///
    /// # Errors
    ///
    /// Returns an error if the count statement fails or yields no integer.
    async fn count_nodes(&self) -> Result<u64> {
        let response = self.execute(COUNT_NODES_STATEMENT).await?;
        response
            .first_value()
            .and_then(PropertyValue::as_int)
            .and_then(|count| u64::try_from(count).ok())
            .ok_or_else(|| GraphError::Store {
                message: format!("'{COUNT_NODES_STATEMENT}' returned no count"),
                source: None,
            })
    }
}

/// Boundary around a [`GraphStore`].
///
/// Every statement is logged at trace level together with its statistics.
/// Failures (including timeouts) are logged with the statement text and
/// replaced by [`GraphError::Database`], so store diagnostics never reach
/// callers.
#[derive(Clone)]
pub struct Database {
    store: Arc<dyn GraphStore>,
    timeout: Option<Duration>,
}

impl Database {
    /// Wrap `store` with no statement timeout.
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self {
            store,
            timeout: None,
        }
    }

    /// Abort statements that take longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configured statement timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// The wrapped store.
    pub fn inner(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    async fn run(&self, statement: &str) -> Result<StoreResponse> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.store.execute(statement))
                .await
                .map_err(|elapsed| {
                    GraphError::store(format!("statement timed out after {limit:?}"), Some(elapsed))
                })?,
            None => self.store.execute(statement).await,
        }
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl GraphStore for Database {
    async fn execute(&self, statement: &str) -> Result<StoreResponse> {
        match self.run(statement).await {
            Ok(response) => {
                trace!("QUERY: \"{}\" [{}]", statement, response.stats.join(", "));
                Ok(response)
            }
            Err(err) => {
                error!("Unable to run query: \"{statement}\"\n{err}");
                Err(GraphError::Database)
            }
        }
    }
}
