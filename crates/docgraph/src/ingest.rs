//! Startup ingestion of a JSON dataset.
//!
//! Ingestion is all-or-nothing: the whole document is compiled before the
//! store is touched, and the compiled statements are sent as one statement.
//! A document that fails to compile executes nothing.

use crate::compiler::DocumentCompiler;
use crate::config::Config;
use crate::error::{GraphError, Result};
use crate::query::Statement;
use crate::store::GraphStore;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::time::{Duration, Instant};

/// What one import did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Node statements compiled
    pub nodes: usize,

    /// Relationship statements compiled
    pub relationships: usize,

    /// Statistics reported by the store
    pub store_stats: Vec<String>,

    /// Compile plus execute time
    pub elapsed: Duration,
}

impl IngestReport {
    /// Total statements sent.
    pub fn statements(&self) -> usize {
        self.nodes + self.relationships
    }
}

/// Result of [`ensure_dataset`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The dataset was compiled and executed
    Imported(IngestReport),
    /// The graph already held nodes
    Skipped {
        /// Node count found in the store
        existing_nodes: u64,
    },
    /// No dataset is configured
    NoDataset,
}

/// Read and parse a JSON document.
///
/// # Errors
///
/// Returns [`GraphError::Io`] if the file cannot be read and
/// [`GraphError::Serialization`] if it is not JSON.
pub fn load_document(path: impl AsRef<Path>) -> Result<Value> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| GraphError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|e| {
        GraphError::serialization(format!("invalid JSON in {}", path.display()), Some(e))
    })
}

/// Compile `document` and execute the result in one statement.
///
/// # Errors
///
/// Returns [`GraphError::MalformedDocument`] without touching the store if
/// the document does not compile, or the store's error if execution fails.
pub async fn import_document(
    document: &Value,
    compiler: &DocumentCompiler,
    store: &dyn GraphStore,
) -> Result<IngestReport> {
    let started = Instant::now();
    let builder = compiler.compile(document)?;

    let relationships = builder
        .statements()
        .iter()
        .filter(|s| matches!(s, Statement::MergeEdge { .. }))
        .count();
    let nodes = builder.len() - relationships;

    let store_stats = if builder.is_empty() {
        debug!("Document compiled to no statements, nothing to execute");
        Vec::new()
    } else {
        store.execute(&builder.render()).await?.stats
    };

    Ok(IngestReport {
        nodes,
        relationships,
        store_stats,
        elapsed: started.elapsed(),
    })
}

/// Load, compile and execute the dataset at `path`.
///
/// # Errors
///
/// See [`load_document`] and [`import_document`].
pub async fn import_dataset(
    path: impl AsRef<Path>,
    compiler: &DocumentCompiler,
    store: &dyn GraphStore,
) -> Result<IngestReport> {
    let path = path.as_ref();
    let document = load_document(path)?;
    let report = import_document(&document, compiler, store).await?;
    info!(
        "Imported {}: {} nodes, {} relationships in {:?}",
        path.display(),
        report.nodes,
        report.relationships,
        report.elapsed
    );
    Ok(report)
}

/// Import the configured dataset, by default only into an empty graph.
///
/// # Errors
///
/// Returns any error from counting nodes or from [`import_dataset`].
pub async fn ensure_dataset(config: &Config, store: &dyn GraphStore) -> Result<IngestOutcome> {
    let Some(path) = &config.dataset else {
        debug!("No dataset configured");
        return Ok(IngestOutcome::NoDataset);
    };

    if config.ingest_when_empty {
        let existing_nodes = store.count_nodes().await?;
        if existing_nodes > 0 {
            info!("Graph '{}' holds {existing_nodes} nodes, skipping import", config.graph_name);
            return Ok(IngestOutcome::Skipped { existing_nodes });
        }
    }

    let compiler = DocumentCompiler::new(config.default_label.clone());
    import_dataset(path, &compiler, store)
        .await
        .map(IngestOutcome::Imported)
}
