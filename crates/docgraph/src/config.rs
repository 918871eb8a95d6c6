//! Runtime configuration.

use crate::compiler::DEFAULT_LABEL;
use crate::error::{GraphError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for ingestion and store access
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name of the graph statements run against
    pub graph_name: String,

    /// Label given to root entries of a compiled document
    pub default_label: String,

    /// Abort store statements after this long (None = no timeout)
    #[serde(with = "duration_option")]
    pub statement_timeout: Option<Duration>,

    /// JSON dataset to ingest at startup
    pub dataset: Option<PathBuf>,

    /// Ingest the dataset only when the graph holds no nodes
    pub ingest_when_empty: bool,
}

// Helper module for serializing Duration as whole seconds
mod duration_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => d.as_secs().serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs: Option<u64> = Option::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            graph_name: "docgraph".to_string(),
            default_label: DEFAULT_LABEL.to_string(),
            statement_timeout: Some(Duration::from_secs(30)),
            dataset: None,
            ingest_when_empty: true,
        }
    }
}

impl Config {
    /// Load a JSON config file; absent keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Io`] if the file cannot be read and
    /// [`GraphError::Serialization`] if it is not a valid config.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| GraphError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|e| {
            GraphError::serialization(format!("invalid config {}", path.display()), Some(e))
        })
    }

    /// Set the graph name
    pub fn with_graph_name(mut self, name: impl Into<String>) -> Self {
        self.graph_name = name.into();
        self
    }

    /// Set the root entry label
    pub fn with_default_label(mut self, label: impl Into<String>) -> Self {
        self.default_label = label.into();
        self
    }

    /// Set the statement timeout
    pub fn with_statement_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.statement_timeout = timeout;
        self
    }

    /// Set the dataset to ingest
    pub fn with_dataset(mut self, path: impl Into<PathBuf>) -> Self {
        self.dataset = Some(path.into());
        self
    }

    /// Ingest even when the graph already holds nodes
    pub fn with_ingest_when_empty(mut self, only_when_empty: bool) -> Self {
        self.ingest_when_empty = only_when_empty;
        self
    }
}
