//! Integration tests for startup ingestion.

use async_trait::async_trait;
use docgraph::ingest::{ensure_dataset, import_dataset, import_document, load_document};
use docgraph::{
    Config, DocumentCompiler, GraphError, GraphStore, IngestOutcome, MemoryStore, PropertyValue,
    Result, StoreResponse,
};
use serde_json::json;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::NamedTempFile;

/// Forwards to a [`MemoryStore`] and counts executed statements.
#[derive(Default)]
struct CountingStore {
    inner: MemoryStore,
    executed: AtomicUsize,
}

impl CountingStore {
    fn executed(&self) -> usize {
        self.executed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GraphStore for CountingStore {
    async fn execute(&self, statement: &str) -> Result<StoreResponse> {
        self.executed.fetch_add(1, Ordering::SeqCst);
        self.inner.execute(statement).await
    }
}

fn dataset_file(document: &serde_json::Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{document}").unwrap();
    file
}

fn posts() -> serde_json::Value {
    json!([
        {"id": 1, "title": "First", "user": {"id": 7, "name": "Ann"}},
        {"id": 2, "title": "Second", "comments": [{"id": 3, "body": "Nice"}]}
    ])
}

#[tokio::test]
async fn test_import_document_reports_counts() {
    let store = CountingStore::default();
    let report = import_document(&posts(), &DocumentCompiler::default(), &store)
        .await
        .unwrap();

    assert_eq!(report.nodes, 4);
    assert_eq!(report.relationships, 2);
    assert_eq!(report.statements(), 6);
    assert_eq!(store.executed(), 1);
    assert!(report.store_stats.contains(&"Nodes created: 4".to_string()));
    assert!(report
        .store_stats
        .contains(&"Relationships created: 2".to_string()));
}

#[tokio::test]
async fn test_malformed_document_executes_nothing() {
    let store = CountingStore::default();
    let document = json!([{"id": 1, "child list": [{"id": 2}]}]);

    let err = import_document(&document, &DocumentCompiler::default(), &store)
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::MalformedDocument { .. }));
    assert_eq!(store.executed(), 0);
}

#[tokio::test]
async fn test_reserved_field_name_fails_before_execution() {
    let store = CountingStore::default();
    for document in [json!({"return": 1}), json!([{"id": 1, "2fa": true}])] {
        let err = import_document(&document, &DocumentCompiler::default(), &store)
            .await
            .unwrap_err();
        assert!(matches!(err, GraphError::MalformedDocument { .. }));
    }
    assert_eq!(store.executed(), 0);
}

#[tokio::test]
async fn test_empty_document_executes_nothing() {
    let store = CountingStore::default();
    let report = import_document(&json!([]), &DocumentCompiler::default(), &store)
        .await
        .unwrap();
    assert_eq!(report.statements(), 0);
    assert!(report.store_stats.is_empty());
    assert_eq!(store.executed(), 0);
}

#[tokio::test]
async fn test_import_dataset_from_file() {
    let file = dataset_file(&posts());
    let store = MemoryStore::default();

    import_dataset(file.path(), &DocumentCompiler::default(), &store)
        .await
        .unwrap();
    assert_eq!(store.count_nodes().await.unwrap(), 4);
}

#[test]
fn test_load_document_rejects_invalid_json() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[{{\"id\": 1,").unwrap();

    let err = load_document(file.path()).unwrap_err();
    assert!(matches!(err, GraphError::Serialization { .. }));
}

#[tokio::test]
async fn test_ensure_dataset_imports_into_empty_graph_once() {
    let file = dataset_file(&posts());
    let config = Config::default().with_dataset(file.path());
    let store = CountingStore::default();

    let first = ensure_dataset(&config, &store).await.unwrap();
    assert!(matches!(first, IngestOutcome::Imported(_)));

    let second = ensure_dataset(&config, &store).await.unwrap();
    assert_eq!(second, IngestOutcome::Skipped { existing_nodes: 4 });
    // count, import, count
    assert_eq!(store.executed(), 3);
}

#[tokio::test]
async fn test_ensure_dataset_can_reimport() {
    let file = dataset_file(&posts());
    let config = Config::default()
        .with_dataset(file.path())
        .with_ingest_when_empty(false);
    let store = CountingStore::default();

    ensure_dataset(&config, &store).await.unwrap();
    let again = ensure_dataset(&config, &store).await.unwrap();

    assert!(matches!(again, IngestOutcome::Imported(_)));
    assert_eq!(store.inner.count_nodes().await.unwrap(), 4);
}

#[tokio::test]
async fn test_ensure_dataset_uses_configured_label() {
    let file = dataset_file(&posts());
    let config = Config::default()
        .with_dataset(file.path())
        .with_default_label("Question");
    let store = MemoryStore::default();

    ensure_dataset(&config, &store).await.unwrap();
    let questions = store
        .execute("MATCH (n:Question) RETURN count(n)")
        .await
        .unwrap();
    assert_eq!(questions.first_value(), Some(&PropertyValue::Int(2)));
}

#[tokio::test]
async fn test_ensure_dataset_without_dataset() {
    let store = CountingStore::default();
    let outcome = ensure_dataset(&Config::default(), &store).await.unwrap();
    assert_eq!(outcome, IngestOutcome::NoDataset);
    assert_eq!(store.executed(), 0);
}
