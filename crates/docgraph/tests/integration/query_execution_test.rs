//! Integration tests for executing field selections against ingested data.

use async_trait::async_trait;
use docgraph::ingest::import_document;
use docgraph::{
    Database, DocumentCompiler, Executor, GraphError, GraphStore, MemoryStore, Result, Schema,
    Selection, StoreResponse,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// Records every statement, failing those that contain `fail_on`.
struct RecordingStore {
    inner: MemoryStore,
    statements: Mutex<Vec<String>>,
    fail_on: Option<&'static str>,
}

impl RecordingStore {
    async fn loaded(fail_on: Option<&'static str>) -> Arc<Self> {
        let inner = MemoryStore::new("test");
        import_document(&dataset(), &DocumentCompiler::default(), &inner)
            .await
            .unwrap();
        Arc::new(Self {
            inner,
            statements: Mutex::new(Vec::new()),
            fail_on,
        })
    }

    fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }
}

#[async_trait]
impl GraphStore for RecordingStore {
    async fn execute(&self, statement: &str) -> Result<StoreResponse> {
        self.statements.lock().unwrap().push(statement.to_string());
        if self.fail_on.is_some_and(|needle| statement.contains(needle)) {
            return Err(GraphError::store("connection reset", None::<std::io::Error>));
        }
        self.inner.execute(statement).await
    }
}

fn dataset() -> Value {
    json!([
        {
            "id": 1,
            "title": "How do I exit vim?",
            "score": 12,
            "user": {"id": 10, "name": "Ann"},
            "comments": [
                {"id": 2, "body": "Try :q"},
                {"id": 3, "body": "Or :wq", "user": {"id": 11, "name": "Bob"}}
            ],
            "answers": [
                {"id": 4, "body": "Press escape first", "accepted": true}
            ]
        },
        {"id": 5, "title": "Tabs or spaces?", "score": 3}
    ])
}

fn executor(store: Arc<dyn GraphStore>) -> Executor {
    Executor::new(Arc::new(Schema::dataset()), store)
}

#[tokio::test]
async fn test_nested_selection() {
    let store = RecordingStore::loaded(None).await;
    let response = executor(store)
        .execute(&[Selection::new("posts")
            .select(Selection::new("title"))
            .select(Selection::new("user").select(Selection::new("name")))
            .select(
                Selection::new("comments")
                    .select(Selection::new("body"))
                    .select(Selection::new("user").select(Selection::new("name"))),
            )])
        .await;

    assert!(response.errors.is_empty());
    assert_eq!(
        response.data,
        json!({
            "posts": [
                {
                    "title": "How do I exit vim?",
                    "user": {"name": "Ann"},
                    "comments": [
                        {"body": "Try :q", "user": null},
                        {"body": "Or :wq", "user": {"name": "Bob"}}
                    ]
                },
                {"title": "Tabs or spaces?", "user": null, "comments": []}
            ]
        })
    );
}

#[tokio::test]
async fn test_one_statement_per_resolved_field() {
    let store = RecordingStore::loaded(None).await;
    executor(store.clone())
        .execute(&[Selection::new("posts").select(Selection::new("title"))])
        .await;

    let statements = store.statements();
    assert_eq!(statements.len(), 1 + 2);
    assert_eq!(statements[0], "MATCH (n:Post) RETURN id(n)");
    assert!(statements[1..]
        .iter()
        .all(|s| s.ends_with("RETURN n.title")));
}

#[tokio::test]
async fn test_identity_field_issues_no_statement() {
    let store = RecordingStore::loaded(None).await;
    let response = executor(store.clone())
        .execute(&[Selection::new("posts").select(Selection::new("_id"))])
        .await;

    assert_eq!(store.statements().len(), 1);
    let ids = response.data["posts"].as_array().unwrap();
    assert_eq!(ids.len(), 2);
    assert!(ids.iter().all(|post| post["_id"].is_u64()));
}

#[tokio::test]
async fn test_failed_field_is_null_with_path() {
    let store = RecordingStore::loaded(Some("RETURN n.title")).await;
    let database = Database::new(store);
    let response = executor(Arc::new(database))
        .execute(&[Selection::new("posts")
            .select(Selection::new("title"))
            .select(Selection::new("score"))])
        .await;

    assert_eq!(
        response.data,
        json!({
            "posts": [
                {"title": null, "score": 12},
                {"title": null, "score": 3}
            ]
        })
    );
    assert_eq!(response.errors.len(), 2);
    for error in &response.errors {
        assert_eq!(error.message, GraphError::Database.to_string());
    }
    let paths: Vec<Value> = response.to_json()["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["path"].clone())
        .collect();
    assert!(paths.contains(&json!(["posts", 0, "title"])));
    assert!(paths.contains(&json!(["posts", 1, "title"])));
}

#[tokio::test]
async fn test_unwrapped_store_failure_stays_generic() {
    let store = RecordingStore::loaded(Some("MATCH (n:Post)")).await;
    let response = executor(store)
        .execute(&[Selection::new("posts").select(Selection::new("title"))])
        .await;

    assert_eq!(response.data, json!({"posts": null}));
    assert_eq!(response.errors.len(), 1);
    let message = &response.errors[0].message;
    assert_eq!(message, "Database error occurred. See server logs.");
    assert!(!message.contains("connection reset"));
    assert!(!message.contains("MATCH"));
}

#[tokio::test]
async fn test_unknown_field_message_reaches_caller() {
    let store = RecordingStore::loaded(None).await;
    let response = executor(store)
        .execute(&[Selection::new("posts").select(Selection::new("nope"))])
        .await;
    assert!(response.errors[0].message.contains("nope"));
}

#[tokio::test]
async fn test_failed_entry_point_leaves_siblings() {
    let store = RecordingStore::loaded(Some("MATCH (n:User)")).await;
    let response = executor(Arc::new(Database::new(store)))
        .execute(&[
            Selection::new("users").select(Selection::new("name")),
            Selection::new("posts")
                .with_alias("questions")
                .select(Selection::new("score")),
        ])
        .await;

    assert_eq!(response.data["users"], Value::Null);
    assert_eq!(
        response.data["questions"],
        json!([{"score": 12}, {"score": 3}])
    );
    assert_eq!(response.errors.len(), 1);
    assert_eq!(
        response.to_json()["errors"][0]["path"],
        json!(["users"])
    );
}

#[tokio::test]
async fn test_search_resolves_union_members() {
    let store = RecordingStore::loaded(None).await;
    let response = executor(store)
        .execute(&[Selection::new("search")
            .with_argument("keywords", "body:escape")
            .select(Selection::new("__typename"))
            .select(Selection::new("accepted"))])
        .await;

    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.data,
        json!({"search": [{"__typename": "Answer", "accepted": true}]})
    );
}

#[tokio::test]
async fn test_search_without_keywords_returns_everything() {
    let store = RecordingStore::loaded(None).await;
    let response = executor(store)
        .execute(&[Selection::new("search").select(Selection::new("__typename"))])
        .await;

    // two posts, two users, two comments, one answer
    assert_eq!(response.data["search"].as_array().unwrap().len(), 7);
}

#[tokio::test]
async fn test_user_backlinks() {
    let store = RecordingStore::loaded(None).await;
    let response = executor(store)
        .execute(&[Selection::new("users")
            .select(Selection::new("name"))
            .select(Selection::new("posts").select(Selection::new("title")))
            .select(Selection::new("comments").select(Selection::new("body")))])
        .await;

    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.data,
        json!({
            "users": [
                {"name": "Ann", "posts": [{"title": "How do I exit vim?"}], "comments": []},
                {"name": "Bob", "posts": [], "comments": [{"body": "Or :wq"}]}
            ]
        })
    );
}

#[tokio::test]
async fn test_selection_errors() {
    let store = RecordingStore::loaded(None).await;
    let response = executor(store)
        .execute(&[
            Selection::new("posts").select(Selection::new("nope")),
            Selection::new("users"),
        ])
        .await;

    assert_eq!(response.data["posts"], json!([{"nope": null}, {"nope": null}]));
    assert_eq!(response.data["users"], json!([null, null]));
    assert_eq!(response.errors.len(), 4);
}
