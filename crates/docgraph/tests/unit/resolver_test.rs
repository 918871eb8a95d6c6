//! Unit tests for field resolvers against scripted and in-memory stores.

use async_trait::async_trait;
use docgraph::resolver::KEYWORDS_ARGUMENT;
use docgraph::{
    Direction, GraphError, GraphStore, MemoryStore, Multiplicity, NodeRef, PropertyValue,
    Resolved, Resolver, Result, StoreResponse,
};
use serde_json::{Map, Value};
use std::sync::Mutex;

/// Records every statement and answers with a fixed table.
struct ScriptedStore {
    rows: Vec<Vec<PropertyValue>>,
    seen: Mutex<Vec<String>>,
}

impl ScriptedStore {
    fn new(rows: Vec<Vec<PropertyValue>>) -> Self {
        Self {
            rows,
            seen: Mutex::new(Vec::new()),
        }
    }

    fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl GraphStore for ScriptedStore {
    async fn execute(&self, statement: &str) -> Result<StoreResponse> {
        self.seen.lock().unwrap().push(statement.to_string());
        Ok(StoreResponse {
            columns: Vec::new(),
            rows: self.rows.clone(),
            stats: Vec::new(),
        })
    }
}

fn no_args() -> Map<String, Value> {
    Map::new()
}

#[tokio::test]
async fn test_identity_issues_no_query() {
    let store = ScriptedStore::new(Vec::new());
    let resolved = Resolver::Identity
        .resolve(&store, Some(&NodeRef::new(12)), &no_args())
        .await
        .unwrap();
    assert_eq!(resolved, Resolved::Scalar(PropertyValue::Int(12)));
    assert!(store.seen().is_empty());
}

#[tokio::test]
async fn test_property_returns_first_cell() {
    let store = ScriptedStore::new(vec![vec!["Exit vim?".into()]]);
    let resolved = Resolver::property("title")
        .resolve(&store, Some(&NodeRef::new(0)), &no_args())
        .await
        .unwrap();
    assert_eq!(resolved, Resolved::Scalar("Exit vim?".into()));
    assert_eq!(store.seen(), vec!["MATCH (n) WHERE id(n)=0 RETURN n.title"]);
}

#[tokio::test]
async fn test_property_on_unknown_node_is_null() {
    let store = MemoryStore::default();
    let resolved = Resolver::property("title")
        .resolve(&store, Some(&NodeRef::new(99)), &no_args())
        .await
        .unwrap();
    assert_eq!(resolved, Resolved::Scalar(PropertyValue::Null));
}

#[tokio::test]
async fn test_single_relation_without_match_is_none() {
    let store = ScriptedStore::new(Vec::new());
    let resolver = Resolver::relation(Multiplicity::Single, "user", Direction::Incoming);
    let resolved = resolver
        .resolve(&store, Some(&NodeRef::new(3)), &no_args())
        .await
        .unwrap();
    assert_eq!(resolved, Resolved::Reference(None));
    assert_eq!(
        store.seen(),
        vec!["MATCH (n)<-[:user]-(r) WHERE id(n)=3 RETURN id(r)"]
    );
}

#[tokio::test]
async fn test_many_relation_keeps_store_order() {
    let store = ScriptedStore::new(vec![vec![5i64.into()], vec![2i64.into()]]);
    let resolver =
        Resolver::relation_to(Multiplicity::Many, "user", Direction::Outgoing, "Comment");
    let resolved = resolver
        .resolve(&store, Some(&NodeRef::new(1)), &no_args())
        .await
        .unwrap();
    assert_eq!(
        resolved,
        Resolved::References(vec![NodeRef::new(5), NodeRef::new(2)])
    );
    assert_eq!(
        store.seen(),
        vec!["MATCH (n)-[:user]->(r:Comment) WHERE id(n)=1 RETURN id(r)"]
    );
}

#[tokio::test]
async fn test_search_entry_types_each_hit() {
    let store = ScriptedStore::new(vec![
        vec![0i64.into(), PropertyValue::List(vec!["Post".into()])],
        vec![4i64.into(), PropertyValue::List(vec!["Answer".into()])],
    ]);
    let mut args = no_args();
    args.insert(KEYWORDS_ARGUMENT.into(), Value::from("vim title:exit"));

    let resolved = Resolver::SearchEntry
        .resolve(&store, None, &args)
        .await
        .unwrap();
    assert_eq!(
        resolved,
        Resolved::References(vec![NodeRef::typed(0, "Post"), NodeRef::typed(4, "Answer")])
    );
    assert_eq!(
        store.seen(),
        vec!["MATCH (n) WHERE n.`title` CONTAINS 'exit' RETURN id(n),labels(n)"]
    );
}

#[tokio::test]
async fn test_collection_entry() {
    let store = ScriptedStore::new(vec![vec![1i64.into()]]);
    let resolved = Resolver::collection("User")
        .resolve(&store, None, &no_args())
        .await
        .unwrap();
    assert_eq!(resolved, Resolved::References(vec![NodeRef::new(1)]));
    assert_eq!(store.seen(), vec!["MATCH (n:User) RETURN id(n)"]);
}

#[tokio::test]
async fn test_field_resolvers_need_a_source() {
    let store = ScriptedStore::new(Vec::new());
    for resolver in [
        Resolver::Identity,
        Resolver::property("id"),
        Resolver::relation(Multiplicity::Many, "comment", Direction::Incoming),
    ] {
        let err = resolver.resolve(&store, None, &no_args()).await.unwrap_err();
        assert!(matches!(err, GraphError::InvalidOperation { .. }));
    }
    assert!(store.seen().is_empty());
}

#[test]
fn test_entry_points() {
    assert!(Resolver::SearchEntry.is_entry_point());
    assert!(Resolver::collection("Post").is_entry_point());
    assert!(!Resolver::Identity.is_entry_point());
}

#[tokio::test]
async fn test_search_keywords_must_be_text() {
    let store = ScriptedStore::new(Vec::new());
    let mut args = no_args();
    args.insert(KEYWORDS_ARGUMENT.into(), Value::from(42));

    let err = Resolver::SearchEntry
        .resolve(&store, None, &args)
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::InvalidOperation { .. }));
    assert!(store.seen().is_empty());

    args.insert(KEYWORDS_ARGUMENT.into(), Value::Null);
    Resolver::SearchEntry
        .resolve(&store, None, &args)
        .await
        .unwrap();
    assert_eq!(store.seen(), vec!["MATCH (n)  RETURN id(n),labels(n)"]);
}

#[tokio::test]
async fn test_identity_keeps_large_ids_positive() {
    let store = ScriptedStore::new(Vec::new());
    let source = NodeRef::new(u64::MAX);
    let resolved = Resolver::Identity
        .resolve(&store, Some(&source), &no_args())
        .await
        .unwrap();
    assert_eq!(resolved, Resolved::Scalar(PropertyValue::Float(u64::MAX as f64)));
}
