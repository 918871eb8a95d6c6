//! Unit tests for the document compiler's statement output.

use docgraph::{DocumentCompiler, GraphError, Statement};
use serde_json::json;

fn render(document: serde_json::Value) -> String {
    DocumentCompiler::default().compile(&document).unwrap().render()
}

#[test]
fn test_compilation_is_deterministic() {
    let doc = json!({
        "id": 1,
        "title": "How do I exit vim?",
        "user": {"id": 10, "name": "Ann"},
        "comments": [{"id": 2, "body": "Try :q"}, {"id": 3, "body": "Reboot"}]
    });

    let compiler = DocumentCompiler::default();
    let first = compiler.compile(&doc).unwrap();
    let second = compiler.compile(&doc).unwrap();
    assert_eq!(first.render(), second.render());
    assert_eq!(first.statements(), second.statements());
}

#[test]
fn test_ids_increase_in_pre_order() {
    let doc = json!({
        "id": 1,
        "answers": [
            {"id": 2, "comments": [{"id": 3}]},
            {"id": 4}
        ],
        "user": {"id": 5}
    });
    let builder = DocumentCompiler::default().compile(&doc).unwrap();

    let node_ids: Vec<u64> = builder
        .statements()
        .iter()
        .filter_map(|s| match s {
            Statement::MergeNode { id, .. } => Some(*id),
            _ => None,
        })
        .collect();
    assert_eq!(node_ids, vec![0, 1, 2, 3, 4]);
    assert_eq!(builder.next_id(), 5);
}

#[test]
fn test_every_relationship_targets_its_parent() {
    let doc = json!({
        "id": 1,
        "answers": [{"id": 2, "comments": [{"id": 3}]}]
    });
    assert_eq!(
        render(doc),
        "MERGE (n0:Post {id: 1})\n\
         MERGE (n1:Answer {id: 2})\n\
         MERGE (n1)-[:answer]->(n0)\n\
         MERGE (n2:Comment {id: 3})\n\
         MERGE (n2)-[:comment]->(n1)\n"
    );
}

#[test]
fn test_structural_fields_never_become_properties() {
    let doc = json!({
        "id": 1,
        "meta": {"views": 3},
        "tags": [{"name": "vim"}],
        "title": "t"
    });
    let builder = DocumentCompiler::default().compile(&doc).unwrap();

    for statement in builder.statements() {
        if let Statement::MergeNode { properties, .. } = statement {
            assert!(properties.iter().all(|(k, _)| k != "meta" && k != "tags"));
        }
    }

    // Scalars keep declaration order even when structural fields sit between them.
    assert!(builder.render().starts_with("MERGE (n0:Post {id: 1, title: 't'})\n"));
    assert!(builder.render().contains("MERGE (n1:Meta {views: 3})\nMERGE (n1)-[:meta]->(n0)\n"));
}

#[test]
fn test_arrays_are_transparent() {
    let doc = json!({"tags": [{"name": "a"}, {"name": "b"}]});
    assert_eq!(
        render(doc),
        "MERGE (n1:Tag {name: 'a'})\n\
         MERGE (n1)-[:tag]->(n0)\n\
         MERGE (n2:Tag {name: 'b'})\n\
         MERGE (n2)-[:tag]->(n0)\n"
    );
}

#[test]
fn test_nested_arrays_keep_the_field_relation() {
    let doc = json!({"id": 1, "tags": [[{"name": "a"}], [{"name": "b"}]]});
    assert_eq!(
        render(doc),
        "MERGE (n0:Post {id: 1})\n\
         MERGE (n1:Tag {name: 'a'})\n\
         MERGE (n1)-[:tag]->(n0)\n\
         MERGE (n2:Tag {name: 'b'})\n\
         MERGE (n2)-[:tag]->(n0)\n"
    );
}

#[test]
fn test_root_array_entries_get_default_label() {
    let doc = json!([{"id": 1}, {"id": 2}]);
    assert_eq!(render(doc), "MERGE (n0:Post {id: 1})\nMERGE (n1:Post {id: 2})\n");
}

#[test]
fn test_empty_object_consumes_an_id() {
    let doc = json!({"id": 1, "user": {}, "comments": [{"id": 2}]});
    assert_eq!(
        render(doc),
        "MERGE (n0:Post {id: 1})\n\
         MERGE (n2:Comment {id: 2})\n\
         MERGE (n2)-[:comment]->(n0)\n"
    );
}

#[test]
fn test_structural_only_object_still_parents_children() {
    let doc = json!({"thread": {"posts": [{"id": 7}]}});
    assert_eq!(
        render(doc),
        "MERGE (n2:Post {id: 7})\nMERGE (n2)-[:post]->(n1)\n"
    );
}

#[test]
fn test_string_escaping() {
    let doc = json!({"body": r"it's C:\temp"});
    assert_eq!(render(doc), "MERGE (n0:Post {body: 'it\\'s C:\\\\temp'})\n");
}

#[test]
fn test_natural_forms_for_non_strings() {
    let doc = json!({"score": -3, "ratio": 0.5, "accepted": true});
    assert_eq!(
        render(doc),
        "MERGE (n0:Post {score: -3, ratio: 0.5, accepted: true})\n"
    );
}

#[test]
fn test_scalar_array_elements_are_dropped() {
    let doc = json!({"id": 1, "tags": ["vim", "editor"]});
    assert_eq!(render(doc), "MERGE (n0:Post {id: 1})\n");
}

#[test]
fn test_malformed_documents() {
    let compiler = DocumentCompiler::default();
    assert!(matches!(
        compiler.compile(&json!("just text")),
        Err(GraphError::MalformedDocument { .. })
    ));
    assert!(matches!(
        compiler.compile(&json!({"id": 1, "bad-key": 2})),
        Err(GraphError::MalformedDocument { .. })
    ));
    assert!(matches!(
        compiler.compile(&json!({"id": 1, "child list": [{"id": 2}]})),
        Err(GraphError::MalformedDocument { .. })
    ));
}

#[test]
fn test_keyword_and_digit_leading_names_are_malformed() {
    let compiler = DocumentCompiler::default();
    for document in [
        json!({"2fa": true}),
        json!({"return": 1}),
        json!({"id": 1, "NULL": 2}),
        json!({"id": 1, "returns": [{"id": 2}]}),
        json!({"id": 1, "match": {"id": 2}}),
    ] {
        assert!(
            matches!(
                compiler.compile(&document),
                Err(GraphError::MalformedDocument { .. })
            ),
            "{document} should be rejected"
        );
    }

    // Keywords embedded in longer names are ordinary identifiers.
    assert_eq!(
        render(json!({"returned": true, "_matches": 2})),
        "MERGE (n0:Post {returned: true, _matches: 2})\n"
    );
}
