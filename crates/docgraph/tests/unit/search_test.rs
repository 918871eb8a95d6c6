//! Unit tests for search text parsing and filter rendering.

use docgraph::search::{Comparator, PredicateTarget, SearchValue};
use docgraph::{SearchParams, SearchPredicate};

#[test]
fn test_free_text_with_filters() {
    let params = SearchParams::parse(r#"hello world score:5 name:"Bob""#);

    assert_eq!(params.free_text(), "hello world ");
    assert_eq!(
        params.predicates(),
        &[
            SearchPredicate {
                target: PredicateTarget::Property("score".into()),
                comparator: Comparator::Contains,
                value: SearchValue::Int(5),
            },
            SearchPredicate {
                target: PredicateTarget::Property("name".into()),
                comparator: Comparator::Contains,
                value: SearchValue::Str("Bob".into()),
            },
        ]
    );
    assert_eq!(
        params.to_filter_clause(),
        "WHERE n.`score` CONTAINS 5 AND n.`name` CONTAINS 'Bob'"
    );
}

#[test]
fn test_identifier_key_uses_equality() {
    let params = SearchParams::parse("_id:42");
    assert_eq!(params.free_text(), "");
    assert_eq!(
        params.predicates(),
        &[SearchPredicate {
            target: PredicateTarget::NodeId,
            comparator: Comparator::Equals,
            value: SearchValue::Int(42),
        }]
    );
    assert_eq!(params.to_filter_clause(), "WHERE id(n) = 42");
}

#[test]
fn test_no_filters_renders_nothing() {
    let params = SearchParams::parse("just some words");
    assert!(params.is_empty());
    assert_eq!(params.free_text(), "");
    assert_eq!(params.to_filter_clause(), "");
    assert_eq!(SearchParams::parse("").to_filter_clause(), "");
}

#[test]
fn test_trailing_text_is_dropped() {
    let params = SearchParams::parse("vim title:exit and more words");
    assert_eq!(params.free_text(), "vim ");
    assert_eq!(params.to_filter_clause(), "WHERE n.`title` CONTAINS 'exit'");
}

#[test]
fn test_text_between_filters_accumulates() {
    let params = SearchParams::parse("a score:1 b c body:x");
    assert_eq!(params.free_text(), "a b c ");
    assert_eq!(params.predicates().len(), 2);
}

#[test]
fn test_quoted_values_are_escaped() {
    let params = SearchParams::parse(r#"body:"it's a \ slash""#);
    assert_eq!(
        params.to_filter_clause(),
        r"WHERE n.`body` CONTAINS 'it\'s a \\ slash'"
    );
}

#[test]
fn test_quoted_digits_stay_strings() {
    let params = SearchParams::parse(r#"score:"5""#);
    assert_eq!(params.to_filter_clause(), "WHERE n.`score` CONTAINS '5'");
}

#[test]
fn test_non_numeric_bare_values_are_quoted() {
    let params = SearchParams::parse("title:vim _id:abc");
    assert_eq!(
        params.to_filter_clause(),
        "WHERE n.`title` CONTAINS 'vim' AND id(n) = 'abc'"
    );
}

#[test]
fn test_backticks_cannot_break_out_of_the_key() {
    let params = SearchParams::parse("n`) OR (1:2");
    assert_eq!(params.free_text(), "n`) OR ");
    assert_eq!(params.to_filter_clause(), "WHERE n.`(1` CONTAINS 2");
}

#[test]
fn test_display_matches_filter_clause() {
    let params = SearchParams::parse("score:3");
    assert_eq!(params.to_string(), params.to_filter_clause());
}
