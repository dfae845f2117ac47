//! Table-driven integration tests for the concrete filtering scenarios the
//! engine must get right, beyond the universal properties in
//! `properties.rs`.

use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{json, Value};
use squiggly_filter::{Engine, JsonValueNode};

fn document() -> Value {
    json!({
        "id": 101,
        "title": "Reactor maintenance window",
        "status": "open",
        "reporter": {
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "ada@example.com",
        },
        "tags": ["ops", "urgent"],
        "comments": [
            {"author": "grace", "body": "looks good"},
            {"author": "alan", "body": "ship it"},
        ],
        "actions": {
            "user": {"firstName": "Grace", "lastName": "Hopper"},
        },
    })
}

#[rstest]
#[case::field_list("id,title", json!({"id": 101, "title": "Reactor maintenance window"}))]
#[case::empty_filter("", json!({}))]
#[case::any_shallow_excludes_one("*,-status", json!({
    "id": 101,
    "title": "Reactor maintenance window",
    "reporter": {
        "firstName": "Ada",
        "lastName": "Lovelace",
        "email": "ada@example.com",
    },
    "tags": ["ops", "urgent"],
    "comments": [
        {"author": "grace", "body": "looks good"},
        {"author": "alan", "body": "ship it"},
    ],
    "actions": {
        "user": {"firstName": "Grace", "lastName": "Hopper"},
    },
}))]
#[case::nested_inclusion("id,reporter[firstName,lastName]", json!({
    "id": 101,
    "reporter": {"firstName": "Ada", "lastName": "Lovelace"},
}))]
#[case::any_deep_with_targeted_exclusion("**,reporter[-firstName]", json!({
    "id": 101,
    "title": "Reactor maintenance window",
    "status": "open",
    "reporter": {"lastName": "Lovelace", "email": "ada@example.com"},
    "tags": ["ops", "urgent"],
    "comments": [
        {"author": "grace", "body": "looks good"},
        {"author": "alan", "body": "ship it"},
    ],
    "actions": {
        "user": {"firstName": "Grace", "lastName": "Hopper"},
    },
}))]
#[case::dot_path_sugar_projects_like_brace_nesting("id,actions.user.firstName", json!({
    "id": 101,
    "actions": {"user": {"firstName": "Grace"}},
}))]
#[case::glob_matches_suffix("id,tags,comment*", json!({"id": 101, "tags": ["ops", "urgent"], "comments": [
    {"author": "grace", "body": "looks good"},
    {"author": "alan", "body": "ship it"},
]}))]
#[case::array_elements_filtered_individually("comments{author}", json!({
    "comments": [{"author": "grace"}, {"author": "alan"}],
}))]
fn filters_document_as_expected(#[case] filter_text: &str, #[case] expected: Value) {
    let engine: Engine<JsonValueNode> = Engine::new();
    let result = engine.apply_one(&JsonValueNode::from(document()), filter_text).expect("applies");
    assert_eq!(result.0, expected);
}

#[rstest]
fn value_function_transforms_matched_field() {
    let engine: Engine<JsonValueNode> = Engine::new();
    let result = engine.apply_one(&JsonValueNode::from(document()), "status@upper").expect("applies");
    assert_eq!(result.0, json!({"status": "OPEN"}));
}

#[rstest]
fn default_function_fills_in_missing_value() {
    let doc = json!({"nickname": null});
    let engine: Engine<JsonValueNode> = Engine::new();
    let result = engine.apply_one(&JsonValueNode::from(doc), r#"nickname@default("anon")"#).expect("applies");
    assert_eq!(result.0, json!({"nickname": "anon"}));
}

#[rstest]
fn unknown_function_surfaces_as_function_error() {
    let engine: Engine<JsonValueNode> = Engine::new();
    let err = engine.apply_one(&JsonValueNode::from(document()), "status@nonexistent").unwrap_err();
    assert!(matches!(err, squiggly_filter::FilterError::Function(_)));
}

#[rstest]
fn malformed_filter_surfaces_as_syntax_error() {
    let engine: Engine<JsonValueNode> = Engine::new();
    let err = engine.apply_one(&JsonValueNode::from(document()), "id,(unterminated").unwrap_err();
    assert!(matches!(err, squiggly_filter::FilterError::Syntax(_)));
}
