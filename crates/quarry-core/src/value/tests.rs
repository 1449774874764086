use super::*;
use crate::model::AttributePath;
use std::cmp::Ordering;

#[test]
fn numeric_families_compare_with_widening() {
    assert_eq!(Value::Int(3).compare(&Value::Uint(3)), Some(Ordering::Equal));
    assert_eq!(Value::Int(-1).compare(&Value::Uint(0)), Some(Ordering::Less));
    assert_eq!(
        Value::Uint(u64::MAX).compare(&Value::Int(i64::MAX)),
        Some(Ordering::Greater)
    );
}

#[test]
fn null_is_never_comparable() {
    assert_eq!(Value::Null.compare(&Value::Null), None);
    assert_eq!(Value::Null.loose_eq(&Value::Int(1)), None);
    assert_eq!(Value::Text("a".into()).compare(&Value::Int(1)), None);
}

#[test]
fn like_matches_wildcards() {
    assert!(like_match("testFindAll1", "test%", None));
    assert!(like_match("testFindAll1", "%All_", None));
    assert!(like_match("abc", "%", None));
    assert!(like_match("", "%", None));
    assert!(!like_match("abc", "ab", None));
    assert!(!like_match("abc", "_", None));
    assert!(like_match("aXbXc", "a%b%c", None));
}

#[test]
fn like_honors_escape_character() {
    assert!(like_match("100%", "100\\%", Some('\\')));
    assert!(!like_match("1000", "100\\%", Some('\\')));
    assert!(like_match("a_b", "a\\_b", Some('\\')));
    assert!(!like_match("axb", "a\\_b", Some('\\')));
}

#[test]
fn escape_like_makes_wildcards_literal() {
    let escaped = escape_like("50%_off\\", '\\');
    assert_eq!(escaped, "50\\%\\_off\\\\");

    let pattern = format!("%{escaped}%");
    assert!(like_match("get 50%_off\\ now", &pattern, Some('\\')));
    assert!(!like_match("get 50xxoff now", &pattern, Some('\\')));
}

#[test]
fn collection_helpers() {
    let list = Value::from(vec!["a", "b"]);
    assert!(list.contains_element(&Value::from("a")));
    assert!(!list.contains_element(&Value::from("z")));
    assert_eq!(list.is_empty_collection(), Some(false));
    assert_eq!(Value::Null.is_empty_collection(), Some(true));
    assert_eq!(Value::Int(1).is_empty_collection(), None);
}

#[test]
fn row_path_value_walks_embedded_maps() {
    let address = Row::new().with("city", "Graz").with("zip", "8010");
    let row = Row::new()
        .with("name", "x")
        .with("address", address.into_embedded());

    assert_eq!(
        row.path_value(&AttributePath::parse("address.city")),
        &Value::from("Graz")
    );
    assert_eq!(
        row.path_value(&AttributePath::parse("address.street")),
        &Value::Null
    );
    assert_eq!(row.path_value(&AttributePath::parse("name")), &Value::from("x"));
}

#[test]
fn typed_accessors_report_mismatches() {
    let row = Row::new().with("counter", "ten").with("id", 4_i64);

    assert_eq!(row.get_int("id"), Ok(Some(4)));
    assert_eq!(row.get_uint("id"), Ok(Some(4)));
    assert_eq!(row.get_int("missing"), Ok(None));
    assert!(matches!(
        row.get_int("counter"),
        Err(RowError::Type { expected: "int", .. })
    ));
    assert_eq!(
        Row::require(row.get_text("missing").unwrap(), "missing"),
        Err(RowError::Missing {
            field: "missing".to_string()
        })
    );
}

#[test]
fn display_renders_query_literals() {
    assert_eq!(Value::from("it's").to_string(), "'it''s'");
    assert_eq!(Value::from(vec![1_i64, 2]).to_string(), "(1, 2)");
    assert_eq!(Value::Null.to_string(), "null");
}
