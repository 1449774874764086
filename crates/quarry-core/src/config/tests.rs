use super::*;

#[test]
fn empty_document_yields_defaults() {
    let config = QueryConfig::from_toml_str("").unwrap();
    assert_eq!(config, QueryConfig::default());
    assert_eq!(config.default_page_size, 10);
    assert_eq!(config.backend, Backend::Text);
    assert_eq!(config.entity_alias, "e");
    assert!(config.strict_arity);
}

#[test]
fn partial_document_overrides_fields() {
    let config =
        QueryConfig::from_toml_str("default_page_size = 4\nbackend = \"criteria\"\n").unwrap();
    assert_eq!(config.default_page_size, 4);
    assert_eq!(config.backend, Backend::Criteria);
    assert_eq!(config.entity_alias, "e");
}

#[test]
fn zero_page_size_is_rejected() {
    let err = QueryConfig::from_toml_str("default_page_size = 0").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn bad_alias_is_rejected() {
    for alias in ["", "1e", "a b"] {
        let source = format!("entity_alias = \"{alias}\"");
        let err = QueryConfig::from_toml_str(&source).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "alias {alias:?}");
    }
}

#[test]
fn unknown_keys_fail_to_parse() {
    let err = QueryConfig::from_toml_str("page = 3").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn missing_file_reports_io() {
    let err = QueryConfig::from_path("/nonexistent/quarry.toml").unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn serializes_through_json() {
    let config = QueryConfig::default().with_backend(Backend::Criteria);
    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains("\"backend\":\"criteria\""));

    let back: QueryConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
}

#[test]
fn reserved_word_alias_is_rejected() {
    for alias in ["from", "WHERE", "Order", "by", "select"] {
        let source = format!("entity_alias = \"{alias}\"");
        let err = QueryConfig::from_toml_str(&source).unwrap_err();
        assert!(
            matches!(&err, ConfigError::Invalid(msg) if msg.contains("reserved")),
            "alias {alias:?}"
        );
    }

    let config = QueryConfig::from_toml_str("entity_alias = \"fromage\"").unwrap();
    assert_eq!(config.entity_alias, "fromage");
}
