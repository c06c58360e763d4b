use mzlayout::config::*;
use mzlayout::error::MzError;

#[test]
fn test_layout_config_creation() {
    let config = LayoutConfig::default();

    // Test that all default configurations are properly initialized
    assert_eq!(config.io.max_file_size, 100 * 1024 * 1024);
    assert_eq!(config.strings.min_length, 4);
    assert!(config.strings.ascii);
    assert!(config.strings.unicode);
    assert_eq!(config.hex.row_length, 16);
    assert!(config.regions.hide_zero_segments);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_modification() {
    let mut config = StringsConfig::default();

    config.min_length = 8;
    config.unicode = false;

    assert_eq!(config.min_length, 8);
    assert!(!config.unicode);
    assert!(config.ascii);
}

#[test]
fn test_nested_config_access() {
    let mut config = LayoutConfig::default();

    config.hex.row_length = 32;
    config.io.max_file_size = 1024;
    config.regions.hide_zero_segments = false;

    assert_eq!(config.hex.row_length, 32);
    assert_eq!(config.io.max_file_size, 1024);
    assert!(!config.regions.hide_zero_segments);
}

#[test]
fn test_json_round_trip() {
    let mut config = LayoutConfig::default();
    config.strings.min_length = 6;
    config.hex.row_length = 8;

    let json = config.to_json_string().unwrap();
    let parsed = LayoutConfig::from_json_str(&json).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn test_partial_json_uses_defaults() {
    let config = LayoutConfig::from_json_str(r#"{"regions": {"hide_zero_segments": false}}"#).unwrap();
    assert!(!config.regions.hide_zero_segments);
    assert_eq!(config.strings, StringsConfig::default());
    assert_eq!(config.hex, HexConfig::default());

    assert_eq!(LayoutConfig::from_json_str("{}").unwrap(), LayoutConfig::default());
}

#[test]
fn test_invalid_values_are_rejected() {
    for json in [
        r#"{"hex": {"row_length": 0}}"#,
        r#"{"strings": {"min_length": 0}}"#,
        r#"{"hex": {"row_length": "wide"}}"#,
        "not json",
    ] {
        assert!(
            matches!(LayoutConfig::from_json_str(json), Err(MzError::Config(_))),
            "{} should be rejected",
            json
        );
    }
}

#[test]
fn test_missing_config_file() {
    let err = LayoutConfig::from_json_file("/nonexistent/mzlayout.json").unwrap_err();
    assert!(matches!(err, MzError::Io(_)));
}
