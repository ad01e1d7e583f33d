use super::*;
use std::io::Write;

#[test]
fn test_defaults_without_file() {
    let config = Config::default();
    assert_eq!(config.server.port, 8501);
    assert_eq!(config.gemini.model, "gemini-2.5-flash");
    assert!(config.gemini.api_key.expose_secret().is_empty());
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_toml_keeps_defaults() {
    let config: Config = toml::from_str(
        r#"
        [gemini]
        api_key = "AIza-from-file"
        "#,
    )
    .unwrap();
    assert_eq!(config.gemini.api_key.expose_secret(), "AIza-from-file");
    assert_eq!(config.gemini.base_url, "https://generativelanguage.googleapis.com");
    assert_eq!(config.server.host, "127.0.0.1");
}

#[test]
fn test_env_fallback_order() {
    let mut config = Config::default();
    config.resolve_api_key(|name| match name {
        "GNVI_GEMINI_API_KEY" => Some("   ".to_string()),
        "GEMINI_API_KEY" => Some("AIza-env".to_string()),
        _ => None,
    });
    assert_eq!(config.gemini.api_key.expose_secret(), "AIza-env");
}

#[test]
fn test_file_key_wins_over_env() {
    let mut config: Config = toml::from_str("[gemini]\napi_key = \"AIza-file\"").unwrap();
    config.resolve_api_key(|_| Some("AIza-env".to_string()));
    assert_eq!(config.gemini.api_key.expose_secret(), "AIza-file");
}

#[test]
fn test_missing_key_stays_empty() {
    let mut config = Config::default();
    config.resolve_api_key(|_| None);
    assert!(config.gemini.api_key.expose_secret().is_empty());
}

#[test]
fn test_validate_rejects_bad_base_url() {
    let config: Config = toml::from_str("[gemini]\nbase_url = \"ftp://example\"").unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("base_url"));
}

#[test]
fn test_load_from_reports_path_on_parse_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[server]\nport = \"not a number\"").unwrap();
    let err = Config::load_from(file.path()).unwrap_err();
    assert!(matches!(err, GnviError::ConfigParse { .. }));
}

#[test]
fn test_debug_does_not_leak_key() {
    let config: Config = toml::from_str("[gemini]\napi_key = \"AIza-secret\"").unwrap();
    assert!(!format!("{:?}", config).contains("AIza-secret"));
}
