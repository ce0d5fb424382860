//! Configuration Integration Tests

use std::fs;

use mindmate::storage::resolve_api_key_from;
use mindmate::{AppError, ConfigService, KeySource, SettingsUpdate};
use mindmate_llm::GeminiClient;

#[test]
fn test_config_file_to_client() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("config.json");
    fs::write(
        &path,
        r#"{"model":"gemini-1.5-flash","api_key":"file-key","max_retries":5}"#,
    )
    .unwrap();

    let service = ConfigService::with_path(&path).unwrap();
    let config = service.get_config();
    assert_eq!(config.max_retries, 5);

    let (key, source) = resolve_api_key_from(None, config).unwrap();
    assert_eq!(source, KeySource::ConfigFile);

    let client = GeminiClient::new(config.to_gemini_config(key)).unwrap();
    assert_eq!(client.model(), "gemini-1.5-flash");
    assert_eq!(client.config().retry.max_retries, 5);
}

#[test]
fn test_update_persists_to_disk() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("config.json");
    let mut service = ConfigService::with_path(&path).unwrap();

    service
        .update_config(SettingsUpdate {
            request_timeout_secs: Some(60),
            ..Default::default()
        })
        .unwrap();

    let reloaded = ConfigService::with_path(&path).unwrap();
    assert_eq!(reloaded.get_config().transport.request_timeout_secs, 60);
}

#[test]
fn test_malformed_file_is_serialization_error() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("config.json");
    fs::write(&path, "{ not json").unwrap();

    let err = ConfigService::with_path(&path).unwrap_err();
    assert!(matches!(err, AppError::Serialization(_)));
}

#[test]
fn test_api_key_not_written_when_absent() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("config.json");
    ConfigService::with_path(&path).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(!content.contains("api_key"));
}
