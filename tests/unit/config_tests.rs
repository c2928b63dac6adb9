// Configuration module unit tests

use rstest::rstest;
use shrinkray::config::*;
use std::io::Write;

#[test]
fn test_defaults_match_legacy_deployment() {
    let config = Config::default();
    assert_eq!(config.origin.scheme, "https");
    assert_eq!(config.origin.host, "monurl.com");
    assert_eq!(config.public.scheme, "http");
    assert_eq!(config.public.host, "manouvelleurl.com");
    assert_eq!(config.optimizer.jpeg_quality, 30);
    assert_eq!(config.server.listen_addr(), "0.0.0.0:80");
    assert!(config.server.metrics_path.is_none());
    assert!(config.validate().is_ok());
}

#[test]
fn test_can_deserialize_full_yaml_config() {
    let yaml = r#"
server:
  address: "127.0.0.1"
  port: 8080
  threads: 2
  metrics_path: "/_metrics"
origin:
  scheme: "http"
  host: "origin.internal:9000"
  timeout_seconds: 5
  follow_redirects: false
public:
  scheme: "https"
  host: "cdn.example.com"
optimizer:
  jpeg_quality: 55
  ignore_mime_parameters: true
rewrite:
  scope: text
cache:
  max_entries: 10000
compression:
  enabled: false
logging:
  level: "debug"
  format: pretty
"#;
    let config = Config::from_yaml_with_env(yaml).expect("Failed to parse YAML");

    assert_eq!(config.server.listen_addr(), "127.0.0.1:8080");
    assert_eq!(config.server.metrics_path.as_deref(), Some("/_metrics"));
    assert_eq!(config.origin.host, "origin.internal:9000");
    assert!(!config.origin.follow_redirects);
    assert_eq!(config.public.host, "cdn.example.com");
    assert_eq!(config.optimizer.jpeg_quality, 55);
    assert!(config.optimizer.ignore_mime_parameters);
    assert_eq!(config.rewrite.scope, RewriteScope::Text);
    assert_eq!(config.cache.max_entries, Some(10000));
    assert!(!config.compression.enabled);
    assert_eq!(config.logging.format, LogFormat::Pretty);
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_yaml_keeps_defaults() {
    let config = Config::from_yaml_with_env("public:\n  host: \"example.org\"\n").unwrap();
    assert_eq!(config.public.host, "example.org");
    assert_eq!(config.public.scheme, "http");
    assert_eq!(config.origin.host, "monurl.com");
}

#[test]
fn test_env_var_substitution() {
    std::env::set_var("SHRINKRAY_TEST_ORIGIN_HOST", "substituted.example.com");
    let yaml = "origin:\n  host: \"${SHRINKRAY_TEST_ORIGIN_HOST}\"\n";

    let config = Config::from_yaml_with_env(yaml).unwrap();
    assert_eq!(config.origin.host, "substituted.example.com");
}

#[test]
fn test_missing_env_var_is_an_error() {
    let yaml = "origin:\n  host: \"${SHRINKRAY_TEST_UNSET_VARIABLE}\"\n";
    let err = Config::from_yaml_with_env(yaml).unwrap_err();
    assert!(matches!(err, ConfigError::MissingEnvVar(name) if name == "SHRINKRAY_TEST_UNSET_VARIABLE"));
}

#[test]
fn test_invalid_yaml_is_an_error() {
    let err = Config::from_yaml_with_env("server: [unclosed").unwrap_err();
    assert!(matches!(err, ConfigError::Yaml(_)));
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "optimizer:\n  jpeg_quality: 80").unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.optimizer.jpeg_quality, 80);
}

#[test]
fn test_missing_file_is_io_error() {
    let err = Config::from_file("/nonexistent/shrinkray.yaml").unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[rstest]
#[case::bad_origin_scheme("origin:\n  scheme: ftp\n")]
#[case::bad_public_scheme("public:\n  scheme: gopher\n")]
#[case::empty_origin_host("origin:\n  host: \"\"\n")]
#[case::blank_public_host("public:\n  host: \"  \"\n")]
#[case::zero_timeout("origin:\n  timeout_seconds: 0\n")]
#[case::quality_zero("optimizer:\n  jpeg_quality: 0\n")]
#[case::quality_too_high("optimizer:\n  jpeg_quality: 101\n")]
#[case::zero_threads("server:\n  threads: 0\n")]
#[case::relative_metrics_path("server:\n  metrics_path: metrics\n")]
#[case::zero_max_entries("cache:\n  max_entries: 0\n")]
#[case::compression_level("compression:\n  level: 12\n")]
fn test_validate_rejects(#[case] yaml: &str) {
    let config = Config::from_yaml_with_env(yaml).unwrap();
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
}
