// Configuration module
//
// Settings come from three layers, later layers winning:
//   1. built-in defaults
//   2. optional YAML file (with ${VAR} substitution)
//   3. the legacy deployment's environment variables
//      (INITIAL_PROTO, INITIAL_URI, FINAL_URL, FINAL_PROTO, JPEG_QUALITY)

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::cache::CacheConfig;
use crate::compression::CompressionConfig;

pub const ENV_ORIGIN_SCHEME: &str = "INITIAL_PROTO";
pub const ENV_ORIGIN_HOST: &str = "INITIAL_URI";
pub const ENV_PUBLIC_HOST: &str = "FINAL_URL";
pub const ENV_PUBLIC_SCHEME: &str = "FINAL_PROTO";
pub const ENV_JPEG_QUALITY: &str = "JPEG_QUALITY";

/// Errors raised while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Environment variable '{0}' is referenced but not set")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub origin: OriginConfig,
    pub public: PublicConfig,
    pub optimizer: OptimizerConfig,
    pub rewrite: RewriteConfig,
    pub cache: CacheConfig,
    pub compression: CompressionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
    pub threads: usize,
    /// Serve Prometheus metrics at this path instead of proxying it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_path: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 80,
            threads: 4,
            metrics_path: None,
        }
    }
}

impl ServerConfig {
    /// Socket address the listener binds to
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

/// Upstream the proxy fetches real content from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OriginConfig {
    pub scheme: String,
    pub host: String,
    pub timeout_seconds: u64,
    pub follow_redirects: bool,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            scheme: "https".to_string(),
            host: "monurl.com".to_string(),
            timeout_seconds: 30,
            follow_redirects: true,
        }
    }
}

/// Host and scheme presented to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublicConfig {
    pub scheme: String,
    pub host: String,
}

impl Default for PublicConfig {
    fn default() -> Self {
        Self {
            scheme: "http".to_string(),
            host: "manouvelleurl.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub enabled: bool,
    /// Lossy JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// Dispatch on the media type without parameters (`text/html; charset=utf-8` -> `text/html`)
    pub ignore_mime_parameters: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            jpeg_quality: 30,
            ignore_mime_parameters: false,
        }
    }
}

/// Which payloads go through the reference rewriter
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RewriteScope {
    /// Only textual content types (and payloads without a content type)
    Text,
    /// Every payload, binary included
    #[default]
    All,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteConfig {
    pub scope: RewriteScope,
}

/// Log output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by RUST_LOG
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

impl Config {
    /// Defaults plus environment overrides
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, ConfigError> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            if std::env::var(var_name).is_err() {
                return Err(ConfigError::MissingEnvVar(var_name.to_string()));
            }
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        if substituted.trim().is_empty() {
            return Ok(Config::default());
        }

        Ok(serde_yaml::from_str(&substituted)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_with_env(&yaml)
    }

    /// Apply the legacy deployment environment variables.
    ///
    /// Unset or empty variables leave the current value untouched. An unparsable
    /// `JPEG_QUALITY` is ignored; a parsable one is clamped to 1-100.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    pub(crate) fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(scheme) = non_empty(ENV_ORIGIN_SCHEME) {
            self.origin.scheme = scheme;
        }
        if let Some(host) = non_empty(ENV_ORIGIN_HOST) {
            self.origin.host = host;
        }
        if let Some(host) = non_empty(ENV_PUBLIC_HOST) {
            self.public.host = host;
        }
        if let Some(scheme) = non_empty(ENV_PUBLIC_SCHEME) {
            self.public.scheme = scheme;
        }
        if let Some(quality) = non_empty(ENV_JPEG_QUALITY).and_then(|v| v.trim().parse::<i64>().ok()) {
            self.optimizer.jpeg_quality = quality.clamp(1, 100) as u8;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_scheme("origin.scheme", &self.origin.scheme)?;
        validate_scheme("public.scheme", &self.public.scheme)?;

        if self.origin.host.trim().is_empty() {
            return Err(ConfigError::Invalid("origin.host cannot be empty".to_string()));
        }
        if self.public.host.trim().is_empty() {
            return Err(ConfigError::Invalid("public.host cannot be empty".to_string()));
        }
        if self.origin.timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "origin.timeout_seconds must be greater than 0".to_string(),
            ));
        }
        if !(1..=100).contains(&self.optimizer.jpeg_quality) {
            return Err(ConfigError::Invalid(format!(
                "optimizer.jpeg_quality ({}) must be between 1 and 100",
                self.optimizer.jpeg_quality
            )));
        }
        if self.server.threads == 0 {
            return Err(ConfigError::Invalid(
                "server.threads must be greater than 0".to_string(),
            ));
        }
        if let Some(path) = &self.server.metrics_path {
            if !path.starts_with('/') {
                return Err(ConfigError::Invalid(format!(
                    "server.metrics_path '{}' must start with '/'",
                    path
                )));
            }
        }

        self.cache.validate().map_err(ConfigError::Invalid)?;
        self.compression.validate().map_err(ConfigError::Invalid)?;

        Ok(())
    }
}

fn validate_scheme(field: &str, scheme: &str) -> Result<(), ConfigError> {
    match scheme {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::Invalid(format!(
            "{} must be 'http' or 'https', got '{}'",
            field, other
        ))),
    }
}
