use serde::Deserialize;

/// Main configuration for the transfer archiver
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Service configuration
    #[serde(default)]
    pub service: ServiceConfig,
    /// S3 configuration
    #[serde(default)]
    pub s3: S3Config,
    /// Archive layout configuration
    #[serde(default)]
    pub archive: ArchiveConfig,
    /// API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Service name for logging
    #[serde(default = "default_service_name")]
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Prometheus metrics port
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

/// S3 client configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct S3Config {
    /// AWS region; the default provider chain decides when unset
    pub region: Option<String>,
    /// Custom endpoint URL (for MinIO, LocalStack, etc.)
    pub endpoint_url: Option<String>,
    /// Force path-style access (required for MinIO)
    #[serde(default)]
    pub force_path_style: bool,
}

/// Where archived objects are placed
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveConfig {
    /// Key prefix prepended verbatim to the original key
    #[serde(default = "default_archive_prefix")]
    pub prefix: String,
}

/// API configuration for the invocation endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// API listen address
    #[serde(default = "default_api_host")]
    pub host: String,
    /// API listen port
    #[serde(default = "default_api_port")]
    pub port: u16,
    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
}

fn default_service_name() -> String {
    "transfer-archiver".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_archive_prefix() -> String {
    "archive/".to_string()
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8080
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from environment and config files
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .set_default("service.name", "transfer-archiver")?
            .set_default("service.log_level", "info")?
            .set_default("service.metrics_port", 9090)?
            .add_source(config::File::with_name("config/transfer-archiver").required(false))
            .add_source(config::File::with_name("/etc/transfer-archiver/config").required(false))
            // ARCHIVER__S3__ENDPOINT_URL -> s3.endpoint_url
            .add_source(
                config::Environment::with_prefix("ARCHIVER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.archive.prefix.is_empty() {
            anyhow::bail!("archive.prefix must not be empty");
        }
        Ok(())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
            metrics_port: default_metrics_port(),
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            prefix: default_archive_prefix(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
            cors_enabled: default_true(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        assert_eq!(default_archive_prefix(), "archive/");
        assert_eq!(default_api_port(), 8080);
        assert_eq!(ServiceConfig::default().name, "transfer-archiver");
        assert_eq!(ServiceConfig::default().metrics_port, 9090);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: Config = serde_json::from_str(
            r#"{"s3": {"endpoint_url": "http://localhost:4566", "force_path_style": true}}"#,
        )
        .unwrap();

        assert_eq!(config.s3.endpoint_url.as_deref(), Some("http://localhost:4566"));
        assert!(config.s3.force_path_style);
        assert_eq!(config.s3.region, None);
        assert_eq!(config.archive.prefix, "archive/");
        assert!(config.api.cors_enabled);
        assert_eq!(config.service.metrics_port, 9090);
    }

    #[test]
    fn test_metrics_port_override() {
        let config: Config =
            serde_json::from_str(r#"{"service": {"metrics_port": 9200}}"#).unwrap();
        assert_eq!(config.service.metrics_port, 9200);
        assert_eq!(config.service.log_level, "info");
    }

    #[test]
    fn test_empty_prefix_is_rejected() {
        let config: Config = serde_json::from_str(r#"{"archive": {"prefix": ""}}"#).unwrap();
        assert!(config.validate().is_err());
    }
}
