//! # Configuration Management
//!
//! Centralized configuration for the client.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Environment variables via `from_env()` (`MHUX_CLIENT_*`)
//! - Direct instantiation with defaults
//!
//! Command-line flags are applied on top by the binary, so precedence ends
//! up: defaults < file/environment < flags.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::error::{ProtocolError, Result};
use crate::transport::tls::TlsClientConfig;

/// Default server port.
pub const DEFAULT_PORT: u16 = 18482;

/// Default server host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Main configuration structure that contains all configurable settings
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ClientConfig {
    /// Connection parameters
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Transport security settings
    #[serde(default)]
    pub tls: TlsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ClientConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| ProtocolError::Config(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ProtocolError::Config(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProtocolError::Config(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("MHUX_CLIENT_HOST") {
            config.connection.host = host;
        }

        if let Ok(port) = std::env::var("MHUX_CLIENT_PORT") {
            config.connection.port = port
                .parse::<u16>()
                .map_err(|_| ProtocolError::Config(format!("Invalid port: {port}")))?;
        }

        if let Ok(insecure) = std::env::var("MHUX_CLIENT_INSECURE") {
            config.tls.insecure = insecure == "1" || insecure.eq_ignore_ascii_case("true");
        }

        if let Ok(ca_file) = std::env::var("MHUX_CLIENT_CA_FILE") {
            config.tls.ca_file = Some(ca_file);
        }

        Ok(config)
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.connection.validate());
        errors.extend(self.tls.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::Config(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }

    /// Build the transport-layer TLS configuration from these settings.
    pub fn tls_client_config(&self) -> Result<TlsClientConfig> {
        let server_name = self
            .tls
            .server_name
            .clone()
            .unwrap_or_else(|| self.connection.host.clone());

        let mut config = TlsClientConfig::new(server_name);

        if let Some(ca_file) = &self.tls.ca_file {
            config = config.with_ca_file(ca_file.clone());
        }
        if self.tls.insecure {
            config = config.insecure();
        }
        if let Some(hash_hex) = &self.tls.pinned_cert_sha256 {
            let hash = hex::decode(hash_hex).map_err(|_| {
                ProtocolError::Config(format!("Invalid pinned certificate hash: {hash_hex}"))
            })?;
            config = config.with_pinned_cert_hash(hash);
        }

        Ok(config)
    }
}

/// Connection parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionConfig {
    /// Server host name or IP address
    pub host: String,

    /// Server port
    pub port: u16,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: String::from(DEFAULT_HOST),
            port: DEFAULT_PORT,
        }
    }
}

impl ConnectionConfig {
    /// Full `host:port` address string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validate connection configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.host.is_empty() {
            errors.push("Server host cannot be empty".to_string());
        }
        if self.port == 0 {
            errors.push("Server port cannot be 0".to_string());
        }

        errors
    }
}

/// Transport security settings
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct TlsConfig {
    /// Name to verify the server certificate against (defaults to the host)
    pub server_name: Option<String>,

    /// PEM file of additional trusted root certificates
    pub ca_file: Option<String>,

    /// Skip certificate verification (development only)
    #[serde(default)]
    pub insecure: bool,

    /// Pinned server certificate SHA-256 fingerprint, hex-encoded
    pub pinned_cert_sha256: Option<String>,
}

impl TlsConfig {
    /// Validate TLS configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if let Some(hash) = &self.pinned_cert_sha256 {
            if hash.len() != 64 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
                errors.push(format!(
                    "Pinned certificate hash must be 64 hex characters (got {} characters)",
                    hash.len()
                ));
            }
        }

        if self.pinned_cert_sha256.is_some() && !self.insecure {
            errors.push(
                "Certificate pinning only takes effect in insecure mode (set insecure = true)"
                    .to_string(),
            );
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(with = "log_level_serde")]
    pub level: Level,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.connection.address(), "127.0.0.1:18482");
        assert!(!config.tls.insecure);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_from_toml() {
        let config = ClientConfig::from_toml(
            r#"
            [connection]
            host = "db.example.com"
            port = 19000

            [tls]
            insecure = true

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.connection.address(), "db.example.com:19000");
        assert!(config.tls.insecure);
        assert_eq!(config.logging.level, Level::DEBUG);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = ClientConfig::from_toml("[connection]\nport = \"not a port\"").unwrap_err();
        assert!(matches!(err, ProtocolError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ClientConfig::default();
        config.connection.host.clear();
        config.connection.port = 0;
        config.tls.pinned_cert_sha256 = Some("abc".into());

        let errors = config.validate();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_tls_client_config_rejects_bad_pin() {
        let mut config = ClientConfig::default();
        config.tls.pinned_cert_sha256 = Some("zz".repeat(32));
        assert!(config.tls_client_config().is_err());
    }
}
