use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use super::cli::CliConfig;
use super::constants::{
    CONFIG_FILE_NAME, DEFAULT_CORS_ORIGIN, DEFAULT_HOST, DEFAULT_JWT_LEEWAY_SECS,
    DEFAULT_JWT_TTL_SECS, DEFAULT_PORT, ENV_JWT_SECRET,
};
use super::secret::Secret;
use crate::api::auth::TokenKeys;

// =============================================================================
// File Configuration
// =============================================================================

/// Server configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub cors_origins: Option<Vec<String>>,
}

/// Auth configuration section (from JSON config file)
///
/// The signing secret is deliberately absent: it only comes from the
/// environment.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AuthFileConfig {
    pub leeway_secs: Option<u64>,
    pub token_ttl_secs: Option<u64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub server: Option<ServerFileConfig>,
    pub auth: Option<AuthFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        let auth_extra = self.auth.as_ref().map(|a| &a.extra);
        let mut keys: Vec<String> = self.extra.keys().cloned().collect();
        if let Some(extra) = auth_extra {
            keys.extend(extra.keys().map(|k| format!("auth.{}", k)));
            if extra.keys().any(|k| k.contains("secret")) {
                tracing::warn!(
                    "Ignoring secret in config file; set {} in the environment instead",
                    ENV_JWT_SECRET
                );
            }
        }
        if !keys.is_empty() {
            tracing::warn!(
                fields = %keys.join(", "),
                "Unknown fields in config file (possible typos)"
            );
        }
    }
}

// =============================================================================
// Resolved Configuration
// =============================================================================

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    pub fn addr(&self) -> Result<SocketAddr> {
        let ip = self
            .host
            .parse()
            .with_context(|| format!("Invalid host address: {}", self.host))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub secret: Secret,
    pub leeway_secs: u64,
    pub token_ttl_secs: u64,
}

impl AuthConfig {
    pub fn token_keys(&self) -> TokenKeys {
        TokenKeys::new(self.secret.as_bytes(), self.leeway_secs)
    }
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Local directory config OR CLI-specified config path
    /// 3. CLI arguments (which include env var fallbacks via clap)
    ///
    /// The JWT secret is read from the environment only.
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let path = match cli.config {
            Some(ref path) => {
                if !path.exists() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                Some(path.clone())
            }
            None => {
                let local = PathBuf::from(CONFIG_FILE_NAME);
                if local.exists() { Some(local) } else { None }
            }
        };

        let file_config = match path {
            Some(path) => {
                let config = FileConfig::load_from_file(&path)?;
                config.warn_unknown_fields();
                config
            }
            None => FileConfig::default(),
        };

        let secret = Secret::from_env(ENV_JWT_SECRET)?;
        Ok(Self::resolve(cli, file_config, secret))
    }

    /// Layer defaults, file values and CLI/env overrides
    pub fn resolve(cli: &CliConfig, file: FileConfig, secret: Secret) -> Self {
        let file_server = file.server.unwrap_or_default();
        let file_auth = file.auth.unwrap_or_default();

        let host = cli
            .host
            .clone()
            .or(file_server.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = cli.port.or(file_server.port).unwrap_or(DEFAULT_PORT);

        let cors_origins = cli
            .cors_origins
            .clone()
            .or(file_server.cors_origins)
            .unwrap_or_else(|| vec![DEFAULT_CORS_ORIGIN.to_string()]);

        let leeway_secs = cli
            .leeway
            .or(file_auth.leeway_secs)
            .unwrap_or(DEFAULT_JWT_LEEWAY_SECS);

        let token_ttl_secs = cli
            .token_ttl
            .or(file_auth.token_ttl_secs)
            .unwrap_or(DEFAULT_JWT_TTL_SECS);

        Self {
            server: ServerConfig {
                host,
                port,
                cors_origins,
            },
            auth: AuthConfig {
                secret,
                leeway_secs,
                token_ttl_secs,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn secret() -> Secret {
        Secret::new("test-secret")
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::resolve(&CliConfig::default(), FileConfig::default(), secret());
        assert_eq!(config.server.host, DEFAULT_HOST);
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.server.cors_origins, vec![DEFAULT_CORS_ORIGIN]);
        assert_eq!(config.auth.leeway_secs, DEFAULT_JWT_LEEWAY_SECS);
        assert_eq!(config.auth.token_ttl_secs, DEFAULT_JWT_TTL_SECS);
    }

    #[test]
    fn test_cli_overrides_file() {
        let file: FileConfig = serde_json::from_value(serde_json::json!({
            "server": { "host": "0.0.0.0", "port": 8100 },
            "auth": { "leeway_secs": 30 }
        }))
        .unwrap();
        let cli = CliConfig {
            port: Some(9000),
            ..Default::default()
        };
        let config = AppConfig::resolve(&cli, file, secret());
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.auth.leeway_secs, 30);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"server": {{"cors_origins": ["http://campus.test"]}}, "auth": {{"token_ttl_secs": 60}}, "typo": 1}}"#
        )
        .unwrap();
        let config = FileConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.extra.len(), 1);
        let resolved = AppConfig::resolve(&CliConfig::default(), config, secret());
        assert_eq!(resolved.server.cors_origins, vec!["http://campus.test"]);
        assert_eq!(resolved.auth.token_ttl_secs, 60);
    }

    #[test]
    fn test_secret_in_file_is_not_used() {
        let file: FileConfig = serde_json::from_value(serde_json::json!({
            "auth": { "jwt_secret": "from-file" }
        }))
        .unwrap();
        let config = AppConfig::resolve(&CliConfig::default(), file, secret());
        assert_eq!(config.auth.secret.expose(), "test-secret");
    }

    #[test]
    fn test_missing_config_path_fails() {
        let cli = CliConfig {
            config: Some(PathBuf::from("/nonexistent/eventhub.json")),
            ..Default::default()
        };
        assert!(AppConfig::load(&cli).is_err());
    }

    #[test]
    fn test_server_addr() {
        let config = AppConfig::resolve(&CliConfig::default(), FileConfig::default(), secret());
        assert_eq!(config.server.addr().unwrap().to_string(), "127.0.0.1:8000");

        let mut bad = config.server.clone();
        bad.host = "not an ip".to_string();
        assert!(bad.addr().is_err());
    }

    #[test]
    fn test_token_keys_use_secret() {
        let config = AppConfig::resolve(&CliConfig::default(), FileConfig::default(), secret());
        let keys = config.auth.token_keys();
        let token = keys
            .issue("u1", crate::api::auth::Role::Admin, chrono::Duration::minutes(1))
            .unwrap();
        assert!(
            TokenKeys::new(b"test-secret", 0).verify(&token).is_ok()
        );
    }
}
