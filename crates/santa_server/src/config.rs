//! Server configuration
//!
//! Resolution order: built-in defaults, then a TOML file (explicit path, or
//! `santa.toml` in the working directory when present), then `SANTA_*`
//! environment variables.

use std::path::Path;

use santa_core::GeneratorConfig;
use santa_core::db::DatabaseConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Config file picked up from the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "santa.toml";

/// Signing secret used when nothing else is configured
pub const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address (e.g., "127.0.0.1:8080")
    pub bind_address: String,

    /// Database URL (`memory`, `surrealkv://path`, `ws://host:port`)
    pub database_url: String,
    pub namespace: String,
    pub database: String,

    /// JWT secret for signing tokens
    pub jwt_secret: String,

    /// Access token lifetime in seconds
    pub access_token_ttl: u64,

    /// CORS configuration
    pub cors: CorsConfig,

    /// Assignment generator tuning
    pub generator: GeneratorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// `*` allows any origin; anything else is an explicit allow-list
    pub allowed_origins: Vec<String>,
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
            ],
            max_age: 3600,
        }
    }
}

impl CorsConfig {
    pub fn allows_any(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin == "*")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        let db = DatabaseConfig::default();
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            database_url: db.url,
            namespace: db.namespace,
            database: db.database,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            access_token_ttl: 86400, // 1 day
            cors: CorsConfig::default(),
            generator: GeneratorConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load from `path`, or from `santa.toml` if it exists, then apply the
    /// process environment.
    pub fn load(path: Option<&Path>) -> ServerResult<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        config.with_env(|key| std::env::var(key).ok())
    }

    pub fn from_file(path: &Path) -> ServerResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ServerError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&contents)
            .map_err(|e| ServerError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Apply `SANTA_*` overrides read through `lookup`.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> ServerResult<Self> {
        if let Some(value) = lookup("SANTA_BIND_ADDRESS") {
            self.bind_address = value;
        }
        if let Some(value) = lookup("SANTA_DATABASE_URL") {
            self.database_url = value;
        }
        if let Some(value) = lookup("SANTA_JWT_SECRET") {
            self.jwt_secret = value;
        }
        if let Some(value) = lookup("SANTA_ACCESS_TOKEN_TTL") {
            self.access_token_ttl = value.parse().map_err(|_| {
                ServerError::Config(format!(
                    "SANTA_ACCESS_TOKEN_TTL must be a number of seconds, got '{}'",
                    value
                ))
            })?;
        }
        Ok(self)
    }

    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.database_url.clone(),
            namespace: self.namespace.clone(),
            database: self.database.clone(),
            ..DatabaseConfig::default()
        }
    }

    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ServerConfig::from_toml(
            r#"
            bind_address = "0.0.0.0:9000"

            [cors]
            allowed_origins = ["*"]

            [generator]
            max_attempts = 50
            "#,
        )
        .unwrap();

        assert_eq!(config.bind_address, "0.0.0.0:9000");
        assert!(config.cors.allows_any());
        assert_eq!(config.generator.max_attempts, 50);
        assert_eq!(config.access_token_ttl, 86400);
        assert_eq!(config.namespace, "santa");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("SANTA_DATABASE_URL", "memory"),
            ("SANTA_JWT_SECRET", "s3cret"),
            ("SANTA_ACCESS_TOKEN_TTL", "60"),
        ]
        .into_iter()
        .collect();

        let config = ServerConfig::default()
            .with_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.database_url, "memory");
        assert_eq!(config.database_config().url, "memory");
        assert_eq!(config.jwt_secret, "s3cret");
        assert!(!config.uses_default_secret());
        assert_eq!(config.access_token_ttl, 60);
        assert_eq!(config.bind_address, "127.0.0.1:8080");
    }

    #[test]
    fn test_bad_ttl_is_rejected() {
        let result = ServerConfig::default().with_env(|key| {
            (key == "SANTA_ACCESS_TOKEN_TTL").then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(ServerError::Config(_))));
    }
}
