//! Service configuration: `config.toml` sections with environment overrides on top.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::common::constants::{ACCESS_TOKEN_EXPIRE_MINUTES, DEFAULT_MODEL_CACHE_TTL_SECONDS};
use crate::logging::LoggingConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
const DEV_JWT_SECRET: &str = "dev-secret-key-change-me";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: String, value: String },

    #[error("JWT secret must be configured in production")]
    MissingSecret,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// development | staging | production
    pub environment: String,
    /// Reported in X-Instance-ID; falls back to $HOSTNAME
    pub instance_id: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            environment: "development".to_string(),
            instance_id: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_expire_minutes: i64,
    pub api_keys: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEV_JWT_SECRET.to_string(),
            access_token_expire_minutes: ACCESS_TOKEN_EXPIRE_MINUTES,
            api_keys: vec!["dev-api-key".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub path: PathBuf,
    /// LMDB map size in megabytes
    pub map_size_mb: Option<usize>,
    /// Seed the games table at startup in development
    pub seed_games: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/records"),
            map_size_mb: None,
            seed_games: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub dir: PathBuf,
    pub cache_ttl_seconds: u64,
    /// Shared cache; used only when built with the `redis` feature
    pub redis_url: Option<String>,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("models"),
            cache_ttl_seconds: DEFAULT_MODEL_CACHE_TTL_SECONDS,
            redis_url: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub models: ModelsConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Parse a TOML document; every section is optional
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Read `path` if it exists, otherwise start from defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Load from `$CONFIG_PATH` (or config.toml) and apply process environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::from_file(Path::new(&path))?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `lookup` (the process environment in production)
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(environment) = lookup("ENVIRONMENT") {
            self.server.environment = environment;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError::InvalidEnv {
                key: "PORT".to_string(),
                value: port.clone(),
            })?;
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(keys) = lookup("API_KEYS") {
            self.auth.api_keys = keys
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(ttl) = lookup("MODEL_CACHE_TTL") {
            self.models.cache_ttl_seconds = ttl.parse().map_err(|_| ConfigError::InvalidEnv {
                key: "MODEL_CACHE_TTL".to_string(),
                value: ttl.clone(),
            })?;
        }
        if let Some(url) = lookup("REDIS_URL") {
            self.models.redis_url = Some(url);
        }
        if let Some(path) = lookup("STORAGE_PATH") {
            self.storage.path = PathBuf::from(path);
        }
        if self.server.instance_id.is_none() {
            self.server.instance_id = Some(lookup("HOSTNAME").unwrap_or_else(|| "local".to_string()));
        }
        Ok(())
    }

    /// Production refuses to run with the development signing secret
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.is_production() && (self.auth.jwt_secret.is_empty() || self.auth.jwt_secret == DEV_JWT_SECRET) {
            return Err(ConfigError::MissingSecret);
        }
        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.server.environment == "development"
    }

    pub fn is_production(&self) -> bool {
        self.server.environment == "production"
    }

    pub fn instance_id(&self) -> &str {
        self.server.instance_id.as_deref().unwrap_or("local")
    }

    pub fn map_size_bytes(&self) -> Option<usize> {
        self.storage.map_size_mb.map(|mb| mb * 1024 * 1024)
    }
}
