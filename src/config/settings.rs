//! Application settings and configuration management

use crate::error::{AppError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub supabase: SupabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Keys the identity proxy presents as a bearer token
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub api_keys: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_keys: vec![],
        }
    }
}

fn default_true() -> bool {
    true
}

/// Rate limiting for the generation routes
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_rps")]
    pub requests_per_second: u32,
    #[serde(default = "default_burst")]
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_second: default_rps(),
            burst_size: default_burst(),
        }
    }
}

fn default_rps() -> u32 {
    5
}

fn default_burst() -> u32 {
    10
}

/// Inference endpoint configuration
#[derive(Clone, Deserialize, Serialize)]
pub struct InferenceConfig {
    #[serde(default = "default_inference_endpoint")]
    pub endpoint: String,
    #[serde(default, skip_serializing)]
    pub api_key: String,
    /// No client-side timeout when unset
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_inference_endpoint(),
            api_key: String::new(),
            timeout_ms: None,
        }
    }
}

impl std::fmt::Debug for InferenceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

fn default_inference_endpoint() -> String {
    "https://api-inference.huggingface.co/models/XLabs-AI/flux-RealismLora".to_string()
}

/// Where uploaded images go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Supabase,
    Filesystem,
    Memory,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_backend")]
    pub backend: StorageBackend,
    #[serde(default = "default_bucket")]
    pub bucket: String,
    #[serde(default = "default_storage_path")]
    pub base_path: String,
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            bucket: default_bucket(),
            base_path: default_storage_path(),
            url_prefix: default_url_prefix(),
        }
    }
}

fn default_storage_backend() -> StorageBackend {
    StorageBackend::Supabase
}

fn default_bucket() -> String {
    "generated-images".to_string()
}

fn default_storage_path() -> String {
    "./generated_images".to_string()
}

fn default_url_prefix() -> String {
    "http://localhost:8080/files".to_string()
}

/// Where image metadata and user records go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Postgrest,
    Memory,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_backend")]
    pub backend: DatabaseBackend,
    #[serde(default = "default_images_table")]
    pub images_table: String,
    #[serde(default = "default_users_table")]
    pub users_table: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: default_database_backend(),
            images_table: default_images_table(),
            users_table: default_users_table(),
        }
    }
}

fn default_database_backend() -> DatabaseBackend {
    DatabaseBackend::Postgrest
}

fn default_images_table() -> String {
    "generated_images".to_string()
}

fn default_users_table() -> String {
    "users".to_string()
}

/// Hosted Supabase project used by the supabase/postgrest backends
#[derive(Clone, Default, Deserialize, Serialize)]
pub struct SupabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing)]
    pub service_key: String,
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("service_key", &"<redacted>")
            .finish()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Settings {
    /// Load settings from configuration files and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/default.toml")
    }

    /// Load settings from a specific configuration file path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_string_lossy().into_owned();
        let config = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("auth.enabled", true)?
            .set_default("rate_limit.enabled", true)?
            .add_source(File::with_name(&path).required(false))
            // Override with environment variables (prefixed with PROMPT_GALLERY_)
            .add_source(
                Environment::with_prefix("PROMPT_GALLERY")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("auth.api_keys")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        Ok(settings)
    }

    /// True when identity headers are accepted without the proxy presenting a key
    pub fn trusts_unverified_identity(&self) -> bool {
        !self.auth.enabled || self.auth.api_keys.is_empty()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(config_error("Server port cannot be 0".to_string()));
        }

        if self.inference.endpoint.trim().is_empty() {
            return Err(config_error("Inference endpoint cannot be empty".to_string()));
        }

        let needs_supabase = self.storage.backend == StorageBackend::Supabase
            || self.database.backend == DatabaseBackend::Postgrest;
        if needs_supabase && self.supabase.url.trim().is_empty() {
            return Err(config_error(format!(
                "supabase.url is required for storage backend '{:?}' and database backend '{:?}'",
                self.storage.backend, self.database.backend
            )));
        }

        if self.storage.bucket.is_empty() {
            return Err(config_error("Storage bucket cannot be empty".to_string()));
        }

        Ok(())
    }
}

fn config_error(message: String) -> AppError {
    AppError::Config(config::ConfigError::Message(message))
}
