//! Configuration module

mod settings;

pub use settings::{
    AuthConfig, DatabaseBackend, DatabaseConfig, InferenceConfig, LoggingConfig,
    RateLimitConfig, ServerConfig, Settings, StorageBackend, StorageConfig, SupabaseConfig,
};
