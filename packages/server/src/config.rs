use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
    pub activation_token_ttl_secs: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root of the static tree served at `/static`; uploaded images go to `images/`.
    pub static_dir: PathBuf,
    /// Absolute URL prefix used when rendering image links, without trailing slash.
    pub public_url: String,
    pub max_upload_size: u64,
}

impl StorageConfig {
    /// Absolute URL of a file under the static root.
    pub fn static_url(&self, path: &str) -> String {
        format!(
            "{}/static/{}",
            self.public_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.url", "sqlite://blog.db?mode=rwc")?
            .set_default("auth.access_token_ttl_secs", 15 * 60)?
            .set_default("auth.refresh_token_ttl_secs", 30 * 24 * 60 * 60)?
            .set_default("auth.activation_token_ttl_secs", 30 * 60)?
            .set_default("storage.static_dir", "./static")?
            .set_default("storage.public_url", "http://127.0.0.1:3000")?
            .set_default("storage.max_upload_size", 10 * 1024 * 1024)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., BLOG__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("BLOG").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
