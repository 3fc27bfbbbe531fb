//! Configuration module
//!
//! Process-wide configuration resolved once at startup from environment
//! variables (a `.env` file is loaded by the binary before this runs).
//! The presign secret is held here and handed to the token codec at
//! construction; it is never logged and never read from globals elsewhere.

use std::env;

use anyhow::{Context, Result};

const DEFAULT_SERVER_PORT: u16 = 3000;
const DEFAULT_PRESIGN_TTL_SECS: u64 = 300;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_STORAGE_ROOT: &str = "./local_bucket";
const DEFAULT_BODY_LIMIT_BYTES: usize = 50 * 1024 * 1024;

#[derive(Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    pub storage_root: String,
    pub public_base_url: String,
    pub presign_secret: Vec<u8>,
    pub presign_ttl_secs: u64,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub body_limit_bytes: usize,
    pub environment: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let presign_secret = env::var("PRESIGN_SECRET")
            .context("PRESIGN_SECRET must be set")?
            .into_bytes();
        if presign_secret.is_empty() {
            anyhow::bail!("PRESIGN_SECRET must not be empty");
        }

        Ok(Config {
            server_port: parse_env_or("SERVER_PORT", DEFAULT_SERVER_PORT)?,
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            storage_root: env_or("STORAGE_ROOT", DEFAULT_STORAGE_ROOT),
            public_base_url: env_or("PUBLIC_BASE_URL", "http://localhost:3000"),
            presign_secret,
            presign_ttl_secs: parse_env_or("PRESIGN_TTL_SECS", DEFAULT_PRESIGN_TTL_SECS)?,
            cors_origins: env::var("CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            db_max_connections: parse_env_or("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,
            body_limit_bytes: parse_env_or("BODY_LIMIT_BYTES", DEFAULT_BODY_LIMIT_BYTES)?,
            environment: env_or("ENVIRONMENT", "development"),
        })
    }
}

// Redact the secret; Config is logged at startup.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("server_port", &self.server_port)
            .field("storage_root", &self.storage_root)
            .field("public_base_url", &self.public_base_url)
            .field("presign_secret", &"<redacted>")
            .field("presign_ttl_secs", &self.presign_ttl_secs)
            .field("cors_origins", &self.cors_origins)
            .field("db_max_connections", &self.db_max_connections)
            .field("body_limit_bytes", &self.body_limit_bytes)
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("Invalid value for {}", key)),
        Err(_) => Ok(default),
    }
}
