//! Centralized configuration (environment variables + defaults).

use anyhow::{anyhow, Context};
use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" | "in-memory" => Ok(StoreBackend::Memory),
            other => Err(anyhow!("unknown store backend '{}' (expected postgres or memory)", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: StoreBackend,
    /// Present whenever `backend` is `Postgres`.
    pub database: Option<DatabaseConfig>,
    pub bind_addr: SocketAddr,
}

impl Config {
    /// Reads `.env` (if any) and the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let backend: StoreBackend = try_load("STORE_BACKEND", "postgres")?;
        let database = match backend {
            StoreBackend::Postgres => Some(database_config()?),
            StoreBackend::Memory => None,
        };

        Ok(Self {
            backend,
            database,
            bind_addr: try_load("BIND_ADDR", "0.0.0.0:3000")?,
        })
    }
}

/// Database settings; `DATABASE_URL` has no default.
pub fn database_config() -> anyhow::Result<DatabaseConfig> {
    Ok(DatabaseConfig {
        url: database_url()?,
        max_connections: try_load::<u32>("DATABASE_MAX_CONNECTIONS", "5")?.max(1),
        acquire_timeout_secs: try_load("DATABASE_ACQUIRE_TIMEOUT_SECS", "5")?,
    })
}

pub fn database_url() -> anyhow::Result<String> {
    std::env::var("DATABASE_URL").context("DATABASE_URL must be set")
}

fn try_load<T: FromStr>(key: &str, default: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    let raw = std::env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.trim()
        .parse()
        .map_err(|e| anyhow!("invalid {key} value {raw:?}: {e}"))
}
