use anyhow::{anyhow, Context, Result};
use dotenvy::dotenv;
use std::time::Duration;

const DEFAULT_BIND_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8081;
const DEFAULT_ALLOWED_ORIGIN: &str = "http://127.0.0.1:8080"; // frontend
const DEFAULT_MAX_WATCH_MS: u64 = 30_000;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_url: String,
    pub bind_host: String,
    pub port: u16,
    pub allowed_origin: String,
    /// Upper bound on how long one watch request is held open.
    pub max_watch: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let database_url = var("DATABASE_URL").ok_or_else(|| anyhow!("DATABASE_URL must be set"))?;
        let port = match var("PORT") {
            Some(raw) => raw.parse().with_context(|| format!("invalid PORT '{raw}'"))?,
            None => DEFAULT_PORT,
        };
        let max_watch_ms = match var("MAX_WATCH_MS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("invalid MAX_WATCH_MS '{raw}'"))?,
            None => DEFAULT_MAX_WATCH_MS,
        };

        Ok(Self {
            database_url,
            bind_host: var("BIND_HOST").unwrap_or_else(|| DEFAULT_BIND_HOST.to_string()),
            port,
            allowed_origin: var("ALLOWED_ORIGIN").unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.to_string()),
            max_watch: Duration::from_millis(max_watch_ms),
        })
    }
}
