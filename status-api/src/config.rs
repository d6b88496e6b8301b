use std::env;
use std::str::FromStr;
use tracing::warn;

const DEFAULT_DATABASE_URL: &str = "sqlite://status.db";
const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:8000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Runtime settings, read from the environment (and `.env` if present).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub http_addr: String,
    /// Shared secret expected in `x-api-key`. `None` disables the check.
    pub api_key: Option<String>,
    pub max_connections: u32,
}

impl Config {
    pub fn from_env() -> Self {
        if let Some(e) = dotenv_problem(dotenvy::dotenv()) {
            warn!("Failed to load .env file: {}", e);
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let http_addr = lookup("HTTP_ADDR").unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string());
        let api_key = lookup("API_KEY").filter(|key| !key.is_empty());
        let max_connections =
            parse_or_default(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS);

        Self {
            database_url,
            http_addr,
            api_key,
            max_connections,
        }
    }

    /// Database URL with any `user:password@` part masked, for logging.
    pub fn redacted_database_url(&self) -> String {
        match self.database_url.rsplit_once('@') {
            Some((prefix, host)) => {
                let scheme = prefix.split("://").next().unwrap_or("db");
                format!("{}://***@{}", scheme, host)
            }
            None => self.database_url.clone(),
        }
    }
}

/// A missing `.env` file is the normal case in containers and is not reported.
fn dotenv_problem<T>(result: dotenvy::Result<T>) -> Option<dotenvy::Error> {
    match result {
        Ok(_) => None,
        Err(e) if e.not_found() => None,
        Err(e) => Some(e),
    }
}

fn parse_or_default<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Invalid value {:?} for {}, using default {}", raw, key, default);
            default
        }),
        None => default,
    }
}
