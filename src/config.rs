use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => bail!("STORAGE_BACKEND must be 'postgres' or 'memory', got '{}'", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => bail!("LOG_FORMAT must be 'pretty' or 'json', got '{}'", other),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub storage_backend: StorageBackend,
    pub database_url: String,
    pub db_max_connections: u32,
    /// `None` disables the per-request storage deadline.
    pub request_timeout: Option<Duration>,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok(); // Load .env file if present

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let var_or = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let server_port = var("SERVER_PORT")
            .or_else(|| var("PORT"))
            .unwrap_or_else(|| "8080".to_string());
        let server_port = server_port
            .trim()
            .parse()
            .with_context(|| format!("invalid SERVER_PORT '{}'", server_port))?;

        let database_url = match var("DATABASE_URL") {
            Some(url) => url,
            None => format!(
                "postgres://{}:{}@{}:{}/{}?sslmode={}",
                var_or("DB_USER", "postgres"),
                var_or("DB_PASSWORD", "password"),
                var_or("DB_HOST", "localhost"),
                var_or("DB_PORT", "5432"),
                var_or("DB_NAME", "myexpenses"),
                var_or("DB_SSLMODE", "disable"),
            ),
        };

        let db_max_connections = var_or("DB_MAX_CONNECTIONS", "5");
        let db_max_connections = db_max_connections
            .trim()
            .parse()
            .with_context(|| format!("invalid DB_MAX_CONNECTIONS '{}'", db_max_connections))?;

        let request_timeout = var_or("REQUEST_TIMEOUT_SECS", "30");
        let request_timeout: u64 = request_timeout
            .trim()
            .parse()
            .with_context(|| format!("invalid REQUEST_TIMEOUT_SECS '{}'", request_timeout))?;

        Ok(Config {
            server_host: var_or("SERVER_HOST", "0.0.0.0"),
            server_port,
            storage_backend: var_or("STORAGE_BACKEND", "postgres").parse()?,
            database_url,
            db_max_connections,
            request_timeout: (request_timeout > 0).then(|| Duration::from_secs(request_timeout)),
            log_format: var_or("LOG_FORMAT", "pretty").parse()?,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.server_host, self.server_port)
            .parse()
            .with_context(|| format!("invalid SERVER_HOST '{}'", self.server_host))
    }

    /// The connection string with any password replaced by `***`.
    pub fn redacted_database_url(&self) -> String {
        redact_password(&self.database_url)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("storage_backend", &self.storage_backend)
            .field("database_url", &self.redacted_database_url())
            .field("db_max_connections", &self.db_max_connections)
            .field("request_timeout", &self.request_timeout)
            .field("log_format", &self.log_format)
            .finish()
    }
}

fn redact_password(raw: &str) -> String {
    let mut url = match url::Url::parse(raw) {
        Ok(url) => url,
        Err(_) => return raw.to_string(),
    };
    if url.password().is_none() || url.set_password(Some("***")).is_err() {
        return raw.to_string();
    }
    url.to_string()
}
