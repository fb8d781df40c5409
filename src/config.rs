//! Configuration management for demetsiiify

use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub import: ImportConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Public host (and port) used in generated URLs
    pub server_name: String,
    pub url_scheme: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportConfig {
    /// Concurrent image downloads per import
    pub concurrency: usize,
    pub items_per_page: u32,
    /// HTTP timeout in seconds
    pub http_timeout: u64,
    pub http_max_retries: u32,
    /// Seconds a finished or failed job stays queryable
    pub job_ttl: u64,
    /// Directory receiving a copy of every fetched METS document
    pub dump_mets: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
                server_name: "localhost:5000".to_string(),
                url_scheme: "http".to_string(),
            },
            database: DatabaseConfig {
                url: "sqlite:./demetsiiify.db".to_string(),
            },
            import: ImportConfig {
                concurrency: 2,
                items_per_page: 50,
                http_timeout: 30,
                http_max_retries: 3,
                job_ttl: 3600,
                dump_mets: None,
            },
        }
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_var("SERVER_PORT", defaults.server.port)?,
                server_name: env::var("SERVER_NAME").unwrap_or(defaults.server.server_name),
                url_scheme: env::var("PREFERRED_URL_SCHEME").unwrap_or(defaults.server.url_scheme),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or(defaults.database.url),
            },
            import: ImportConfig {
                concurrency: parse_var("IMPORT_CONCURRENCY", defaults.import.concurrency)?,
                items_per_page: parse_var("ITEMS_PER_PAGE", defaults.import.items_per_page)?,
                http_timeout: parse_var("HTTP_TIMEOUT", defaults.import.http_timeout)?,
                http_max_retries: parse_var("HTTP_MAX_RETRIES", defaults.import.http_max_retries)?,
                job_ttl: parse_var("JOB_TTL", defaults.import.job_ttl)?,
                dump_mets: env::var("DUMP_METS")
                    .ok()
                    .filter(|d| !d.is_empty())
                    .map(PathBuf::from),
            },
        })
    }

    /// Root URL of the application, e.g. `https://example.com`
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.server.url_scheme, self.server.server_name)
    }

    /// `User-Agent` sent with every outgoing request
    pub fn user_agent(&self) -> String {
        format!(
            "demetsiiify/{} <{}/about>",
            env!("CARGO_PKG_VERSION"),
            self.base_url()
        )
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.import.http_timeout)
    }

    pub fn job_ttl(&self) -> Duration {
        Duration::from_secs(self.import.job_ttl)
    }
}
