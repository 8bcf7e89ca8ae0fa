use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Unset means essays live in memory only.
    pub database_url: Option<String>,
    pub upload_folder: PathBuf,
    pub public_base_url: String,
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let database_url = var("DATABASE_URL");

        let base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let upload_folder =
            base_dir.join(var("UPLOAD_FOLDER").unwrap_or_else(|| "uploads".to_string()));

        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match var("PORT") {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value,
                expected: "a port number",
            })?,
            None => DEFAULT_PORT,
        };
        let max_upload_bytes = match var("MAX_UPLOAD_BYTES") {
            Some(value) => match value.trim().parse::<usize>() {
                Ok(bytes) if bytes > 0 => bytes,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "MAX_UPLOAD_BYTES",
                        value,
                        expected: "a positive byte count",
                    })
                }
            },
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let public_base_url = var("PUBLIC_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://localhost:{port}"));

        Ok(Self {
            database_url,
            upload_folder,
            public_base_url,
            host,
            port,
            max_upload_bytes,
        })
    }
}
