//! Configuration manager for bankapp users.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::FromRef;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::AppState;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const DEFAULT_ADDRESS: &str = "0.0.0.0:8888";
const DEFAULT_REQUEST_TIMEOUT: u64 = 10;
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Instance name.
    pub name: String,
    /// Public URL of current instance.
    pub url: String,
    /// Socket address to listen on.
    #[serde(skip_serializing)]
    pub address: String,
    /// Seconds before an HTTP request is cancelled.
    #[serde(skip_serializing)]
    pub request_timeout: u64,
    version: String,
    #[serde(skip)]
    path: PathBuf,
    /// Related to PostgreSQL configuration.
    /// Users are kept in memory when absent.
    #[serde(skip_serializing)]
    pub postgres: Option<Postgres>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_owned(),
            url: String::default(),
            address: DEFAULT_ADDRESS.to_owned(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            version: VERSION.to_owned(),
            path: PathBuf::default(),
            postgres: None,
        }
    }
}

/// PostgreSQL configuration.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct Postgres {
    /// Hostname:(?port) for PostgreSQL instance.
    pub address: String,
    /// Database name.
    pub database: Option<String>,
    /// Username credential to connect.
    pub username: Option<String>,
    /// Password credential to connect.
    pub password: Option<String>,
    /// Maximum pool connections.
    pub pool_size: Option<u32>,
}

impl FromRef<AppState> for Arc<Configuration> {
    fn from_ref(state: &AppState) -> Arc<Configuration> {
        Arc::clone(&state.config)
    }
}

impl Configuration {
    pub fn path(mut self, path: PathBuf) -> Self {
        self.path = path;
        self
    }

    /// Crate version the configuration was loaded by.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Normalizes a URL string by ensuring it starts with a valid scheme
    /// (`http` or `https`).
    fn normalize_url(&self, url: &str) -> Result<String, url::ParseError> {
        let url_with_scheme =
            if url.starts_with("http://") || url.starts_with("https://") {
                url.to_string()
            } else {
                format!("https://{url}")
            };

        let parsed_url = Url::parse(&url_with_scheme)?;
        Ok(parsed_url.to_string())
    }

    /// Reads the `config.yaml` file from the specified path or the default
    /// location.
    pub fn read(self) -> Result<Arc<Self>, url::ParseError> {
        let file_path = if self.path.is_file() {
            self.path.as_path()
        } else {
            Path::new(DEFAULT_CONFIG_PATH)
        };

        match File::open(file_path) {
            Ok(file) => {
                let mut config: Configuration =
                    match serde_yaml::from_reader(file) {
                        Ok(config) => config,
                        Err(err) => {
                            return Ok(Arc::new(self.error(err)));
                        },
                    };

                // set app version.
                config.version = VERSION.to_owned();

                if !config.url.is_empty() {
                    config.url = self.normalize_url(&config.url)?;
                }

                if config.request_timeout == 0 {
                    tracing::warn!(
                        fallback = DEFAULT_REQUEST_TIMEOUT,
                        "`request_timeout` must be positive, using default"
                    );
                    config.request_timeout = DEFAULT_REQUEST_TIMEOUT;
                }

                Ok(Arc::new(config))
            },
            Err(err) => Ok(Arc::new(self.error(err))),
        }
    }

    /// Return a default configuration as fallback.
    fn error(&self, err: impl std::error::Error) -> Self {
        tracing::error!(
            error = %err,
            "`config.yaml` file not found or invalid"
        );
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_read_config() {
        let path = write_config(
            "bankapp-users-config-ok.yaml",
            "name: bank\nurl: bank.example.com\n\
             postgres:\n  address: localhost:5432\n",
        );

        let config = Configuration::default().path(path).read().unwrap();

        assert_eq!(config.name, "bank");
        assert_eq!(config.url, "https://bank.example.com/");
        assert_eq!(config.address, DEFAULT_ADDRESS);
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(config.version(), VERSION);
        assert_eq!(
            config.postgres.as_ref().map(|p| p.address.as_str()),
            Some("localhost:5432")
        );
    }

    #[test]
    fn test_invalid_config_falls_back() {
        let path =
            write_config("bankapp-users-config-bad.yaml", "name: [unclosed");

        let config = Configuration::default().path(path).read().unwrap();

        assert_eq!(*config, Configuration::default());
    }

    #[test]
    fn test_zero_request_timeout_falls_back() {
        let path = write_config(
            "bankapp-users-config-timeout.yaml",
            "request_timeout: 0\n",
        );

        let config = Configuration::default().path(path).read().unwrap();

        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
    }
}
