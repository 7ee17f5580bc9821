//! Server settings read from the environment.
use std::env;
use std::net::SocketAddr;

use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ServerConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub const DEFAULT_HOMEPAGE: &str = "http://github.com/oikone";

/// Largest request body accepted by `POST /put` unless overridden.
pub const DEFAULT_BODY_LIMIT: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub homepage: String,
    pub cors: bool,
    /// Request body cap in bytes; `None` accepts any size.
    pub body_limit: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            homepage: DEFAULT_HOMEPAGE.to_string(),
            cors: true,
            body_limit: Some(DEFAULT_BODY_LIMIT),
        }
    }
}

impl ServerConfig {
    /// Load server configuration from environment variables
    pub fn from_env() -> Result<Self, ServerConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ServerConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = lookup("LIBRARIAN_HOST").unwrap_or(defaults.host);

        let port = match lookup("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| {
                ServerConfigError::InvalidConfig(format!("Invalid PORT: {} ({})", raw, e))
            })?,
            None => defaults.port,
        };

        let homepage = lookup("LIBRARIAN_HOMEPAGE").unwrap_or(defaults.homepage);

        let cors = match lookup("LIBRARIAN_CORS") {
            Some(raw) => match raw.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ServerConfigError::InvalidConfig(format!(
                        "Invalid LIBRARIAN_CORS: {}",
                        raw
                    )))
                }
            },
            None => defaults.cors,
        };

        // "0" or "none" lifts the cap entirely.
        let body_limit = match lookup("LIBRARIAN_BODY_LIMIT") {
            Some(raw) if raw.eq_ignore_ascii_case("none") => None,
            Some(raw) => match raw.parse::<usize>() {
                Ok(0) => None,
                Ok(limit) => Some(limit),
                Err(e) => {
                    return Err(ServerConfigError::InvalidConfig(format!(
                        "Invalid LIBRARIAN_BODY_LIMIT: {} ({})",
                        raw, e
                    )))
                }
            },
            None => defaults.body_limit,
        };

        info!(
            "Server configuration loaded: host={}, port={}, cors={}, body_limit={:?}",
            host, port, cors, body_limit
        );

        Ok(Self {
            host,
            port,
            homepage,
            cors,
            body_limit,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ServerConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ServerConfigError::InvalidConfig(format!("Invalid host {}: {}", self.host, e)))
    }
}
