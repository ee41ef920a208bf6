//! Configuration management for the server.

use std::env;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";
pub const DEFAULT_API_PREFIX: &str = "/api/v1";

/// Local dev origins accepted in addition to `FRONTEND_URL`.
pub const DEV_ORIGINS: [&str; 3] = [
    "http://localhost:3000",
    "http://localhost:5173",
    "http://localhost:4173",
];

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Deployment environment name (`development`, `production`, ...)
    pub environment: String,
    /// Origin of the frontend allowed by CORS
    pub frontend_url: String,
    /// Mount point of the resource routes
    pub api_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            environment: "development".to_string(),
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let host = env::var("HOST").unwrap_or(defaults.host);

        let port = match env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            Err(_) => defaults.port,
        };

        let environment = env::var("APP_ENV").unwrap_or(defaults.environment);
        let frontend_url = env::var("FRONTEND_URL").unwrap_or(defaults.frontend_url);

        let api_prefix = env::var("API_PREFIX").unwrap_or(defaults.api_prefix);
        if !api_prefix.starts_with('/') || api_prefix.len() < 2 || api_prefix.ends_with('/') {
            return Err(ConfigError::InvalidPrefix(api_prefix));
        }

        Ok(Self {
            host,
            port,
            environment,
            frontend_url,
            api_prefix,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Origins CORS lets through, frontend first, without duplicates.
    pub fn allowed_origins(&self) -> Vec<String> {
        let mut origins = vec![self.frontend_url.clone()];
        for origin in DEV_ORIGINS {
            if !origins.iter().any(|o| o == origin) {
                origins.push(origin.to_string());
            }
        }
        origins
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid PORT value: {0}")]
    InvalidPort(String),

    #[error("API_PREFIX must start with '/' and not end with one: {0}")]
    InvalidPrefix(String),
}
