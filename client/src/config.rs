//! Client configuration.

use std::env;

use crate::error::ConfigError;

/// Default API origin when `API_BASE_URL` is unset.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3001";

/// Default versioned API prefix when `API_PREFIX` is unset.
pub const DEFAULT_API_PREFIX: &str = "/api/v1";

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Origin of the BFF, without trailing slash
    pub api_base_url: String,
    /// Versioned prefix prepended to relative endpoints
    pub api_prefix: String,
    /// Identity provider URL
    pub supabase_url: Option<String>,
    /// Identity provider public key
    pub supabase_anon_key: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            supabase_url: None,
            supabase_anon_key: None,
        }
    }
}

impl ClientConfig {
    /// Configuration pointing at `base_url` with every other value defaulted.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_base_url = env::var("API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(api_base_url));
        }

        let api_prefix = env::var("API_PREFIX").unwrap_or_else(|_| DEFAULT_API_PREFIX.to_string());
        if !api_prefix.starts_with('/') {
            return Err(ConfigError::InvalidPrefix(api_prefix));
        }

        let supabase_url = env::var("SUPABASE_URL").ok().filter(|v| !v.is_empty());
        let supabase_anon_key = env::var("SUPABASE_ANON_KEY").ok().filter(|v| !v.is_empty());

        Ok(Self {
            api_base_url,
            api_prefix,
            supabase_url,
            supabase_anon_key,
        })
    }

    /// Whether both identity provider settings are present.
    pub fn is_identity_configured(&self) -> bool {
        self.supabase_url.is_some() && self.supabase_anon_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base_url, "http://localhost:3001");
        assert_eq!(config.api_prefix, "/api/v1");
        assert!(!config.is_identity_configured());
    }

    #[test]
    fn with_base_url_strips_trailing_slash() {
        let config = ClientConfig::with_base_url("http://127.0.0.1:9000/");
        assert_eq!(config.api_base_url, "http://127.0.0.1:9000");
        assert_eq!(config.api_prefix, DEFAULT_API_PREFIX);
    }

    #[test]
    fn identity_configured_needs_both_values() {
        let config = ClientConfig {
            supabase_url: Some("https://project.supabase.co".into()),
            ..ClientConfig::default()
        };
        assert!(!config.is_identity_configured());

        let config = ClientConfig {
            supabase_anon_key: Some("anon".into()),
            ..config
        };
        assert!(config.is_identity_configured());
    }
}
