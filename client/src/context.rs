//! Application wiring.

use std::sync::Arc;

use crate::api::ApiClient;
use crate::auth::IdentityProvider;
use crate::config::ClientConfig;
use crate::error::ConfigError;
use crate::services::{HttpClickService, HttpUserService};
use crate::store::{AuthStore, ClickStore, UserStore};

/// One instance of every store, built over a shared API client.
///
/// Created once at startup and handed (or cloned) to whatever renders.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: ClientConfig,
    pub api: ApiClient,
    pub users: UserStore,
    pub clicks: ClickStore,
    pub auth: AuthStore,
}

impl AppContext {
    pub fn new(config: ClientConfig, provider: Arc<dyn IdentityProvider>) -> Self {
        let api = ApiClient::new(&config);
        let users = UserStore::new(Arc::new(HttpUserService::new(api.clone())));
        let clicks = ClickStore::new(Arc::new(HttpClickService::new(api.clone())));
        let auth = AuthStore::new(provider);

        tracing::debug!(base_url = %api.base_url(), "client context ready");

        Self {
            config,
            api,
            users,
            clicks,
            auth,
        }
    }

    /// Build from `API_BASE_URL` / `API_PREFIX` and friends.
    pub fn from_env(provider: Arc<dyn IdentityProvider>) -> Result<Self, ConfigError> {
        let config = ClientConfig::from_env()?;
        if !config.is_identity_configured() {
            tracing::warn!("SUPABASE_URL or SUPABASE_ANON_KEY not set");
        }
        Ok(Self::new(config, provider))
    }
}
