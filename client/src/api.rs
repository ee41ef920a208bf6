//! HTTP client wrapper for the Vibe API.
//!
//! Resolves endpoints against the configured origin and API prefix, attaches
//! the JSON headers, and unwraps success and error envelopes into typed
//! results. It never retries and never catches on behalf of its callers.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::types::ApiErrorBody;

/// Endpoints starting with this segment are absolute against the origin.
const ABSOLUTE_SEGMENT: &str = "/api";

/// Thin async wrapper around `reqwest` speaking the envelope protocol.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    prefix: String,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_http_client(reqwest::Client::new(), config)
    }

    pub fn with_http_client(http: reqwest::Client, config: &ClientConfig) -> Self {
        Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            prefix: config.api_prefix.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an endpoint.
    pub fn resolve_url(&self, endpoint: &str) -> String {
        if endpoint.starts_with(ABSOLUTE_SEGMENT) {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}{}{}", self.base_url, self.prefix, endpoint)
        }
    }

    /// Perform one request and decode the success body into `T`.
    ///
    /// `body` is already-serialized JSON.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<String>,
    ) -> Result<T> {
        let url = self.resolve_url(endpoint);
        tracing::debug!(%method, %url, "API request");

        let mut request = self
            .http
            .request(method.clone(), &url)
            .headers(default_headers());
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(%method, %url, error = %e, "API request failed to complete");
            Error::from(e)
        })?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let err = error_from_body(status.as_u16(), &bytes);
            tracing::debug!(%method, %url, status = status.as_u16(), error = %err, "API error response");
            return Err(err);
        }

        serde_json::from_slice(&bytes).map_err(|e| Error::Decode(e.to_string()))
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        self.request(Method::GET, endpoint, None).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        data: &B,
    ) -> Result<T> {
        self.request(Method::POST, endpoint, Some(to_json(data)?))
            .await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        data: &B,
    ) -> Result<T> {
        self.request(Method::PUT, endpoint, Some(to_json(data)?))
            .await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        data: &B,
    ) -> Result<T> {
        self.request(Method::PATCH, endpoint, Some(to_json(data)?))
            .await
    }

    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        self.request(Method::DELETE, endpoint, None).await
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

fn to_json<B: Serialize + ?Sized>(data: &B) -> Result<String> {
    serde_json::to_string(data).map_err(|e| Error::Serialize(e.to_string()))
}

/// Map a non-success response to the typed error for its status.
fn error_from_body(status: u16, body: &[u8]) -> Error {
    match serde_json::from_slice::<ApiErrorBody>(body) {
        Ok(parsed) if !parsed.error.message.is_empty() => {
            Error::from_status(status, parsed.error.message)
        }
        _ => Error::Http { status },
    }
}
