//! Click counter service.

use async_trait::async_trait;
use serde_json::json;

use crate::api::ApiClient;
use crate::error::Result;
use crate::types::ClicksResponse;

/// Operations on the click counter.
#[async_trait]
pub trait ClickService: Send + Sync {
    /// `GET /clicks`
    async fn get_clicks(&self) -> Result<ClicksResponse>;

    /// `PUT /clicks` - the server increments and answers with the new value.
    async fn update_clicks(&self) -> Result<ClicksResponse>;
}

/// [`ClickService`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpClickService {
    api: ApiClient,
}

impl HttpClickService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ClickService for HttpClickService {
    async fn get_clicks(&self) -> Result<ClicksResponse> {
        self.api.get("/clicks").await
    }

    async fn update_clicks(&self) -> Result<ClicksResponse> {
        self.api.put("/clicks", &json!({})).await
    }
}
