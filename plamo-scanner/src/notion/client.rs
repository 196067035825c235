//! Notion API client
//!
//! HTTPS JSON against `https://api.notion.com/` with bearer auth and a pinned
//! `Notion-Version` header. No retries: the first error aborts the call.

use super::{NotionError, Page, PropertyMap, QueryRequest, QueryResponse, RecordStore};
use async_trait::async_trait;
use plamo_common::config::DEFAULT_NOTION_BASE_URL;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;

/// Pinned API version sent with every request
pub const NOTION_VERSION: &str = "2022-06-28";
const USER_AGENT: &str = concat!("plamo-scanner/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Notion API client
pub struct NotionClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl NotionClient {
    /// Client for the public Notion API
    pub fn new(api_key: String) -> Result<Self, NotionError> {
        Self::with_base_url(api_key, DEFAULT_NOTION_BASE_URL)
    }

    /// Client for a Notion-compatible endpoint (used by tests with a local stub)
    pub fn with_base_url(api_key: String, base_url: &str) -> Result<Self, NotionError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| NotionError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(&self.api_key)
            .header("Notion-Version", NOTION_VERSION)
    }

    /// Send a request and decode the JSON response body
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        operation: &'static str,
    ) -> Result<T, NotionError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| NotionError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| NotionError::NetworkError(e.to_string()))?;

        tracing::debug!(operation, status = status.as_u16(), body = %body, "Notion response");

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(NotionError::Unauthorized);
        }

        if !status.is_success() {
            return Err(NotionError::ApiError(status.as_u16(), body));
        }

        serde_json::from_str(&body).map_err(|e| NotionError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl RecordStore for NotionClient {
    async fn query_database(
        &self,
        database_id: &str,
        query: &QueryRequest,
    ) -> Result<Vec<Page>, NotionError> {
        let url = self.endpoint(&format!("v1/databases/{}/query", database_id));
        tracing::debug!(database_id, filter = ?query.filter, "Querying Notion database");

        let response: QueryResponse = self
            .send(self.http_client.post(&url).json(query), "query_database")
            .await?;

        tracing::debug!(
            database_id,
            matches = response.results.len(),
            "Notion query finished"
        );
        Ok(response.results)
    }

    async fn create_page(
        &self,
        database_id: &str,
        properties: PropertyMap,
    ) -> Result<Page, NotionError> {
        let url = self.endpoint("v1/pages");
        let body = json!({
            "parent": { "database_id": database_id },
            "properties": properties,
        });
        tracing::debug!(database_id, body = %body, "Creating Notion page");

        let page: Page = self
            .send(self.http_client.post(&url).json(&body), "create_page")
            .await?;

        tracing::info!(database_id, page_id = %page.id, "Created Notion page");
        Ok(page)
    }

    async fn update_page(
        &self,
        page_id: &str,
        properties: PropertyMap,
    ) -> Result<Page, NotionError> {
        let url = self.endpoint(&format!("v1/pages/{}", page_id));
        let body = json!({ "properties": properties });
        tracing::debug!(page_id, body = %body, "Updating Notion page");

        let page: Page = self
            .send(self.http_client.patch(&url).json(&body), "update_page")
            .await?;

        tracing::info!(page_id = %page.id, "Updated Notion page");
        Ok(page)
    }
}
