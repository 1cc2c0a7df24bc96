// crates/multidb-adapters/src/wiki/bookstack.rs
// ============================================================================
// Module: BookStack Client
// Description: Token-authenticated REST client for the BookStack API.
// Purpose: Serve the wiki tools from a BookStack instance.
// Dependencies: reqwest, url
// ============================================================================

//! ## Overview
//! Requests go to `{base}/api/...` with `Authorization: Token <id>:<secret>`.
//! Non-success statuses are reported as backend failures carrying the status;
//! transport errors are reported as unavailability.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use serde_json::Value;
use url::Url;

use super::WikiApi;
use crate::error::StoreError;

/// BookStack REST client.
pub struct BookStackClient {
    /// HTTP client with auth headers preset.
    client: Client,
    /// API root, always ending in `/api/`.
    api_root: Url,
}

impl BookStackClient {
    /// Builds a client for the instance at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] when the URL or token is unusable.
    pub fn new(
        base_url: &str,
        token_id: &str,
        token_secret: &str,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let mut api_root = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|err| StoreError::Unavailable(format!("invalid wiki url: {err}")))?;
        let path = format!("{}/api/", api_root.path().trim_end_matches('/'));
        api_root.set_path(&path);

        let mut headers = HeaderMap::new();
        let mut token = HeaderValue::from_str(&format!("Token {token_id}:{token_secret}"))
            .map_err(|_| StoreError::Unavailable("wiki token contains invalid characters".to_string()))?;
        token.set_sensitive(true);
        headers.insert(AUTHORIZATION, token);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        Ok(Self {
            client,
            api_root,
        })
    }

    /// Returns the endpoint URL for `path` with `query` pairs appended.
    fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url, StoreError> {
        let mut url =
            self.api_root.join(path).map_err(|err| StoreError::Backend(err.to_string()))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Issues a GET and decodes the JSON body.
    async fn get_json(&self, url: Url) -> Result<Value, StoreError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| StoreError::Unavailable(err.without_url().to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Backend(format!("wiki API returned status {status}")));
        }
        response
            .json::<Value>()
            .await
            .map_err(|err| StoreError::Backend(format!("invalid wiki response: {}", err.without_url())))
    }
}

#[async_trait]
impl WikiApi for BookStackClient {
    async fn search(&self, query: &str, count: u32) -> Result<Value, StoreError> {
        let url =
            self.endpoint("search", &[("query", query.to_string()), ("count", count.to_string())])?;
        self.get_json(url).await
    }

    async fn page(&self, id: u64) -> Result<Value, StoreError> {
        let url = self.endpoint(&format!("pages/{id}"), &[])?;
        self.get_json(url).await
    }

    async fn books(&self, count: u32) -> Result<Value, StoreError> {
        let url = self.endpoint("books", &[("count", count.to_string())])?;
        self.get_json(url).await
    }
}
