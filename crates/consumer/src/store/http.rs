//! Search-store REST client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;

use super::IndexStore;
use crate::error::StoreError;

const ALREADY_EXISTS: &str = "resource_already_exists_exception";
const MAX_BODY: usize = 512;

/// Index store speaking the search-store REST API.
///
/// - `HEAD /{index}` checks existence.
/// - `PUT /{index}` creates an index.
/// - `POST /{index}/_doc` appends a document.
#[derive(Debug, Clone)]
pub struct HttpIndexStore {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpIndexStore {
    /// Client for the store at `base_url`, each request bounded by `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            timeout,
        })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    fn transport(&self, err: reqwest::Error) -> StoreError {
        if err.is_timeout() {
            StoreError::Timeout(self.timeout)
        } else if err.is_connect() {
            StoreError::Unavailable(err.to_string())
        } else {
            StoreError::Http(err)
        }
    }
}

async fn unexpected(response: Response) -> StoreError {
    let status = response.status().as_u16();
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_BODY {
        let mut end = MAX_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }
    StoreError::Status { status, body }
}

#[async_trait]
impl IndexStore for HttpIndexStore {
    async fn index_exists(&self, index: &str) -> Result<bool, StoreError> {
        let response = self
            .client
            .head(self.url(index))
            .send()
            .await
            .map_err(|e| self.transport(e))?;
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(unexpected(response).await),
        }
    }

    async fn create_index(&self, index: &str) -> Result<(), StoreError> {
        let response = self
            .client
            .put(self.url(index))
            .send()
            .await
            .map_err(|e| self.transport(e))?;
        if response.status().is_success() {
            return Ok(());
        }
        match unexpected(response).await {
            StoreError::Status { status: 400, body } if body.contains(ALREADY_EXISTS) => {
                Err(StoreError::AlreadyExists {
                    index: index.to_owned(),
                })
            }
            other => Err(other),
        }
    }

    async fn index_document(&self, index: &str, document: &Value) -> Result<(), StoreError> {
        let response = self
            .client
            .post(self.url(&format!("{index}/_doc")))
            .json(document)
            .send()
            .await
            .map_err(|e| self.transport(e))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(unexpected(response).await)
        }
    }
}
