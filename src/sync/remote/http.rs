//! REST client for the cloud document store.
//!
//! Endpoints, all relative to `{base_url}/v1`:
//!
//! - `GET  /{collection}?owner_id={owner}` → `{"documents": [Document]}`
//! - `POST /{collection}` with the field map → `{"key": "..."}`
//! - `GET  /{collection}/{key}` → `Document`, or 404
//! - `PUT  /{collection}/{key}` with the field map
//! - `DELETE /{collection}/{key}` (404 counts as success)
//!
//! Nested collections use the full path, e.g. `ShoppingLists/{key}/Items`.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use super::{CollectionPath, Document, Fields, RemoteError, RemoteStore};

#[derive(Debug, Deserialize)]
struct QueryResponse {
    documents: Vec<Document>,
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    key: String,
}

/// Remote store reached over HTTP with bearer-token auth.
#[derive(Debug, Clone)]
pub struct HttpRemoteStore {
    client: Client,
    base_url: String,
    api_token: Option<String>,
    timeout: Duration,
}

impl HttpRemoteStore {
    pub fn new(
        base_url: impl Into<String>,
        api_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token,
            timeout,
        })
    }

    fn collection_url(&self, path: &CollectionPath) -> String {
        let encoded: Vec<String> = path
            .segments()
            .into_iter()
            .map(|s| urlencoding::encode(s).into_owned())
            .collect();
        format!("{}/v1/{}", self.base_url, encoded.join("/"))
    }

    fn document_url(&self, path: &CollectionPath, key: &str) -> String {
        format!("{}/{}", self.collection_url(path), urlencoding::encode(key))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, RemoteError> {
        builder.send().await.map_err(|e| self.map_reqwest(e))
    }

    fn map_reqwest(&self, e: reqwest::Error) -> RemoteError {
        if e.is_timeout() {
            RemoteError::Timeout(self.timeout)
        } else if e.is_decode() {
            RemoteError::InvalidResponse(e.to_string())
        } else {
            RemoteError::Transport(e.to_string())
        }
    }

    async fn check_status(response: Response) -> Result<Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(RemoteError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn query(
        &self,
        path: &CollectionPath,
        owner_id: &str,
    ) -> Result<Vec<Document>, RemoteError> {
        let url = self.collection_url(path);
        let response = self
            .send(self.request(Method::GET, &url).query(&[("owner_id", owner_id)]))
            .await?;
        let body: QueryResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| self.map_reqwest(e))?;
        Ok(body.documents)
    }

    async fn get(
        &self,
        path: &CollectionPath,
        key: &str,
    ) -> Result<Option<Document>, RemoteError> {
        let url = self.document_url(path, key);
        let response = self.send(self.request(Method::GET, &url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let doc: Document = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| self.map_reqwest(e))?;
        Ok(Some(doc))
    }

    async fn create(&self, path: &CollectionPath, fields: Fields) -> Result<String, RemoteError> {
        let url = self.collection_url(path);
        let response = self
            .send(self.request(Method::POST, &url).json(&fields))
            .await?;
        let body: CreateResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| self.map_reqwest(e))?;
        Ok(body.key)
    }

    async fn set(
        &self,
        path: &CollectionPath,
        key: &str,
        fields: Fields,
    ) -> Result<(), RemoteError> {
        let url = self.document_url(path, key);
        let response = self
            .send(self.request(Method::PUT, &url).json(&fields))
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn delete(&self, path: &CollectionPath, key: &str) -> Result<(), RemoteError> {
        let url = self.document_url(path, key);
        let response = self.send(self.request(Method::DELETE, &url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::check_status(response).await?;
        Ok(())
    }
}
