//! Hosted entity store consumed over HTTP.
//!
//! # Purpose
//! Thin client for the marketplace backend's key-value API. This backend is
//! the durable option in production; the service consumes it and preserves
//! its semantics exactly (no transactions, no CAS, unordered prefix scans).
//!
//! # Wire contract
//! - `GET    {base}/kv/{key}`        → 200 JSON document | 404
//! - `PUT    {base}/kv/{key}`        → 2xx, JSON body is the document
//! - `DELETE {base}/kv/{key}`        → 2xx (absent keys are also 2xx/404)
//! - `GET    {base}/kv?prefix=<p>`   → 200 JSON array of documents
//! - `GET    {base}/health`          → 2xx
//!
//! Authentication is a bearer credential issued by the upstream auth
//! provider; it is forwarded verbatim.
use super::{EntityStore, StoreError, StoreResult};
use crate::config::RemoteStoreConfig;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

pub struct RemoteStore {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl RemoteStore {
    pub fn connect(config: &RemoteStoreConfig) -> StoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|err| StoreError::Backend(format!("build http client: {err}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        let mut builder = self.client.request(method, url);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    fn document_url(&self, key: &str) -> String {
        format!("{}/kv/{key}", self.base_url)
    }
}

#[async_trait]
impl EntityStore for RemoteStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        let response = self
            .request(reqwest::Method::GET, self.document_url(key))
            .send()
            .await
            .map_err(|err| StoreError::Backend(format!("get {key}: {err}")))?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let value = response
                    .json()
                    .await
                    .map_err(|err| StoreError::Backend(format!("get {key}: decode: {err}")))?;
                Ok(Some(value))
            }
            status => Err(StoreError::Backend(format!("get {key}: status {status}"))),
        }
    }

    async fn set(&self, key: &str, value: Value) -> StoreResult<()> {
        let response = self
            .request(reqwest::Method::PUT, self.document_url(key))
            .json(&value)
            .send()
            .await
            .map_err(|err| StoreError::Backend(format!("set {key}: {err}")))?;
        if !response.status().is_success() {
            return Err(StoreError::Backend(format!(
                "set {key}: status {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let response = self
            .request(reqwest::Method::DELETE, self.document_url(key))
            .send()
            .await
            .map_err(|err| StoreError::Backend(format!("delete {key}: {err}")))?;
        // Absent keys delete cleanly, matching the memory backend.
        if !response.status().is_success() && response.status() != StatusCode::NOT_FOUND {
            return Err(StoreError::Backend(format!(
                "delete {key}: status {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn scan_by_prefix(&self, prefix: &str) -> StoreResult<Vec<Value>> {
        let response = self
            .request(reqwest::Method::GET, format!("{}/kv", self.base_url))
            .query(&[("prefix", prefix)])
            .send()
            .await
            .map_err(|err| StoreError::Backend(format!("scan {prefix}: {err}")))?;
        if !response.status().is_success() {
            return Err(StoreError::Backend(format!(
                "scan {prefix}: status {}",
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|err| StoreError::Backend(format!("scan {prefix}: decode: {err}")))
    }

    async fn health_check(&self) -> StoreResult<()> {
        let response = self
            .request(reqwest::Method::GET, format!("{}/health", self.base_url))
            .send()
            .await
            .map_err(|err| StoreError::Backend(format!("health: {err}")))?;
        if !response.status().is_success() {
            return Err(StoreError::Backend(format!(
                "health: status {}",
                response.status()
            )));
        }
        Ok(())
    }

    fn is_durable(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "remote"
    }
}
