//! Entity store abstraction.
//!
//! # Purpose
//! Defines the key→JSON-document contract every handler persists through, and
//! the error taxonomy store backends surface.
//!
//! # Contract
//! The store is the sole source of truth and deliberately minimal: no
//! compare-and-swap, no multi-key atomicity, no schema enforcement, no
//! ordering guarantee on prefix scans. Every invariant above this layer is
//! advisory and maintained by callers, which is why the route handlers
//! validate before writing and order multi-step sequences primary-first.
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub mod keys;
pub mod memory;
pub mod remote;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("backend: {0}")]
    Backend(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Generic key-value document store.
///
/// `scan_by_prefix` returns matching documents in no particular order;
/// callers impose ordering themselves (the handlers sort on `created_at`
/// after the scan completes). `delete` of an absent key succeeds, which keeps
/// cascade paths re-runnable.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<Value>>;
    async fn set(&self, key: &str, value: Value) -> StoreResult<()>;
    async fn delete(&self, key: &str) -> StoreResult<()>;
    async fn scan_by_prefix(&self, prefix: &str) -> StoreResult<Vec<Value>>;

    async fn health_check(&self) -> StoreResult<()>;
    fn is_durable(&self) -> bool;
    fn backend_name(&self) -> &'static str;
}
