//! In-memory implementation of the entity store.
//!
//! # Purpose
//! Implements `EntityStore` entirely in memory using a `HashMap` guarded by
//! `tokio::sync::RwLock`. It exists for:
//! - local development and tests (no external dependencies)
//! - deployments where durability is not required
//! - as a fallback when the hosted store is not configured
//!
//! # Durability and consistency
//! - **Not durable**: all state is lost on process restart.
//! - **Per-operation consistency only**: each `get`/`set`/`delete`/`scan` is
//!   internally consistent, but there is no coordination *across* operations.
//!   A handler's read-modify-write of a counter can interleave with another
//!   handler's, exactly as it can against the hosted store.
//! - `scan_by_prefix` iterates a `HashMap`, so results carry no ordering
//!   guarantee — callers must sort if they need order.
//!
//! # Metrics
//! Updates a document-count gauge so observability behavior stays consistent
//! with the remote backend.
use super::{EntityStore, StoreResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory entity store.
///
/// The map is wrapped in `Arc<RwLock<...>>` so the store can be cloned and
/// shared across async request handlers, with concurrent reads and serialized
/// writes per operation.
#[derive(Clone, Default)]
pub struct MemoryStore {
    documents: Arc<RwLock<HashMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        Ok(self.documents.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> StoreResult<()> {
        let mut documents = self.documents.write().await;
        documents.insert(key.to_string(), value);
        metrics::gauge!("exchange_documents_total").set(documents.len() as f64);
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        // Deleting an absent key succeeds; cascades rely on re-runnability.
        let mut documents = self.documents.write().await;
        documents.remove(key);
        metrics::gauge!("exchange_documents_total").set(documents.len() as f64);
        Ok(())
    }

    async fn scan_by_prefix(&self, prefix: &str) -> StoreResult<Vec<Value>> {
        Ok(self
            .documents
            .read()
            .await
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(_, value)| value.clone())
            .collect())
    }

    async fn health_check(&self) -> StoreResult<()> {
        // In-memory backend is always "healthy" if the process is running.
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
