//! Per-owner secondary indexes.
//!
//! # Purpose
//! The store has no secondary-index awareness, so each route handler rewrites
//! the owner's index as a separate, sequential store operation after the
//! primary write. Writes are ordered primary-then-index: a crash between the
//! two leaves an entity that exists but is missing from its owner's index
//! (recoverable via full prefix scan), never an index entry pointing at a
//! document that was never written.
//!
//! # Shape and retention
//! An index value is a JSON array of entity IDs, newest first, truncated to
//! the configured cap on every write. Overflowed IDs silently drop off the
//! index; the primary documents remain retrievable only via prefix scan.
//!
//! # Failure policy
//! Index maintenance is best-effort. Callers wrap it in [`best_effort`],
//! which logs and counts the failure without propagating it, so the primary
//! operation's success never depends on index health.
use crate::store::{EntityStore, StoreError, StoreResult};

/// Prepend `id` to the index at `key`, dedupe, and truncate to `cap`.
pub async fn push(store: &dyn EntityStore, key: &str, id: &str, cap: usize) -> StoreResult<()> {
    let mut ids = read(store, key).await?;
    ids.retain(|existing| existing != id);
    ids.insert(0, id.to_string());
    ids.truncate(cap);
    write(store, key, ids).await
}

/// Remove `id` from the index at `key`. Absent entries are not an error.
pub async fn remove(store: &dyn EntityStore, key: &str, id: &str) -> StoreResult<()> {
    let mut ids = read(store, key).await?;
    let before = ids.len();
    ids.retain(|existing| existing != id);
    if ids.len() == before {
        return Ok(());
    }
    write(store, key, ids).await
}

/// Read the ID list at `key`. A missing key is an empty index; a malformed
/// value is treated the same after a warning, since the store enforces no
/// schema.
pub async fn read(store: &dyn EntityStore, key: &str) -> StoreResult<Vec<String>> {
    match store.get(key).await? {
        Some(value) => match serde_json::from_value(value) {
            Ok(ids) => Ok(ids),
            Err(err) => {
                tracing::warn!(key, error = %err, "malformed index value, treating as empty");
                Ok(Vec::new())
            }
        },
        None => Ok(Vec::new()),
    }
}

async fn write(store: &dyn EntityStore, key: &str, ids: Vec<String>) -> StoreResult<()> {
    let value = serde_json::to_value(ids).map_err(|err| StoreError::Unexpected(err.into()))?;
    store.set(key, value).await
}

/// Log-and-swallow wrapper for side-effect writes whose failure must not fail
/// the enclosing operation.
pub fn best_effort(op: &'static str, result: StoreResult<()>) {
    if let Err(err) = result {
        metrics::counter!("exchange_side_effect_failures_total", "op" => op).increment(1);
        tracing::warn!(op, error = %err, "best-effort write failed");
    }
}
