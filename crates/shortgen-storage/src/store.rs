//! The object store contract.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StorageResult;

/// Opaque blob store addressed by string keys.
///
/// A `put` is atomic from the caller's point of view: a reader either sees
/// the full object or no object, never a partial write.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `bytes` at `key`, replacing any existing object.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> StorageResult<()>;

    /// Read the object at `key`. Missing keys are `StorageError::NotFound`.
    async fn get(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Whether an object exists at `key`.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// List all keys under `prefix`.
    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>>;
}

/// Serialize `value` as JSON and write it in a single `put`.
pub async fn put_json<T: Serialize + Sync>(
    store: &dyn ObjectStore,
    key: &str,
    value: &T,
) -> StorageResult<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    store.put(key, bytes, "application/json").await
}

/// Read and deserialize the JSON object at `key`.
pub async fn get_json<T: DeserializeOwned>(
    store: &dyn ObjectStore,
    key: &str,
) -> StorageResult<T> {
    let bytes = store.get(key).await?;
    Ok(serde_json::from_slice(&bytes)?)
}
