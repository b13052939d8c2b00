use anyhow::Result;
use serde_json::Value;

/// Object-safe key-value store provided by the host environment.
///
/// Blobs are arbitrary JSON values. Implementations must be internally
/// synchronized since callers only hold `&self`.
pub trait KeyValueStore: Send + Sync {
    /// Retrieves the blob stored under `key`, or `None` when nothing is stored.
    fn get_sync(&self, key: &str) -> Result<Option<Value>>;

    /// Stores `blob` under `key`, replacing any previous value.
    ///
    /// Callers treat this as fire-and-forget: an error is reported back, but
    /// nobody retries it.
    fn set(&self, key: &str, blob: Value) -> Result<()>;
}
