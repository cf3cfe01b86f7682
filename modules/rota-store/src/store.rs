use std::pin::Pin;

use anyhow::Result;
use async_trait::async_trait;
use futures::Stream;

/// Ordered stream of raw payloads from a pub/sub subscription.
pub type ByteStream = Pin<Box<dyn Stream<Item = Vec<u8>> + Send>>;

/// Durable key-value store with a pub/sub side-channel.
///
/// Values are opaque byte blobs. Subscriptions only see payloads published
/// after the `subscribe` call returns; delivery within one channel preserves
/// publish order for a given subscriber.
#[async_trait]
pub trait Store: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Remove `key`. Returns true if it existed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Values of every key starting with `prefix`, in key order.
    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<Vec<u8>>>;

    /// Publish a payload on a named channel. Fire-and-forget: no delivery
    /// guarantee to any particular subscriber.
    async fn publish(&self, channel: &str, payload: &[u8]) -> Result<()>;

    /// Subscribe to a channel. The returned stream is unbounded and ends
    /// only when the store itself goes away.
    async fn subscribe(&self, channel: &str) -> Result<ByteStream>;
}
