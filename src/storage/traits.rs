use crate::error::Result;
use async_trait::async_trait;

/// A durable slot store: one named entry per key, each holding text.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replaces the whole entry. Readers never observe a half-written value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;
}
