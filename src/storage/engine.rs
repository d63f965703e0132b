use crate::core::Result;
use async_trait::async_trait;

/// Asynchronous key-value byte store backing the durable snapshot.
///
/// All backends must implement this trait; the rest of the crate never
/// depends on a concrete backing technology.
#[async_trait]
pub trait KeyValueBackend: Send + Sync {
    /// Bytes stored under `key`, or `None` when the key was never written
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Short backend name used in log fields
    fn name(&self) -> &'static str;
}
