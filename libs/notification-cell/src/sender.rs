use async_trait::async_trait;

use crate::models::NotificationRequest;

/// External delivery contract. Implementations own transports and retries;
/// the engine treats a send as best-effort.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn execute(&self, request: NotificationRequest) -> anyhow::Result<()>;
}
