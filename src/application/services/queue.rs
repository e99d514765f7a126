use async_trait::async_trait;

/// Minimal queue capability backing the test/ops drain mode. Production
/// consumption goes through the JetStream worker instead.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    async fn push(&self, message_as_json: String) -> anyhow::Result<()>;
    async fn pop(&self) -> anyhow::Result<Option<String>>;
}
