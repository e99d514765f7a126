use async_trait::async_trait;

/// Receipt returned by the delivery provider on a successful send; later
/// delivery confirmations correlate on this id.
#[derive(Debug, Clone)]
pub struct SendReceipt {
    pub receipt_id: Option<String>,
}

/// Outbound send capability for one delivery channel. Transient and
/// permanent failures are indistinguishable here; both mark the attempt
/// failed and the queue infrastructure owns retry policy.
#[async_trait]
pub trait DeliveryTransport<C>: Send + Sync {
    async fn send(&self, content: &C) -> anyhow::Result<SendReceipt>;
}
