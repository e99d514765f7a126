use std::sync::Arc;
use std::time::Duration;

use async_nats::jetstream::{
    self,
    consumer::{pull, AckPolicy, PullConsumer},
};
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::{error, warn};

use crate::application::channels::DeliveryChannel;
use crate::application::usecases::dispatch_delivery::DispatchDeliveryUseCase;
use crate::domain::errors::DomainError;

#[derive(Clone)]
pub struct JetstreamConfig {
    pub url: String,
    pub stream: String,
    pub subject: String,
    pub durable: String,
    pub pull_batch: usize,
    pub ack_wait_seconds: u64,
    pub max_deliver: i64,
}

/// Pull-consumer worker draining one channel's notification queue. Messages
/// are acked only after a successful dispatch cycle; anything else is left
/// unacked so the stream's ack-wait and max-deliver settings govern
/// redelivery and dead-lettering. The dispatch loop itself never retries.
pub struct JetstreamWorker<Ch: DeliveryChannel> {
    consumer: PullConsumer,
    pull_batch: usize,
    dispatcher: Arc<DispatchDeliveryUseCase<Ch>>,
}

impl<Ch: DeliveryChannel> JetstreamWorker<Ch> {
    pub async fn new(
        config: &JetstreamConfig,
        dispatcher: Arc<DispatchDeliveryUseCase<Ch>>,
    ) -> anyhow::Result<Self> {
        let client = async_nats::connect(&config.url).await?;
        let context = jetstream::new(client);

        let stream = context
            .get_or_create_stream(jetstream::stream::Config {
                name: config.stream.clone(),
                subjects: vec![config.subject.clone()],
                ..Default::default()
            })
            .await?;

        let consumer = stream
            .get_or_create_consumer(
                &config.durable,
                pull::Config {
                    durable_name: Some(config.durable.clone()),
                    ack_policy: AckPolicy::Explicit,
                    ack_wait: Duration::from_secs(config.ack_wait_seconds),
                    max_deliver: config.max_deliver,
                    ..Default::default()
                },
            )
            .await?;

        Ok(Self {
            consumer,
            pull_batch: config.pull_batch,
            dispatcher,
        })
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(err) = self.run().await {
                error!(channel = Ch::name(), "queue worker stopped: {err:?}");
            }
        })
    }

    async fn run(self) -> anyhow::Result<()> {
        loop {
            let mut batch = self
                .consumer
                .batch()
                .max_messages(self.pull_batch)
                .messages()
                .await?;
            while let Some(message) = batch.next().await {
                match message {
                    Ok(message) => {
                        if let Err(err) = self.process_message(message).await {
                            error!(channel = Ch::name(), "failed to process message: {err:?}");
                        }
                    }
                    Err(err) => {
                        error!(channel = Ch::name(), "queue batch error: {err:?}");
                    }
                }
            }
        }
    }

    async fn process_message(&self, message: jetstream::Message) -> anyhow::Result<()> {
        let message_as_json = std::str::from_utf8(&message.payload)?;
        match self.dispatcher.dispatch_json(message_as_json).await {
            Ok(_) => message
                .ack()
                .await
                .map_err(|err| anyhow::anyhow!("failed to ack message: {err}")),
            // Malformed messages can never dispatch; redelivering them just
            // burns max-deliver attempts, so they are acked and dropped.
            Err(err) if is_nonretryable(&err) => {
                warn!(channel = Ch::name(), "dropping malformed message: {err:?}");
                message
                    .ack()
                    .await
                    .map_err(|err| anyhow::anyhow!("failed to ack message: {err}"))
            }
            // Left unacked: the queue redelivers after ack-wait, or
            // dead-letters once max-deliver is exhausted.
            Err(err) => Err(err),
        }
    }
}

fn is_nonretryable(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<DomainError>(),
        Some(DomainError::Validation(_))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_nonretryable() {
        let error: anyhow::Error =
            DomainError::Validation("sms message is missing a body".to_string()).into();
        assert!(is_nonretryable(&error));
    }

    #[test]
    fn transport_and_concurrency_errors_are_retryable() {
        assert!(!is_nonretryable(&anyhow::anyhow!("provider unavailable")));

        let concurrency: anyhow::Error =
            DomainError::Concurrency("delivery was modified concurrently".to_string()).into();
        assert!(!is_nonretryable(&concurrency));
    }
}
