use std::sync::Arc;

use tracing::{debug, info};

use crate::application::channels::DeliveryChannel;
use crate::application::queued_messages::{rehydrate, QueuedMessage};
use crate::application::services::id_factory::IdFactory;
use crate::application::services::queue::MessageQueue;
use crate::application::services::transport::DeliveryTransport;
use crate::domain::errors::DomainError;
use crate::domain::models::Delivery;
use crate::domain::repositories::DeliveryRepository;
use crate::domain::value_objects::{DatacenterLocation, QueuedMessageId};

/// The per-message dispatch cycle: rehydrate, find-or-create the aggregate by
/// message id, record an attempt, persist, then invoke the transport and
/// persist the outcome. The queue delivers at least once; the aggregate's
/// attempt guard turns redeliveries into no-ops before the transport is ever
/// touched.
pub struct DispatchDeliveryUseCase<Ch: DeliveryChannel> {
    repository: Arc<dyn DeliveryRepository<Ch::Content>>,
    transport: Arc<dyn DeliveryTransport<Ch::Content>>,
    id_factory: Arc<dyn IdFactory>,
    host_region: DatacenterLocation,
}

impl<Ch: DeliveryChannel> DispatchDeliveryUseCase<Ch> {
    pub fn new(
        repository: Arc<dyn DeliveryRepository<Ch::Content>>,
        transport: Arc<dyn DeliveryTransport<Ch::Content>>,
        id_factory: Arc<dyn IdFactory>,
        host_region: DatacenterLocation,
    ) -> Self {
        Self {
            repository,
            transport,
            id_factory,
            host_region,
        }
    }

    pub async fn dispatch_json(&self, message_as_json: &str) -> anyhow::Result<bool> {
        let message = rehydrate::<Ch::Payload>(message_as_json)?;
        self.dispatch(message).await
    }

    /// Returns `Ok(true)` when the message is durably sent, whether by this
    /// cycle or an earlier one. Validation failures and transport/persistence
    /// errors propagate to the queue infrastructure, which owns retry,
    /// backoff and dead-lettering; this loop never retries internally.
    pub async fn dispatch(&self, message: QueuedMessage<Ch::Payload>) -> anyhow::Result<bool> {
        let payload = message.message.ok_or_else(|| {
            DomainError::Validation(format!("{} message is missing its payload", Ch::name()))
        })?;
        let message_id = QueuedMessageId::new(message.message_id.unwrap_or_default())?;
        let content = Ch::content_from_payload(payload)?;
        let origin_region = message
            .origin_host_region
            .map(DatacenterLocation::new)
            .unwrap_or_else(DatacenterLocation::unknown);

        let retrieved = self.repository.find_by_message_id(&message_id).await?;
        let found = retrieved.is_some();
        let mut delivery = match retrieved {
            // Redelivery path: the aggregate already carries its details.
            Some(existing) => existing,
            None => {
                let mut created = Delivery::create(
                    self.id_factory.next_id(),
                    message_id.clone(),
                    message.tenant_id.clone(),
                    self.host_region.clone(),
                );
                created.set_details(content.clone())?;
                created
            }
        };

        let already_sent = delivery.attempt_sending()?;
        if already_sent {
            info!(
                channel = Ch::name(),
                id = %delivery.id(),
                to = Ch::recipient(&content),
                origin = origin_region.code(),
                call_id = %message.call_id,
                "message is already sent"
            );
            return Ok(true);
        }

        // Persist the attempt before the transport call: a crash in between
        // leaves an attempt on record and the next redelivery can safely
        // retry the send.
        let events = delivery.take_events();
        let mut delivery = self.repository.save(delivery, !found).await?;
        debug!(?events, "delivery persisted before send");

        let to = Ch::recipient(delivery.content().ok_or_else(|| {
            DomainError::Validation(format!("{} delivery has no details", Ch::name()))
        })?)
        .to_string();

        match self.transport.send(&content).await {
            Ok(receipt) => {
                delivery.succeeded_sending(receipt.receipt_id)?;
                let delivery = self.repository.save(delivery, false).await?;
                info!(
                    channel = Ch::name(),
                    id = %delivery.id(),
                    to = %to,
                    origin = origin_region.code(),
                    call_id = %message.call_id,
                    "sent message for delivery"
                );
                Ok(true)
            }
            Err(send_error) => {
                delivery.failed_sending()?;
                let delivery = self.repository.save(delivery, false).await?;
                info!(
                    channel = Ch::name(),
                    id = %delivery.id(),
                    to = %to,
                    origin = origin_region.code(),
                    call_id = %message.call_id,
                    "sending of message failed"
                );
                Err(send_error)
            }
        }
    }

    /// Pops and dispatches every queued message. Test/ops-triggered drain
    /// mode only.
    pub async fn drain_all(&self, queue: &dyn MessageQueue) -> anyhow::Result<()> {
        while let Some(message_as_json) = queue.pop().await? {
            self.dispatch_json(&message_as_json).await?;
        }
        info!(channel = Ch::name(), "drained all queued messages");
        Ok(())
    }
}
