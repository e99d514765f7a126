use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::application::channels::DeliveryChannel;
use crate::domain::repositories::DeliveryRepository;

/// Applies provider delivery callbacks, correlated by receipt id. Callbacks
/// arrive at least once and possibly out of order: an unknown receipt and a
/// duplicate or stale confirmation are both treated as success without
/// mutation. Only infrastructure errors propagate.
pub struct ConfirmDeliveryUseCase<Ch: DeliveryChannel> {
    repository: Arc<dyn DeliveryRepository<Ch::Content>>,
}

impl<Ch: DeliveryChannel> ConfirmDeliveryUseCase<Ch> {
    pub fn new(repository: Arc<dyn DeliveryRepository<Ch::Content>>) -> Self {
        Self { repository }
    }

    pub async fn confirm_delivered(
        &self,
        receipt_id: &str,
        delivered_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let Some(mut delivery) = self.repository.find_by_receipt_id(receipt_id).await? else {
            info!(
                channel = Ch::name(),
                receipt_id, "no delivery found for receipt, ignoring confirmation"
            );
            return Ok(());
        };

        match delivery.confirm_delivery(receipt_id, delivered_at) {
            Ok(()) => {
                let delivery = self.repository.save(delivery, false).await?;
                info!(
                    channel = Ch::name(),
                    receipt_id,
                    id = %delivery.id(),
                    "delivery confirmed"
                );
                Ok(())
            }
            Err(error) if error.is_rule_violation() => {
                info!(
                    channel = Ch::name(),
                    receipt_id,
                    reason = %error,
                    "ignoring duplicate or stale delivery confirmation"
                );
                Ok(())
            }
            Err(error) => Err(error.into()),
        }
    }

    pub async fn confirm_delivery_failed(
        &self,
        receipt_id: &str,
        failed_at: DateTime<Utc>,
        reason: &str,
    ) -> anyhow::Result<()> {
        let Some(mut delivery) = self.repository.find_by_receipt_id(receipt_id).await? else {
            info!(
                channel = Ch::name(),
                receipt_id, "no delivery found for receipt, ignoring failure confirmation"
            );
            return Ok(());
        };

        match delivery.confirm_delivery_failed(receipt_id, failed_at, reason) {
            Ok(()) => {
                let delivery = self.repository.save(delivery, false).await?;
                info!(
                    channel = Ch::name(),
                    receipt_id,
                    id = %delivery.id(),
                    reason,
                    "delivery failure confirmed"
                );
                Ok(())
            }
            Err(error) if error.is_rule_violation() => {
                info!(
                    channel = Ch::name(),
                    receipt_id,
                    reason = %error,
                    "ignoring duplicate or stale failure confirmation"
                );
                Ok(())
            }
            Err(error) => Err(error.into()),
        }
    }
}
