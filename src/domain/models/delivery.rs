use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::events::DeliveryEvent;
use crate::domain::models::{EmailContent, SmsContent};
use crate::domain::value_objects::{DatacenterLocation, QueuedMessageId, SendingAttempts};

pub type SmsDelivery = Delivery<SmsContent>;
pub type EmailDelivery = Delivery<EmailContent>;

/// One outbound notification's lifecycle, from creation through send attempts
/// to provider-confirmed delivery or failure. Email and sms deliveries share
/// this state machine, parameterized over the channel content type.
///
/// The machine is `Unsent -> Attempting -> Sent -> Delivered | DeliveryFailed`.
/// "Attempting" is not a stored field; it is derived from having an attempt
/// more recent than the last terminal event. Aggregates are never deleted:
/// the attempt list is an append-only audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery<C> {
    id: Uuid,
    message_id: QueuedMessageId,
    organization_id: Option<String>,
    host_region: DatacenterLocation,
    content: Option<C>,
    created: DateTime<Utc>,
    attempts: SendingAttempts,
    sent: Option<DateTime<Utc>>,
    delivered: Option<DateTime<Utc>>,
    delivery_failed: Option<DateTime<Utc>>,
    delivery_failed_reason: Option<String>,
    receipt_id: Option<String>,
    version: u64,
    #[serde(skip, default)]
    pending_events: Vec<DeliveryEvent>,
}

impl<C: Clone> Delivery<C> {
    pub fn create(
        id: Uuid,
        message_id: QueuedMessageId,
        organization_id: Option<String>,
        host_region: DatacenterLocation,
    ) -> Self {
        let now = Utc::now();
        let mut delivery = Self {
            id,
            message_id: message_id.clone(),
            organization_id: organization_id.clone(),
            host_region: host_region.clone(),
            content: None,
            created: now,
            attempts: SendingAttempts::default(),
            sent: None,
            delivered: None,
            delivery_failed: None,
            delivery_failed_reason: None,
            receipt_id: None,
            version: 0,
            pending_events: Vec::new(),
        };
        delivery.raise(DeliveryEvent::Created {
            message_id,
            organization_id,
            host_region: host_region.code().to_string(),
            when: now,
        });
        delivery
    }

    /// Replaces the message content. Content is frozen once a send has
    /// occurred; changing it afterwards is a rule violation.
    pub fn set_details(&mut self, content: C) -> Result<(), DomainError> {
        if self.sent.is_some() {
            return Err(DomainError::RuleViolation(
                "cannot change details of an already-sent message".to_string(),
            ));
        }
        self.content = Some(content);
        self.raise(DeliveryEvent::DetailsChanged { when: Utc::now() });
        Ok(())
    }

    /// Records a new send attempt, or reports that the message is already
    /// durably sent. Returns `true` when already sent: the caller must then
    /// skip the transport entirely. This is the idempotency guard that keeps
    /// at-least-once queue redelivery from double-notifying anyone.
    pub fn attempt_sending(&mut self) -> Result<bool, DomainError> {
        if self.sent.is_some() {
            return Ok(true);
        }
        let now = Utc::now();
        self.attempts.attempt(now)?;
        self.raise(DeliveryEvent::SendingAttempted { when: now });
        Ok(false)
    }

    /// Marks the message as sent and stores the provider receipt. Rejects a
    /// second success independently of the caller's discipline.
    pub fn succeeded_sending(&mut self, receipt_id: Option<String>) -> Result<(), DomainError> {
        if self.sent.is_some() {
            return Err(DomainError::RuleViolation(
                "message was already sent".to_string(),
            ));
        }
        if self.attempts.count() == 0 {
            return Err(DomainError::RuleViolation(
                "sending was never attempted".to_string(),
            ));
        }
        let now = Utc::now();
        self.sent = Some(now);
        self.receipt_id = receipt_id.clone();
        self.raise(DeliveryEvent::SendingSucceeded {
            when: now,
            receipt_id,
        });
        Ok(())
    }

    /// Marks the most recent attempt as failed. Not terminal: a later
    /// `attempt_sending` may retry.
    pub fn failed_sending(&mut self) -> Result<(), DomainError> {
        if self.sent.is_some() {
            return Err(DomainError::RuleViolation(
                "message was already sent".to_string(),
            ));
        }
        if self.attempts.count() == 0 {
            return Err(DomainError::RuleViolation(
                "sending was never attempted".to_string(),
            ));
        }
        self.raise(DeliveryEvent::SendingFailed { when: Utc::now() });
        Ok(())
    }

    /// Applies a provider delivery confirmation, correlated by receipt id.
    /// Confirmations for a stale or unknown receipt, and duplicate
    /// confirmations, are rule violations; callers treat those as no-ops
    /// since provider callbacks are themselves at-least-once.
    pub fn confirm_delivery(
        &mut self,
        receipt_id: &str,
        delivered_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.check_confirmable(receipt_id)?;
        self.delivered = Some(delivered_at);
        self.raise(DeliveryEvent::DeliveryConfirmed {
            receipt_id: receipt_id.to_string(),
            when: delivered_at,
        });
        Ok(())
    }

    pub fn confirm_delivery_failed(
        &mut self,
        receipt_id: &str,
        failed_at: DateTime<Utc>,
        reason: impl Into<String>,
    ) -> Result<(), DomainError> {
        self.check_confirmable(receipt_id)?;
        let reason = reason.into();
        self.delivery_failed = Some(failed_at);
        self.delivery_failed_reason = Some(reason.clone());
        self.raise(DeliveryEvent::DeliveryFailureConfirmed {
            receipt_id: receipt_id.to_string(),
            when: failed_at,
            reason,
        });
        Ok(())
    }

    fn check_confirmable(&self, receipt_id: &str) -> Result<(), DomainError> {
        match &self.receipt_id {
            Some(current) if current == receipt_id => {}
            Some(_) => {
                return Err(DomainError::RuleViolation(format!(
                    "receipt '{receipt_id}' does not match the current receipt"
                )));
            }
            None => {
                return Err(DomainError::RuleViolation(
                    "message has no receipt to confirm against".to_string(),
                ));
            }
        }
        if self.delivered.is_some() || self.delivery_failed.is_some() {
            return Err(DomainError::RuleViolation(
                "delivery outcome was already confirmed".to_string(),
            ));
        }
        Ok(())
    }

    /// Drains the events raised since the last drain, in the order raised.
    pub fn take_events(&mut self) -> Vec<DeliveryEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn events(&self) -> &[DeliveryEvent] {
        &self.pending_events
    }

    fn raise(&mut self, event: DeliveryEvent) {
        self.pending_events.push(event);
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn message_id(&self) -> &QueuedMessageId {
        &self.message_id
    }

    pub fn organization_id(&self) -> Option<&str> {
        self.organization_id.as_deref()
    }

    pub fn host_region(&self) -> &DatacenterLocation {
        &self.host_region
    }

    pub fn content(&self) -> Option<&C> {
        self.content.as_ref()
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn attempts(&self) -> &SendingAttempts {
        &self.attempts
    }

    pub fn is_sent(&self) -> bool {
        self.sent.is_some()
    }

    pub fn sent(&self) -> Option<DateTime<Utc>> {
        self.sent
    }

    pub fn delivered(&self) -> Option<DateTime<Utc>> {
        self.delivered
    }

    pub fn delivery_failed(&self) -> Option<DateTime<Utc>> {
        self.delivery_failed
    }

    pub fn delivery_failed_reason(&self) -> Option<&str> {
        self.delivery_failed_reason.as_deref()
    }

    pub fn receipt_id(&self) -> Option<&str> {
        self.receipt_id.as_deref()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Bumped by the repository on every successful save; saves carrying a
    /// stale version are rejected.
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}
