use serde::de::DeserializeOwned;

use crate::application::queued_messages::{EmailMessagePayload, SmsMessagePayload};
use crate::application::views::{
    to_delivered_email, to_delivered_sms, DeliveredEmail, DeliveredSms,
};
use crate::domain::errors::DomainError;
use crate::domain::models::{Delivery, EmailContent, SmsContent};
use crate::domain::value_objects::{EmailRecipient, PhoneNumber};

/// Everything channel-specific about a delivery: the content the aggregate
/// stores, the queued payload it is built from, and the client-facing view.
/// The state machine, dispatch loop and confirmation handlers are written
/// once over this trait instead of once per channel.
pub trait DeliveryChannel: Send + Sync + 'static {
    type Content: Clone + Send + Sync;
    type Payload: DeserializeOwned + Send;
    type View;

    fn name() -> &'static str;

    /// Validates the queued payload into aggregate content. Missing body or
    /// recipient is a validation error, which aborts the dispatch cycle.
    fn content_from_payload(payload: Self::Payload) -> Result<Self::Content, DomainError>;

    /// Recipient address, for trace output only.
    fn recipient(content: &Self::Content) -> &str;

    fn to_view(delivery: &Delivery<Self::Content>) -> Self::View;
}

pub struct SmsChannel;

impl DeliveryChannel for SmsChannel {
    type Content = SmsContent;
    type Payload = SmsMessagePayload;
    type View = DeliveredSms;

    fn name() -> &'static str {
        "sms"
    }

    fn content_from_payload(payload: Self::Payload) -> Result<Self::Content, DomainError> {
        let body = payload
            .body
            .filter(|body| !body.is_empty())
            .ok_or_else(|| DomainError::Validation("sms message is missing a body".to_string()))?;
        let to = PhoneNumber::new(payload.to_phone_number.ok_or_else(|| {
            DomainError::Validation("sms message is missing a recipient".to_string())
        })?)?;
        Ok(SmsContent {
            body,
            to,
            tags: payload.tags.unwrap_or_default(),
        })
    }

    fn recipient(content: &Self::Content) -> &str {
        content.to.number()
    }

    fn to_view(delivery: &Delivery<Self::Content>) -> Self::View {
        to_delivered_sms(delivery)
    }
}

pub struct EmailChannel;

impl DeliveryChannel for EmailChannel {
    type Content = EmailContent;
    type Payload = EmailMessagePayload;
    type View = DeliveredEmail;

    fn name() -> &'static str {
        "email"
    }

    fn content_from_payload(payload: Self::Payload) -> Result<Self::Content, DomainError> {
        if payload.body.is_none() && payload.template_id.is_none() {
            return Err(DomainError::Validation(
                "email message requires a body or a template id".to_string(),
            ));
        }
        let to = EmailRecipient::new(
            payload.to_email_address.ok_or_else(|| {
                DomainError::Validation("email message is missing a recipient".to_string())
            })?,
            payload.to_display_name.unwrap_or_default(),
        )?;
        Ok(EmailContent {
            subject: payload.subject,
            body: payload.body,
            template_id: payload.template_id,
            substitutions: payload.substitutions.unwrap_or_default(),
            to,
            tags: payload.tags.unwrap_or_default(),
        })
    }

    fn recipient(content: &Self::Content) -> &str {
        content.to.email_address.as_str()
    }

    fn to_view(delivery: &Delivery<Self::Content>) -> Self::View {
        to_delivered_email(delivery)
    }
}
