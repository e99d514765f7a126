use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::models::{EmailDelivery, SmsDelivery};

/// Client-facing projection of one sms delivery: lifecycle flags and
/// timestamps flattened out of the aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveredSms {
    pub id: Uuid,
    pub organization_id: Option<String>,
    pub created: DateTime<Utc>,
    pub attempts: Vec<DateTime<Utc>>,
    pub body: Option<String>,
    pub to_phone_number: Option<String>,
    pub is_sent: bool,
    pub sent_at: Option<DateTime<Utc>>,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub is_delivery_failed: bool,
    pub failed_delivery_at: Option<DateTime<Utc>>,
    pub failed_delivery_reason: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveredEmail {
    pub id: Uuid,
    pub organization_id: Option<String>,
    pub created: DateTime<Utc>,
    pub attempts: Vec<DateTime<Utc>>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub to_email_address: Option<String>,
    pub to_display_name: Option<String>,
    pub is_sent: bool,
    pub sent_at: Option<DateTime<Utc>>,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub is_delivery_failed: bool,
    pub failed_delivery_at: Option<DateTime<Utc>>,
    pub failed_delivery_reason: Option<String>,
    pub tags: Vec<String>,
}

pub fn to_delivered_sms(sms: &SmsDelivery) -> DeliveredSms {
    DeliveredSms {
        id: sms.id(),
        organization_id: sms.organization_id().map(str::to_string),
        created: sms.created(),
        attempts: sms.attempts().as_slice().to_vec(),
        body: sms.content().map(|content| content.body.clone()),
        to_phone_number: sms.content().map(|content| content.to.number().to_string()),
        is_sent: sms.is_sent(),
        sent_at: sms.sent(),
        is_delivered: sms.delivered().is_some(),
        delivered_at: sms.delivered(),
        is_delivery_failed: sms.delivery_failed().is_some(),
        failed_delivery_at: sms.delivery_failed(),
        failed_delivery_reason: sms.delivery_failed_reason().map(str::to_string),
        tags: sms
            .content()
            .map(|content| content.tags.clone())
            .unwrap_or_default(),
    }
}

pub fn to_delivered_email(email: &EmailDelivery) -> DeliveredEmail {
    DeliveredEmail {
        id: email.id(),
        organization_id: email.organization_id().map(str::to_string),
        created: email.created(),
        attempts: email.attempts().as_slice().to_vec(),
        subject: email.content().and_then(|content| content.subject.clone()),
        body: email.content().and_then(|content| content.body.clone()),
        to_email_address: email
            .content()
            .map(|content| content.to.email_address.as_str().to_string()),
        to_display_name: email
            .content()
            .map(|content| content.to.display_name.clone()),
        is_sent: email.is_sent(),
        sent_at: email.sent(),
        is_delivered: email.delivered().is_some(),
        delivered_at: email.delivered(),
        is_delivery_failed: email.delivery_failed().is_some(),
        failed_delivery_at: email.delivery_failed(),
        failed_delivery_reason: email.delivery_failed_reason().map(str::to_string),
        tags: email
            .content()
            .map(|content| content.tags.clone())
            .unwrap_or_default(),
    }
}
