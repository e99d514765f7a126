use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::application::services::transport::{DeliveryTransport, SendReceipt};
use crate::domain::models::{EmailContent, SmsContent};

/// Development transport: traces the send and fabricates a receipt. Vendor
/// integrations live outside this crate and plug in through
/// [`DeliveryTransport`].
#[derive(Default)]
pub struct LoggingSmsTransport;

#[async_trait]
impl DeliveryTransport<SmsContent> for LoggingSmsTransport {
    async fn send(&self, content: &SmsContent) -> anyhow::Result<SendReceipt> {
        let receipt_id = format!("sms_receipt_{}", Uuid::new_v4().simple());
        info!(
            to = content.to.number(),
            receipt_id = %receipt_id,
            "sms send (logging transport)"
        );
        Ok(SendReceipt {
            receipt_id: Some(receipt_id),
        })
    }
}

#[derive(Default)]
pub struct LoggingEmailTransport;

#[async_trait]
impl DeliveryTransport<EmailContent> for LoggingEmailTransport {
    async fn send(&self, content: &EmailContent) -> anyhow::Result<SendReceipt> {
        let receipt_id = format!("email_receipt_{}", Uuid::new_v4().simple());
        info!(
            to = content.to.email_address.as_str(),
            receipt_id = %receipt_id,
            "email send (logging transport)"
        );
        Ok(SendReceipt {
            receipt_id: Some(receipt_id),
        })
    }
}
