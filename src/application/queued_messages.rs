use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Envelope of a queued notification, produced by the API hosts and consumed
/// exactly once per dispatch cycle. Field names follow the wire format of the
/// queue producers (PascalCase JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueuedMessage<M> {
    pub caller_id: String,
    pub call_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_host_region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<M>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SmsMessagePayload {
    pub body: Option<String>,
    pub to_phone_number: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EmailMessagePayload {
    pub subject: Option<String>,
    pub body: Option<String>,
    pub template_id: Option<String>,
    pub substitutions: Option<HashMap<String, String>>,
    pub to_email_address: Option<String>,
    pub to_display_name: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Rehydrates a queued message from its JSON envelope. Malformed envelopes
/// are validation errors: non-retryable, the dispatch cycle aborts.
pub fn rehydrate<M: DeserializeOwned>(
    message_as_json: &str,
) -> Result<QueuedMessage<M>, DomainError> {
    serde_json::from_str(message_as_json)
        .map_err(|err| DomainError::Validation(format!("malformed queued message: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rehydrates_a_sms_envelope() {
        let json = r#"{
            "CallerId": "user_1",
            "CallId": "call_1",
            "MessageId": "m1",
            "TenantId": "org1",
            "Message": { "Body": "hello", "ToPhoneNumber": "+14155550100", "Tags": ["welcome"] }
        }"#;
        let message: QueuedMessage<SmsMessagePayload> = rehydrate(json).unwrap();
        assert_eq!(message.message_id.as_deref(), Some("m1"));
        let payload = message.message.unwrap();
        assert_eq!(payload.body.as_deref(), Some("hello"));
        assert_eq!(payload.to_phone_number.as_deref(), Some("+14155550100"));
    }

    #[test]
    fn optional_envelope_fields_rehydrate_as_absent() {
        // Payload types carry no Default; absent Option fields must still
        // deserialize as None.
        let json = r#"{ "CallerId": "user_1", "CallId": "call_1" }"#;
        let message: QueuedMessage<SmsMessagePayload> = rehydrate(json).unwrap();
        assert_eq!(message.caller_id, "user_1");
        assert!(message.message_id.is_none());
        assert!(message.tenant_id.is_none());
        assert!(message.origin_host_region.is_none());
        assert!(message.message.is_none());
    }

    #[test]
    fn malformed_json_is_a_validation_error() {
        let result = rehydrate::<SmsMessagePayload>("{not json");
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }
}
