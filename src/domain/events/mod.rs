use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::QueuedMessageId;

/// Domain events raised by delivery aggregates, returned alongside each
/// mutation as an ordered append-only list (no global event bus). Downstream
/// read models consume these after a successful save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeliveryEvent {
    Created {
        message_id: QueuedMessageId,
        organization_id: Option<String>,
        host_region: String,
        when: DateTime<Utc>,
    },
    DetailsChanged {
        when: DateTime<Utc>,
    },
    SendingAttempted {
        when: DateTime<Utc>,
    },
    SendingSucceeded {
        when: DateTime<Utc>,
        receipt_id: Option<String>,
    },
    SendingFailed {
        when: DateTime<Utc>,
    },
    DeliveryConfirmed {
        receipt_id: String,
        when: DateTime<Utc>,
    },
    DeliveryFailureConfirmed {
        receipt_id: String,
        when: DateTime<Utc>,
        reason: String,
    },
}
