use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Correlation key of a queued message, unique per logical notification.
/// Set exactly once when the delivery is created and never changes; the
/// dispatch loop uses it for idempotent find-or-create.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueuedMessageId(String);

impl QueuedMessageId {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(DomainError::Validation(
                "message id must not be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QueuedMessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// E.164 phone number: leading `+` followed by 8 to 15 digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        let digits = value.strip_prefix('+').ok_or_else(|| {
            DomainError::Validation(format!("phone number '{value}' must start with '+'"))
        })?;
        if digits.len() < 8 || digits.len() > 15 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(DomainError::Validation(format!(
                "phone number '{value}' is not a valid E.164 number"
            )));
        }
        Ok(Self(value))
    }

    pub fn number(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        let invalid = || DomainError::Validation(format!("'{value}' is not a valid email address"));
        let (local, domain) = value.split_once('@').ok_or_else(invalid)?;
        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(invalid());
        }
        let (name, tld) = domain.rsplit_once('.').ok_or_else(invalid)?;
        if name.is_empty() || tld.is_empty() {
            return Err(invalid());
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Recipient of an email delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRecipient {
    pub email_address: EmailAddress,
    pub display_name: String,
}

impl EmailRecipient {
    pub fn new(
        email_address: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            email_address: EmailAddress::new(email_address)?,
            display_name: display_name.into(),
        })
    }
}

/// Datacenter/region code, used for cross-region dedup diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatacenterLocation(String);

impl DatacenterLocation {
    pub fn new(code: impl Into<String>) -> Self {
        let code = code.into();
        if code.trim().is_empty() {
            Self::unknown()
        } else {
            Self(code)
        }
    }

    pub fn unknown() -> Self {
        Self("unknown".to_string())
    }

    pub fn code(&self) -> &str {
        &self.0
    }
}

/// Ordered, append-only record of send attempts. Attempts never disappear
/// and never reorder; an attempt earlier than the latest one is rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SendingAttempts {
    attempts: Vec<DateTime<Utc>>,
}

impl SendingAttempts {
    pub fn attempt(&mut self, when: DateTime<Utc>) -> Result<(), DomainError> {
        if let Some(latest) = self.attempts.last() {
            if when < *latest {
                return Err(DomainError::Validation(
                    "attempt must not predate the latest recorded attempt".to_string(),
                ));
            }
        }
        self.attempts.push(when);
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.attempts.len()
    }

    pub fn latest(&self) -> Option<DateTime<Utc>> {
        self.attempts.last().copied()
    }

    pub fn as_slice(&self) -> &[DateTime<Utc>] {
        &self.attempts
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn message_id_rejects_empty() {
        assert!(QueuedMessageId::new("").is_err());
        assert!(QueuedMessageId::new("   ").is_err());
        assert_eq!(QueuedMessageId::new(" m1 ").unwrap().as_str(), "m1");
    }

    #[test]
    fn phone_number_requires_e164() {
        assert!(PhoneNumber::new("+14155550100").is_ok());
        assert!(PhoneNumber::new("14155550100").is_err());
        assert!(PhoneNumber::new("+1415555").is_err());
        assert!(PhoneNumber::new("+1415555010a").is_err());
    }

    #[test]
    fn email_address_requires_dotted_domain() {
        assert!(EmailAddress::new("a.user@company.com").is_ok());
        assert!(EmailAddress::new("user@localhost").is_err());
        assert!(EmailAddress::new("@company.com").is_err());
        assert!(EmailAddress::new("user@a@b.com").is_err());
    }

    #[test]
    fn attempts_are_append_only_and_monotonic() {
        let mut attempts = SendingAttempts::default();
        let t0 = Utc::now();
        attempts.attempt(t0).unwrap();
        attempts.attempt(t0 + Duration::seconds(1)).unwrap();
        assert!(attempts.attempt(t0 - Duration::seconds(1)).is_err());
        assert_eq!(attempts.count(), 2);
        assert_eq!(attempts.latest(), Some(t0 + Duration::seconds(1)));
    }
}
