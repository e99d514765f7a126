use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{EmailRecipient, PhoneNumber};

/// Free-form tags carried by every channel's content, used by search
/// filtering.
pub trait HasTags {
    fn tags(&self) -> &[String];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsContent {
    pub body: String,
    pub to: PhoneNumber,
    pub tags: Vec<String>,
}

impl HasTags for SmsContent {
    fn tags(&self) -> &[String] {
        &self.tags
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmailContentType {
    Html,
    Templated,
}

/// Email content is either authored html (subject + body) or a template id
/// with substitutions; the payload validation guarantees one of the two.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailContent {
    pub subject: Option<String>,
    pub body: Option<String>,
    pub template_id: Option<String>,
    pub substitutions: HashMap<String, String>,
    pub to: EmailRecipient,
    pub tags: Vec<String>,
}

impl EmailContent {
    pub fn content_type(&self) -> EmailContentType {
        if self.template_id.is_some() {
            EmailContentType::Templated
        } else {
            EmailContentType::Html
        }
    }
}

impl HasTags for EmailContent {
    fn tags(&self) -> &[String] {
        &self.tags
    }
}
