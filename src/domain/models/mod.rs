pub mod content;
pub mod delivery;

pub use content::{EmailContent, EmailContentType, HasTags, SmsContent};
pub use delivery::{Delivery, EmailDelivery, SmsDelivery};
