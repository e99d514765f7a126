use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::models::Delivery;
use crate::domain::value_objects::QueuedMessageId;

#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: Some(50),
            offset: Some(0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_more: bool,
    pub next_offset: Option<u32>,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl Fn(&T) -> U) -> Page<U> {
        Page {
            items: self.items.iter().map(f).collect(),
            has_more: self.has_more,
            next_offset: self.next_offset,
        }
    }
}

/// Persistence capability for one delivery channel. The store serializes
/// concurrent writers per aggregate: `save` fails when `require_new` and the
/// message id already exists, or when the saved version is stale.
#[async_trait]
pub trait DeliveryRepository<C>: Send + Sync {
    async fn find_by_message_id(
        &self,
        message_id: &QueuedMessageId,
    ) -> anyhow::Result<Option<Delivery<C>>>;

    async fn find_by_receipt_id(&self, receipt_id: &str) -> anyhow::Result<Option<Delivery<C>>>;

    async fn save(&self, delivery: Delivery<C>, require_new: bool) -> anyhow::Result<Delivery<C>>;

    async fn search_since(
        &self,
        since: DateTime<Utc>,
        organization_id: Option<&str>,
        tags: Option<&[String]>,
        options: SearchOptions,
    ) -> anyhow::Result<Page<Delivery<C>>>;
}
