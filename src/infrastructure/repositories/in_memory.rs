use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::models::{Delivery, EmailContent, HasTags, SmsContent};
use crate::domain::repositories::{DeliveryRepository, Page, SearchOptions};
use crate::domain::value_objects::QueuedMessageId;

pub type InMemorySmsDeliveryRepository = InMemoryDeliveryRepository<SmsContent>;
pub type InMemoryEmailDeliveryRepository = InMemoryDeliveryRepository<EmailContent>;

/// Per-key atomic store with optimistic concurrency: each save must carry the
/// stored version and bumps it, so racing writers to one aggregate lose with
/// a concurrency error instead of silently clobbering each other.
#[derive(Default)]
pub struct InMemoryDeliveryRepository<C> {
    deliveries: Arc<RwLock<HashMap<Uuid, Delivery<C>>>>,
}

impl<C> InMemoryDeliveryRepository<C> {
    pub fn new() -> Self {
        Self {
            deliveries: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl<C> DeliveryRepository<C> for InMemoryDeliveryRepository<C>
where
    C: Clone + Send + Sync + HasTags + 'static,
{
    async fn find_by_message_id(
        &self,
        message_id: &QueuedMessageId,
    ) -> anyhow::Result<Option<Delivery<C>>> {
        let deliveries = self.deliveries.read().await;
        Ok(deliveries
            .values()
            .find(|delivery| delivery.message_id() == message_id)
            .cloned())
    }

    async fn find_by_receipt_id(&self, receipt_id: &str) -> anyhow::Result<Option<Delivery<C>>> {
        let deliveries = self.deliveries.read().await;
        Ok(deliveries
            .values()
            .find(|delivery| delivery.receipt_id() == Some(receipt_id))
            .cloned())
    }

    async fn save(&self, delivery: Delivery<C>, require_new: bool) -> anyhow::Result<Delivery<C>> {
        let mut deliveries = self.deliveries.write().await;
        if require_new {
            // Uniqueness is keyed on the message id, the find-or-create key:
            // racing creates of one logical notification mint distinct
            // aggregate ids, and exactly one of them may win.
            if deliveries
                .values()
                .any(|existing| existing.message_id() == delivery.message_id())
            {
                return Err(DomainError::AlreadyExists(format!(
                    "delivery for message '{}' already exists",
                    delivery.message_id()
                ))
                .into());
            }
        } else if let Some(existing) = deliveries.get(&delivery.id()) {
            if existing.version() != delivery.version() {
                return Err(DomainError::Concurrency(format!(
                    "delivery '{}' was modified concurrently",
                    delivery.id()
                ))
                .into());
            }
        }

        let mut saved = delivery;
        saved.take_events();
        saved.set_version(saved.version() + 1);
        deliveries.insert(saved.id(), saved.clone());
        Ok(saved)
    }

    async fn search_since(
        &self,
        since: DateTime<Utc>,
        organization_id: Option<&str>,
        tags: Option<&[String]>,
        options: SearchOptions,
    ) -> anyhow::Result<Page<Delivery<C>>> {
        let deliveries = self.deliveries.read().await;
        let mut matched: Vec<Delivery<C>> = deliveries
            .values()
            .filter(|delivery| delivery.created() >= since)
            .filter(|delivery| match organization_id {
                Some(org) => delivery.organization_id() == Some(org),
                None => true,
            })
            .filter(|delivery| match tags {
                // A delivery matches when it carries every requested tag.
                Some(wanted) => {
                    let carried = delivery.content().map(HasTags::tags).unwrap_or_default();
                    wanted.iter().all(|tag| carried.contains(tag))
                }
                None => true,
            })
            .cloned()
            .collect();
        matched.sort_by_key(|delivery| (delivery.created(), delivery.id()));

        let offset = options.offset.unwrap_or(0) as usize;
        let limit = options.limit.unwrap_or(50) as usize;
        let total = matched.len();
        let items: Vec<Delivery<C>> = matched.into_iter().skip(offset).take(limit).collect();
        let has_more = offset + items.len() < total;
        let next_offset = has_more.then(|| (offset + items.len()) as u32);

        Ok(Page {
            items,
            has_more,
            next_offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{DatacenterLocation, PhoneNumber};

    fn delivery(message_id: &str, org: Option<&str>, tags: &[&str]) -> Delivery<SmsContent> {
        let mut sms = Delivery::create(
            Uuid::new_v4(),
            QueuedMessageId::new(message_id).unwrap(),
            org.map(str::to_string),
            DatacenterLocation::new("aue"),
        );
        sms.set_details(SmsContent {
            body: "hello".to_string(),
            to: PhoneNumber::new("+14155550100").unwrap(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        })
        .unwrap();
        sms
    }

    #[tokio::test]
    async fn save_require_new_rejects_an_existing_key() {
        let repo = InMemorySmsDeliveryRepository::new();
        let sms = delivery("m1", None, &[]);
        let saved = repo.save(sms, true).await.unwrap();

        let error = repo.save(saved, true).await.unwrap_err();
        let domain = error.downcast_ref::<DomainError>().unwrap();
        assert!(matches!(domain, DomainError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn save_require_new_rejects_a_duplicate_message_id() {
        let repo = InMemorySmsDeliveryRepository::new();
        repo.save(delivery("m1", None, &[]), true).await.unwrap();

        // A racing create of the same logical notification carries the same
        // message id under a fresh aggregate id; it must lose.
        let racing = delivery("m1", None, &[]);
        let error = repo.save(racing, true).await.unwrap_err();
        let domain = error.downcast_ref::<DomainError>().unwrap();
        assert!(matches!(domain, DomainError::AlreadyExists(_)));

        let survivor = repo
            .find_by_message_id(&QueuedMessageId::new("m1").unwrap())
            .await
            .unwrap();
        assert!(survivor.is_some());
    }

    #[tokio::test]
    async fn save_rejects_a_stale_version() {
        let repo = InMemorySmsDeliveryRepository::new();
        let sms = delivery("m1", None, &[]);
        let stale = repo.save(sms, true).await.unwrap();
        let _current = repo.save(stale.clone(), false).await.unwrap();

        let error = repo.save(stale, false).await.unwrap_err();
        let domain = error.downcast_ref::<DomainError>().unwrap();
        assert!(matches!(domain, DomainError::Concurrency(_)));
    }

    #[tokio::test]
    async fn finds_by_message_id_and_receipt_id() {
        let repo = InMemorySmsDeliveryRepository::new();
        let mut sms = delivery("m1", None, &[]);
        sms.attempt_sending().unwrap();
        sms.succeeded_sending(Some("r1".to_string())).unwrap();
        repo.save(sms, true).await.unwrap();

        let by_message = repo
            .find_by_message_id(&QueuedMessageId::new("m1").unwrap())
            .await
            .unwrap();
        assert!(by_message.is_some());
        assert!(repo.find_by_receipt_id("r1").await.unwrap().is_some());
        assert!(repo.find_by_receipt_id("r2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn search_filters_by_organization_and_tags() {
        let repo = InMemorySmsDeliveryRepository::new();
        repo.save(delivery("m1", Some("org1"), &["welcome", "trial"]), true)
            .await
            .unwrap();
        repo.save(delivery("m2", Some("org1"), &["welcome"]), true)
            .await
            .unwrap();
        repo.save(delivery("m3", Some("org2"), &["welcome", "trial"]), true)
            .await
            .unwrap();

        let since = Utc::now() - chrono::Duration::days(1);
        let wanted = vec!["welcome".to_string(), "trial".to_string()];
        let page = repo
            .search_since(since, Some("org1"), Some(&wanted), SearchOptions::default())
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].message_id().as_str(), "m1");
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn search_paginates_in_creation_order() {
        let repo = InMemorySmsDeliveryRepository::new();
        for i in 0..5 {
            repo.save(delivery(&format!("m{i}"), None, &[]), true)
                .await
                .unwrap();
        }

        let since = Utc::now() - chrono::Duration::days(1);
        let options = SearchOptions {
            limit: Some(2),
            offset: Some(0),
        };
        let page = repo.search_since(since, None, None, options).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(page.has_more);
        assert_eq!(page.next_offset, Some(2));
    }
}
