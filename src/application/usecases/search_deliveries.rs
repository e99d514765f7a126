use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::application::channels::DeliveryChannel;
use crate::domain::repositories::{DeliveryRepository, Page, SearchOptions};

/// Time-windowed, read-only listing of deliveries, flattened into the
/// client-facing view. Purely a query-side adapter; nothing here mutates.
pub struct SearchDeliveriesUseCase<Ch: DeliveryChannel> {
    repository: Arc<dyn DeliveryRepository<Ch::Content>>,
}

impl<Ch: DeliveryChannel> SearchDeliveriesUseCase<Ch> {
    pub fn new(repository: Arc<dyn DeliveryRepository<Ch::Content>>) -> Self {
        Self { repository }
    }

    /// `since` defaults to the last 14 days when absent.
    pub async fn search(
        &self,
        since: Option<DateTime<Utc>>,
        organization_id: Option<&str>,
        tags: Option<&[String]>,
        options: SearchOptions,
    ) -> anyhow::Result<Page<Ch::View>> {
        let since = since.unwrap_or_else(|| Utc::now() - Duration::days(14));
        let page = self
            .repository
            .search_since(since, organization_id, tags, options)
            .await?;

        info!(
            channel = Ch::name(),
            since = %since,
            matched = page.items.len(),
            "fetched deliveries"
        );
        Ok(page.map(Ch::to_view))
    }
}
