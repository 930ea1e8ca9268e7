// Hosted backend source - bridges the API client with NotificationSource
use async_trait::async_trait;
use campusfeed_api::{ApiError, CampusClient, ComplaintRecord, FoundItemRecord, LostItemRecord};

use crate::{models::NotificationKind, sources::NotificationSource, Error, Result};

/// Wrapper around CampusClient that implements NotificationSource
pub struct BaasSource {
    client: CampusClient,
}

impl BaasSource {
    pub fn new(client: CampusClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NotificationSource for BaasSource {
    async fn fetch_complaints(&self) -> Result<Vec<ComplaintRecord>> {
        self.client
            .fetch_complaints()
            .await
            .map_err(|e| unavailable(NotificationKind::Complaint, e))
    }

    async fn fetch_lost_items(&self) -> Result<Vec<LostItemRecord>> {
        self.client
            .fetch_lost_items()
            .await
            .map_err(|e| unavailable(NotificationKind::Lost, e))
    }

    async fn fetch_found_items(&self) -> Result<Vec<FoundItemRecord>> {
        self.client
            .fetch_found_items()
            .await
            .map_err(|e| unavailable(NotificationKind::Found, e))
    }
}

fn unavailable(kind: NotificationKind, err: ApiError) -> Error {
    Error::SourceUnavailable {
        kind,
        reason: err.to_string(),
    }
}
