// Source adapters for the three collections feeding the notification feed
pub mod baas;

pub use baas::BaasSource;

use async_trait::async_trait;
use campusfeed_api::{ComplaintRecord, FoundItemRecord, LostItemRecord};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::{
    feed,
    models::{Notification, NotificationKind},
    normalize, Result,
};

/// Read-only access to the three collections
///
/// Each fetch stands alone: one failing says nothing about the other two.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSource: Send + Sync {
    async fn fetch_complaints(&self) -> Result<Vec<ComplaintRecord>>;
    async fn fetch_lost_items(&self) -> Result<Vec<LostItemRecord>>;
    async fn fetch_found_items(&self) -> Result<Vec<FoundItemRecord>>;
}

/// Everything one fetch round produced
#[derive(Debug, Default)]
pub struct Collected {
    /// Normalized notifications, complaints first, then lost, then found
    pub notifications: Vec<Notification>,
    /// Collections that failed this round
    pub failed: Vec<NotificationKind>,
}

impl Collected {
    pub fn all_failed(&self) -> bool {
        self.failed.len() == NotificationKind::all().len()
    }
}

/// Fetch all three collections at once and normalize what came back
///
/// All three fetches run to completion even when one fails early. A failed
/// collection is logged and contributes nothing.
pub async fn collect(source: &dyn NotificationSource) -> Collected {
    collect_at(source, Utc::now()).await
}

pub async fn collect_at(source: &dyn NotificationSource, now: DateTime<Utc>) -> Collected {
    let (complaints, lost, found) = futures::join!(
        source.fetch_complaints(),
        source.fetch_lost_items(),
        source.fetch_found_items()
    );

    let mut failed = Vec::new();

    let complaints = settle(NotificationKind::Complaint, complaints, &mut failed)
        .into_iter()
        .map(|r| normalize::normalize_complaint(r, now))
        .collect();
    let lost = settle(NotificationKind::Lost, lost, &mut failed)
        .into_iter()
        .map(|r| normalize::normalize_lost(r, now))
        .collect();
    let found = settle(NotificationKind::Found, found, &mut failed)
        .into_iter()
        .map(|r| normalize::normalize_found(r, now))
        .collect();

    Collected {
        notifications: feed::merge(complaints, lost, found),
        failed,
    }
}

fn settle<T>(
    kind: NotificationKind,
    result: Result<Vec<T>>,
    failed: &mut Vec<NotificationKind>,
) -> Vec<T> {
    match result {
        Ok(rows) => {
            debug!("Fetched {} {} rows", rows.len(), kind);
            rows
        }
        Err(e) => {
            warn!("Skipping {} this round: {}", kind, e);
            failed.push(kind);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use campusfeed_api::RecordKey;

    fn complaint(id: &str) -> ComplaintRecord {
        ComplaintRecord {
            id: Some(RecordKey::Text(id.into())),
            created_at: Some("2024-08-10".into()),
            ..Default::default()
        }
    }

    fn lost(id: &str) -> LostItemRecord {
        LostItemRecord {
            lost_id: Some(RecordKey::Text(id.into())),
            date_lost: Some("2024-08-15".into()),
            ..Default::default()
        }
    }

    fn down(kind: NotificationKind) -> Error {
        Error::SourceUnavailable {
            kind,
            reason: "connection refused".into(),
        }
    }

    #[tokio::test]
    async fn test_collect_merges_all_three() {
        let mut source = MockNotificationSource::new();
        source
            .expect_fetch_complaints()
            .times(1)
            .returning(|| Ok(vec![complaint("c1")]));
        source
            .expect_fetch_lost_items()
            .times(1)
            .returning(|| Ok(vec![lost("l1")]));
        source
            .expect_fetch_found_items()
            .times(1)
            .returning(|| Ok(Vec::new()));

        let collected = collect(&source).await;
        let ids: Vec<_> = collected.notifications.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "l1"]);
        assert!(collected.failed.is_empty());
    }

    #[tokio::test]
    async fn test_one_failure_keeps_the_others() {
        let mut source = MockNotificationSource::new();
        source
            .expect_fetch_complaints()
            .returning(|| Err(down(NotificationKind::Complaint)));
        source
            .expect_fetch_lost_items()
            .returning(|| Ok(vec![lost("l1")]));
        source.expect_fetch_found_items().returning(|| {
            Ok(vec![FoundItemRecord {
                lost_id: Some(RecordKey::Number(4)),
                ..Default::default()
            }])
        });

        let collected = collect(&source).await;
        assert_eq!(collected.failed, vec![NotificationKind::Complaint]);
        assert!(!collected.all_failed());

        let kinds: Vec<_> = collected.notifications.iter().map(|n| n.kind()).collect();
        assert_eq!(kinds, vec![NotificationKind::Lost, NotificationKind::Found]);
    }

    #[tokio::test]
    async fn test_everything_down() {
        let mut source = MockNotificationSource::new();
        source
            .expect_fetch_complaints()
            .returning(|| Err(down(NotificationKind::Complaint)));
        source
            .expect_fetch_lost_items()
            .returning(|| Err(down(NotificationKind::Lost)));
        source
            .expect_fetch_found_items()
            .returning(|| Err(down(NotificationKind::Found)));

        let collected = collect(&source).await;
        assert!(collected.all_failed());
        assert!(collected.notifications.is_empty());
    }
}
