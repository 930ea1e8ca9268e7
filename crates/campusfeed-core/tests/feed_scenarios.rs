use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use campusfeed_api::{ComplaintRecord, FoundItemRecord, LostItemRecord, RecordKey};
use campusfeed_cache::StateCache;
use campusfeed_core::{
    FeedRefresher, Error, NotificationCenter, NotificationKind, NotificationSource,
    NotificationState, RefreshOutcome, TypeFilter,
};
use tempfile::TempDir;

/// Source that always hands back the same rows, or fails for chosen kinds
#[derive(Default)]
struct StaticSource {
    complaints: Vec<ComplaintRecord>,
    lost: Vec<LostItemRecord>,
    found: Vec<FoundItemRecord>,
    down: Vec<NotificationKind>,
}

impl StaticSource {
    fn check(&self, kind: NotificationKind) -> campusfeed_core::Result<()> {
        if self.down.contains(&kind) {
            Err(Error::SourceUnavailable {
                kind,
                reason: "service unavailable".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl NotificationSource for StaticSource {
    async fn fetch_complaints(&self) -> campusfeed_core::Result<Vec<ComplaintRecord>> {
        self.check(NotificationKind::Complaint)?;
        Ok(self.complaints.clone())
    }

    async fn fetch_lost_items(&self) -> campusfeed_core::Result<Vec<LostItemRecord>> {
        self.check(NotificationKind::Lost)?;
        Ok(self.lost.clone())
    }

    async fn fetch_found_items(&self) -> campusfeed_core::Result<Vec<FoundItemRecord>> {
        self.check(NotificationKind::Found)?;
        Ok(self.found.clone())
    }
}

fn scenario_source() -> StaticSource {
    StaticSource {
        complaints: vec![ComplaintRecord {
            id: Some(RecordKey::Text("c1".into())),
            title: Some("Wi-Fi down in Block B".into()),
            created_at: Some("2024-08-10".into()),
            ..Default::default()
        }],
        lost: vec![LostItemRecord {
            lost_id: Some(RecordKey::Text("l1".into())),
            title: Some("Black backpack".into()),
            date_lost: Some("2024-08-15".into()),
            ..Default::default()
        }],
        ..Default::default()
    }
}

fn refresher_over(
    source: StaticSource,
    state: NotificationState,
) -> (FeedRefresher, Arc<Mutex<NotificationCenter>>) {
    let center = Arc::new(Mutex::new(NotificationCenter::new(state)));
    let refresher = FeedRefresher::new(Arc::new(source), Arc::clone(&center));
    (refresher, center)
}

fn feed_ids(center: &Arc<Mutex<NotificationCenter>>) -> Vec<String> {
    center
        .lock()
        .unwrap()
        .feed()
        .iter()
        .map(|n| n.id.clone())
        .collect()
}

#[tokio::test]
async fn test_newer_item_comes_first() {
    let (refresher, center) = refresher_over(scenario_source(), NotificationState::in_memory());

    assert_eq!(refresher.run_cycle().await, RefreshOutcome::Success { count: 2 });
    assert_eq!(feed_ids(&center), vec!["l1", "c1"]);
}

#[tokio::test]
async fn test_dismissed_item_stays_gone_after_refresh() {
    let (refresher, center) = refresher_over(scenario_source(), NotificationState::in_memory());
    refresher.run_cycle().await;

    center.lock().unwrap().dismiss("l1");
    assert_eq!(feed_ids(&center), vec!["c1"]);

    refresher.run_cycle().await;
    assert_eq!(feed_ids(&center), vec!["c1"]);
}

#[tokio::test]
async fn test_dismissal_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let db = temp_dir.path().join("state.db");

    {
        let state = NotificationState::load(Box::new(StateCache::open(&db).unwrap()));
        let (refresher, center) = refresher_over(scenario_source(), state);
        refresher.run_cycle().await;
        let mut center = center.lock().unwrap();
        center.dismiss("l1");
        center.mark_read("c1");
    }

    let state = NotificationState::load(Box::new(StateCache::open(&db).unwrap()));
    let (refresher, center) = refresher_over(scenario_source(), state);
    refresher.run_cycle().await;

    assert_eq!(feed_ids(&center), vec!["c1"]);
    assert!(center.lock().unwrap().is_read("c1"));
}

#[tokio::test]
async fn test_mark_all_read_on_three_items() {
    let mut source = scenario_source();
    source.found.push(FoundItemRecord {
        lost_id: Some(RecordKey::Number(7)),
        title: Some("Calculator".into()),
        date_lost: Some("2024-08-12".into()),
        ..Default::default()
    });
    let (refresher, center) = refresher_over(source, NotificationState::in_memory());
    refresher.run_cycle().await;

    let mut center = center.lock().unwrap();
    assert_eq!(center.mark_all_read(), 3);
    for id in ["l1", "7", "c1"] {
        assert!(center.is_read(id), "{} should be read", id);
    }
}

#[tokio::test]
async fn test_failed_source_does_not_block_the_others() {
    let mut source = scenario_source();
    source.down.push(NotificationKind::Complaint);
    let (refresher, center) = refresher_over(source, NotificationState::in_memory());

    assert_eq!(
        refresher.run_cycle().await,
        RefreshOutcome::PartialFailure {
            count: 1,
            failed: vec![NotificationKind::Complaint],
        }
    );
    assert_eq!(feed_ids(&center), vec!["l1"]);
}

#[tokio::test]
async fn test_filter_hides_complaints() {
    let mut source = scenario_source();
    source.found.push(FoundItemRecord {
        id: Some(RecordKey::Text("f1".into())),
        date: Some("2024-08-01".into()),
        ..Default::default()
    });
    let (refresher, center) = refresher_over(source, NotificationState::in_memory());
    refresher.run_cycle().await;

    let mut center = center.lock().unwrap();
    center.set_filter(TypeFilter {
        complaint: false,
        lost: true,
        found: true,
    });

    let visible = center.visible();
    assert!(visible.iter().all(|n| n.kind() != NotificationKind::Complaint));
    let ids: Vec<_> = visible.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["l1", "f1"]);
}

#[tokio::test]
async fn test_feed_is_always_sorted() {
    let source = StaticSource {
        complaints: (1..=9)
            .map(|d| ComplaintRecord {
                id: Some(RecordKey::Number(d)),
                created_at: Some(format!("2024-08-{:02}T08:00:00Z", d * 3)),
                ..Default::default()
            })
            .collect(),
        lost: (1..=9)
            .map(|d| LostItemRecord {
                lost_id: Some(RecordKey::Text(format!("l{}", d))),
                date_lost: Some(format!("2024-08-{:02}", d * 2)),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    };
    let (refresher, center) = refresher_over(source, NotificationState::in_memory());
    refresher.run_cycle().await;

    let center = center.lock().unwrap();
    assert_eq!(center.feed().len(), 18);
    assert!(center.feed().windows(2).all(|w| w[0].date >= w[1].date));
}
