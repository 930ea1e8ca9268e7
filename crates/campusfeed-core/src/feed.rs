// Merge, drop dismissed, sort newest first
use std::collections::HashSet;

use crate::models::Notification;

/// Build the feed from freshly normalized notifications
///
/// Anything in `dismissed` is dropped. The rest is ordered newest first;
/// `sort_by` is stable so equal dates keep their input order.
pub fn assemble(notifications: Vec<Notification>, dismissed: &HashSet<String>) -> Vec<Notification> {
    let mut feed: Vec<Notification> = notifications
        .into_iter()
        .filter(|n| !dismissed.contains(&n.id))
        .collect();

    feed.sort_by(|a, b| b.date.cmp(&a.date));
    feed
}

/// Concatenate the three collections in a fixed order (complaints, lost, found)
///
/// The order only matters for tie-breaking among equal dates.
pub fn merge(
    complaints: Vec<Notification>,
    lost: Vec<Notification>,
    found: Vec<Notification>,
) -> Vec<Notification> {
    let mut all = Vec::with_capacity(complaints.len() + lost.len() + found.len());
    all.extend(complaints);
    all.extend(lost);
    all.extend(found);
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ItemMeta, NotificationDetail};
    use campusfeed_api::LostItemRecord;
    use chrono::{DateTime, TimeZone, Utc};

    fn item(id: &str, date: DateTime<Utc>) -> Notification {
        Notification {
            id: id.to_string(),
            title: id.to_string(),
            message: String::new(),
            date,
            detail: NotificationDetail::Lost {
                meta: ItemMeta::default(),
                raw: LostItemRecord::default(),
            },
        }
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_sorted_newest_first() {
        let feed = assemble(
            vec![item("a", day(1)), item("b", day(20)), item("c", day(5))],
            &HashSet::new(),
        );

        let ids: Vec<_> = feed.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
        assert!(feed.windows(2).all(|w| w[0].date >= w[1].date));
    }

    #[test]
    fn test_ties_keep_input_order() {
        let feed = assemble(
            vec![item("first", day(3)), item("second", day(3)), item("third", day(3))],
            &HashSet::new(),
        );

        let ids: Vec<_> = feed.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_dismissed_are_dropped() {
        let dismissed: HashSet<String> = ["b".to_string()].into_iter().collect();
        let feed = assemble(vec![item("a", day(1)), item("b", day(2))], &dismissed);

        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].id, "a");
    }

    #[test]
    fn test_merge_keeps_collection_order() {
        let all = merge(
            vec![item("c1", day(1))],
            vec![item("l1", day(1))],
            vec![item("f1", day(1))],
        );
        let feed = assemble(all, &HashSet::new());

        let ids: Vec<_> = feed.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "l1", "f1"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(assemble(Vec::new(), &HashSet::new()).is_empty());
    }
}
