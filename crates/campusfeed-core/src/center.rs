// In-memory feed plus the read/dismissed state and filter toggles around it
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::{
    feed,
    filter::{self, TypeFilter},
    models::{Notification, NotificationKind},
    state::NotificationState,
};

/// Everything the notifications view reads and mutates
///
/// The feed is replaced wholesale on each applied refresh. Dismissing removes
/// an entry right away instead of waiting for the next refresh.
///
/// State writes that fail are logged and otherwise ignored: the in-memory
/// sets are already updated, so the view stays consistent for this session.
pub struct NotificationCenter {
    feed: Vec<Notification>,
    state: NotificationState,
    filter: TypeFilter,
    last_refreshed: Option<DateTime<Utc>>,
}

impl NotificationCenter {
    pub fn new(state: NotificationState) -> Self {
        Self {
            feed: Vec::new(),
            state,
            filter: TypeFilter::default(),
            last_refreshed: None,
        }
    }

    /// Swap in a freshly collected batch
    pub fn apply_refresh(&mut self, notifications: Vec<Notification>) {
        self.feed = feed::assemble(notifications, self.state.dismissed_ids());
        self.last_refreshed = Some(Utc::now());
        debug!("Feed now holds {} notifications", self.feed.len());
    }

    pub fn feed(&self) -> &[Notification] {
        &self.feed
    }

    pub fn visible(&self) -> Vec<&Notification> {
        filter::visible(&self.feed, &self.filter)
    }

    pub fn filter(&self) -> TypeFilter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: TypeFilter) {
        self.filter = filter;
    }

    pub fn toggle(&mut self, kind: NotificationKind) -> bool {
        self.filter.toggle(kind)
    }

    pub fn state(&self) -> &NotificationState {
        &self.state
    }

    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.last_refreshed
    }

    pub fn is_read(&self, id: &str) -> bool {
        self.state.is_read(id)
    }

    /// Unread entries among the visible ones
    pub fn unread_count(&self) -> usize {
        self.visible()
            .iter()
            .filter(|n| !self.state.is_read(&n.id))
            .count()
    }

    pub fn mark_read(&mut self, id: &str) {
        if let Err(e) = self.state.mark_read(id) {
            warn!("Failed to save read state for {}: {}", id, e);
        }
    }

    /// Mark everything currently visible as read; returns how many were new
    pub fn mark_all_read(&mut self) -> usize {
        let ids: Vec<String> = self.visible().iter().map(|n| n.id.clone()).collect();
        let before = self.state.read_ids().len();

        if let Err(e) = self.state.mark_all_read(ids) {
            warn!("Failed to save read state: {}", e);
        }
        self.state.read_ids().len() - before
    }

    /// Hide a notification for good; returns true if it was in the feed
    pub fn dismiss(&mut self, id: &str) -> bool {
        if let Err(e) = self.state.dismiss(id) {
            warn!("Failed to save dismissal of {}: {}", id, e);
        }

        let before = self.feed.len();
        self.feed.retain(|n| n.id != id);
        self.feed.len() != before
    }

    pub fn reset_read_state(&mut self) {
        if let Err(e) = self.state.reset_read_state() {
            warn!("Failed to save cleared read state: {}", e);
        }
    }
}
