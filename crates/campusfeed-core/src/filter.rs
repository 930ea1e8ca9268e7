use serde::{Deserialize, Serialize};

use crate::models::{Notification, NotificationKind};

/// Per-type visibility toggles. Everything is shown by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeFilter {
    pub complaint: bool,
    pub lost: bool,
    pub found: bool,
}

impl Default for TypeFilter {
    fn default() -> Self {
        Self {
            complaint: true,
            lost: true,
            found: true,
        }
    }
}

impl TypeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything except the given kinds
    pub fn hiding(kinds: &[NotificationKind]) -> Self {
        let mut filter = Self::default();
        for kind in kinds {
            filter.set(*kind, false);
        }
        filter
    }

    pub fn allows(&self, kind: NotificationKind) -> bool {
        match kind {
            NotificationKind::Complaint => self.complaint,
            NotificationKind::Lost => self.lost,
            NotificationKind::Found => self.found,
        }
    }

    pub fn set(&mut self, kind: NotificationKind, shown: bool) {
        match kind {
            NotificationKind::Complaint => self.complaint = shown,
            NotificationKind::Lost => self.lost = shown,
            NotificationKind::Found => self.found = shown,
        }
    }

    /// Flip one toggle, returning its new value
    pub fn toggle(&mut self, kind: NotificationKind) -> bool {
        let shown = !self.allows(kind);
        self.set(kind, shown);
        shown
    }
}

/// The part of the feed the current toggles let through, in feed order
pub fn visible<'a>(feed: &'a [Notification], filter: &TypeFilter) -> Vec<&'a Notification> {
    feed.iter().filter(|n| filter.allows(n.kind())).collect()
}
