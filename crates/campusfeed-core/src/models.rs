use campusfeed_api::{ComplaintRecord, FoundItemRecord, LostItemRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which collection a notification came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Complaint,
    Lost,
    Found,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Complaint => "complaint",
            NotificationKind::Lost => "lost",
            NotificationKind::Found => "found",
        }
    }

    pub fn all() -> [NotificationKind; 3] {
        [
            NotificationKind::Complaint,
            NotificationKind::Lost,
            NotificationKind::Found,
        ]
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for NotificationKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "complaint" | "complaints" => Ok(NotificationKind::Complaint),
            "lost" => Ok(NotificationKind::Lost),
            "found" => Ok(NotificationKind::Found),
            other => Err(crate::Error::ConfigError(format!(
                "Unknown notification type '{}' (expected complaint, lost or found)",
                other
            ))),
        }
    }
}

/// A backend row of any of the three kinds, before normalization
#[derive(Debug, Clone, PartialEq)]
pub enum RawRecord {
    Complaint(ComplaintRecord),
    Lost(LostItemRecord),
    Found(FoundItemRecord),
}

impl RawRecord {
    pub fn kind(&self) -> NotificationKind {
        match self {
            RawRecord::Complaint(_) => NotificationKind::Complaint,
            RawRecord::Lost(_) => NotificationKind::Lost,
            RawRecord::Found(_) => NotificationKind::Found,
        }
    }
}

/// Extra fields shown with a complaint
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComplaintMeta {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub reporter: Option<String>,
}

/// Extra fields shown with a lost or found item
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ItemMeta {
    pub location: Option<String>,
    pub category: Option<String>,
}

/// Per-kind payload: display metadata plus the untouched source row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NotificationDetail {
    Complaint {
        meta: ComplaintMeta,
        raw: ComplaintRecord,
    },
    Lost {
        meta: ItemMeta,
        raw: LostItemRecord,
    },
    Found {
        meta: ItemMeta,
        raw: FoundItemRecord,
    },
}

/// One entry in the feed
///
/// Rebuilt from source data on every refresh. Only the `id` is remembered
/// between runs (in the read and dismissed sets), so it has to come out the
/// same every time the same row is normalized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    pub date: DateTime<Utc>,
    #[serde(flatten)]
    pub detail: NotificationDetail,
}

impl Notification {
    pub fn kind(&self) -> NotificationKind {
        match self.detail {
            NotificationDetail::Complaint { .. } => NotificationKind::Complaint,
            NotificationDetail::Lost { .. } => NotificationKind::Lost,
            NotificationDetail::Found { .. } => NotificationKind::Found,
        }
    }

    /// Short one-line summary of the kind-specific fields
    pub fn meta_summary(&self) -> String {
        let parts: Vec<String> = match &self.detail {
            NotificationDetail::Complaint { meta, .. } => [
                meta.status.as_ref().map(|s| format!("status: {}", s)),
                meta.priority.as_ref().map(|p| format!("priority: {}", p)),
                meta.reporter.as_ref().map(|r| format!("by {}", r)),
            ]
            .into_iter()
            .flatten()
            .collect(),
            NotificationDetail::Lost { meta, .. } | NotificationDetail::Found { meta, .. } => [
                meta.location.as_ref().map(|l| format!("at {}", l)),
                meta.category.as_ref().map(|c| format!("[{}]", c)),
            ]
            .into_iter()
            .flatten()
            .collect(),
        };
        parts.join(", ")
    }
}
