// Row -> Notification conversion for each collection
use campusfeed_api::{ComplaintRecord, FoundItemRecord, LostItemRecord, RecordKey};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use crate::models::{
    ComplaintMeta, ItemMeta, Notification, NotificationDetail, NotificationKind, RawRecord,
};

/// Longest message we put in a notification, in characters
pub const MESSAGE_LIMIT: usize = 140;

/// Normalize any row, falling back to the current time for undated rows
pub fn normalize(record: RawRecord) -> Notification {
    normalize_at(record, Utc::now())
}

/// Same as [`normalize`] with an explicit "now" for undated rows
pub fn normalize_at(record: RawRecord, now: DateTime<Utc>) -> Notification {
    match record {
        RawRecord::Complaint(r) => normalize_complaint(r, now),
        RawRecord::Lost(r) => normalize_lost(r, now),
        RawRecord::Found(r) => normalize_found(r, now),
    }
}

pub fn normalize_complaint(record: ComplaintRecord, now: DateTime<Utc>) -> Notification {
    let date_text = first_text(&[&record.created_at, &record.date]);
    let id = first_key(&[&record.id, &record.complaint_id]).unwrap_or_else(|| {
        synthesize_id(NotificationKind::Complaint, record.title.as_deref(), date_text)
    });

    let meta = ComplaintMeta {
        status: non_empty(&record.status),
        priority: non_empty(&record.priority),
        reporter: reporter_name(record.user.as_ref()).or_else(|| non_empty(&record.reported_by)),
    };

    Notification {
        id,
        title: display_title(record.title.as_deref(), "Untitled complaint"),
        message: truncate(record.description.as_deref().unwrap_or_default(), MESSAGE_LIMIT),
        date: date_text.and_then(parse_date).unwrap_or(now),
        detail: NotificationDetail::Complaint { meta, raw: record },
    }
}

pub fn normalize_lost(record: LostItemRecord, now: DateTime<Utc>) -> Notification {
    let date_text = first_text(&[&record.date_lost, &record.date]);
    let id = first_key(&[&record.lost_id, &record.id]).unwrap_or_else(|| {
        synthesize_id(NotificationKind::Lost, record.title.as_deref(), date_text)
    });
    let description = first_text(&[&record.description, &record.distinguishing_features]);

    let meta = ItemMeta {
        location: non_empty(&record.location),
        category: non_empty(&record.category),
    };

    Notification {
        id,
        title: display_title(record.title.as_deref(), "Lost item"),
        message: truncate(description.unwrap_or_default(), MESSAGE_LIMIT),
        date: date_text.and_then(parse_date).unwrap_or(now),
        detail: NotificationDetail::Lost { meta, raw: record },
    }
}

pub fn normalize_found(record: FoundItemRecord, now: DateTime<Utc>) -> Notification {
    let date_text = first_text(&[&record.date_lost, &record.date]);
    let id = first_key(&[&record.lost_id, &record.id]).unwrap_or_else(|| {
        synthesize_id(NotificationKind::Found, record.title.as_deref(), date_text)
    });

    let meta = ItemMeta {
        location: non_empty(&record.location),
        category: non_empty(&record.category),
    };

    Notification {
        id,
        title: display_title(record.title.as_deref(), "Found item"),
        message: truncate(record.description.as_deref().unwrap_or_default(), MESSAGE_LIMIT),
        date: date_text.and_then(parse_date).unwrap_or(now),
        detail: NotificationDetail::Found { meta, raw: record },
    }
}

/// Parse the date formats the backend hands out
///
/// Full RFC 3339 timestamps, bare `timestamp without time zone` values
/// (read as UTC), and plain `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }

    // Postgres likes "+00" offsets, which RFC 3339 doesn't allow
    if let Ok(dt) = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Cut text down to `limit` characters. No ellipsis.
pub fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

/// Fallback id for rows without a key: `<type>-<title>-<date>`
///
/// Uses the raw date text, not the parsed one, so an undated row doesn't get
/// a fresh id (and lose its read/dismissed state) on every refresh.
pub fn synthesize_id(kind: NotificationKind, title: Option<&str>, date: Option<&str>) -> String {
    format!(
        "{}-{}-{}",
        kind,
        title.unwrap_or_default(),
        date.unwrap_or_default()
    )
}

fn first_key(candidates: &[&Option<RecordKey>]) -> Option<String> {
    candidates
        .iter()
        .filter_map(|key| key.as_ref())
        .map(|key| key.to_string())
        .find(|key| !key.trim().is_empty())
}

fn first_text<'a>(candidates: &[&'a Option<String>]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|text| text.as_deref())
        .find(|text| !text.trim().is_empty())
}

fn non_empty(text: &Option<String>) -> Option<String> {
    text.as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn display_title(title: Option<&str>, fallback: &str) -> String {
    match title.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => fallback.to_string(),
    }
}

/// The complaint's `user` column is a name or an embedded user row
fn reporter_name(user: Option<&Value>) -> Option<String> {
    match user? {
        Value::String(name) if !name.trim().is_empty() => Some(name.trim().to_string()),
        Value::Object(row) => ["name", "full_name", "username", "email"]
            .iter()
            .filter_map(|field| row.get(*field).and_then(Value::as_str))
            .map(str::trim)
            .find(|v| !v.is_empty())
            .map(str::to_string),
        _ => None,
    }
}
