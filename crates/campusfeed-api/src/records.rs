use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Primary key of a backend row
///
/// The hosted store hands out integer keys for some tables and UUID strings
/// for others, so we accept either and render both as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordKey {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKey::Number(n) => write!(f, "{}", n),
            RecordKey::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A row from the complaints table
///
/// Every column is optional. Rows come from forms with plenty of optional
/// inputs and older rows predate some columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplaintRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complaint_id: Option<RecordKey>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    /// Either a plain name or an embedded user row, depending on the select
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub reported_by: Option<String>,
    /// Columns we don't model, kept so the full row survives
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A row from the lost items table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LostItemRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lost_id: Option<RecordKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordKey>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub distinguishing_features: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub date_lost: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A row from the found items table
///
/// Found items share the lost-item column names (`lost_id`, `date_lost`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FoundItemRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lost_id: Option<RecordKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordKey>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub date_lost: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Accept strings, numbers and booleans as text; anything else reads as absent.
///
/// One odd cell (say a numeric priority) shouldn't sink the whole table.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complaint_accepts_numeric_and_text_keys() {
        let rows: Vec<ComplaintRecord> = serde_json::from_str(
            r#"[{"id": 7, "title": "Broken fan"}, {"complaint_id": "c-9"}]"#,
        )
        .unwrap();

        assert_eq!(rows[0].id, Some(RecordKey::Number(7)));
        assert_eq!(rows[0].title.as_deref(), Some("Broken fan"));
        assert_eq!(rows[1].complaint_id, Some(RecordKey::Text("c-9".into())));
        assert_eq!(rows[1].id, None);
    }

    #[test]
    fn test_unknown_columns_are_kept() {
        let row: LostItemRecord = serde_json::from_str(
            r#"{"lost_id": "l1", "contact_phone": "555-0101", "image_url": null}"#,
        )
        .unwrap();

        assert_eq!(row.extra.get("contact_phone"), Some(&Value::from("555-0101")));
        assert!(row.extra.contains_key("image_url"));
    }

    #[test]
    fn test_lenient_text_coerces_scalars() {
        let row: ComplaintRecord = serde_json::from_str(
            r#"{"priority": 2, "status": null, "description": ["not", "text"]}"#,
        )
        .unwrap();

        assert_eq!(row.priority.as_deref(), Some("2"));
        assert_eq!(row.status, None);
        assert_eq!(row.description, None);
    }

    #[test]
    fn test_embedded_user_object() {
        let row: ComplaintRecord =
            serde_json::from_str(r#"{"id": 1, "user": {"name": "Asha", "email": "a@campus.edu"}}"#)
                .unwrap();

        assert!(row.user.as_ref().map(Value::is_object).unwrap_or(false));
    }

    #[test]
    fn test_record_key_display() {
        assert_eq!(RecordKey::Number(42).to_string(), "42");
        assert_eq!(RecordKey::Text("abc".into()).to_string(), "abc");
    }
}
