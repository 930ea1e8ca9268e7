use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::records::{ComplaintRecord, FoundItemRecord, LostItemRecord};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Table not found: {0}")]
    NotFound(String),

    #[error("Authentication required")]
    AuthRequired,

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    ParseError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Which tables hold the three collections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub complaints: String,
    pub lost_items: String,
    pub found_items: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            complaints: "complaints".to_string(),
            lost_items: "lost_items".to_string(),
            found_items: "found_items".to_string(),
        }
    }
}

/// Read-only client for the hosted campus backend
///
/// The backend speaks PostgREST: every table lives under `/rest/v1/<table>`
/// and the project key goes in both the `apikey` and bearer headers.
pub struct CampusClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    tables: TableNames,
}

impl CampusClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        Self::with_tables(base_url, api_key, TableNames::default())
    }

    /// For deployments that renamed the tables
    pub fn with_tables(
        base_url: impl Into<String>,
        api_key: Option<String>,
        tables: TableNames,
    ) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("CampusFeed/0.1.0"),
        );

        let client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            tables,
        })
    }

    pub fn tables(&self) -> &TableNames {
        &self.tables
    }

    pub async fn fetch_complaints(&self) -> Result<Vec<ComplaintRecord>> {
        self.fetch_table(&self.tables.complaints).await
    }

    pub async fn fetch_lost_items(&self) -> Result<Vec<LostItemRecord>> {
        self.fetch_table(&self.tables.lost_items).await
    }

    pub async fn fetch_found_items(&self) -> Result<Vec<FoundItemRecord>> {
        self.fetch_table(&self.tables.found_items).await
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Fetch every row of a table
    ///
    /// One attempt only. A failure here just means this collection sits out
    /// the current refresh; the next tick tries again.
    async fn fetch_table<T: DeserializeOwned>(&self, table: &str) -> Result<Vec<T>> {
        let url = self.table_url(table);
        debug!("Fetching {}", url);

        let mut request = self.client.get(&url).query(&[("select", "*")]);

        if let Some(ref key) = self.api_key {
            request = request
                .header("apikey", key)
                .header(reqwest::header::AUTHORIZATION, format!("Bearer {}", key));
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(table.to_string()));
        }

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ApiError::AuthRequired);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ApiError::RateLimitExceeded);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::RequestFailed(format!("Status {}: {}", status, body)));
        }

        // Read as text first so a bad payload surfaces as ParseError, not NetworkError
        let body = response.text().await?;
        let rows: Vec<T> = serde_json::from_str(&body)?;
        debug!("{} returned {} rows", table, rows.len());
        Ok(rows)
    }
}
