//! Knowledge-base integration for clerk-bot backed by the Notion API.
//!
//! Extracted records land as pages in a single Notion database, one property
//! per record field. The database's data source ID is resolved once on first
//! use and cached for the life of the client.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde_json::{Value, json};
use tokio::sync::OnceCell;
use tracing::{info, instrument};

use crate::{
    base::{config::Config, types::Res},
    extract::ExtractedMessage,
};

use super::{GenericKbClient, KbClient};

const NOTION_API_BASE: &str = "https://api.notion.com/v1";

// Extra methods on `KbClient` applied by the notion implementation.

impl KbClient {
    /// Creates a new Notion knowledge-base client.
    pub fn notion(config: &Config) -> Res<Self> {
        let client = NotionKbClient::new(config)?;
        Ok(Self { inner: Arc::new(client) })
    }
}

// Structs.

/// Notion client implementation.
#[derive(Clone)]
struct NotionKbClient {
    http: reqwest::Client,
    database_id: String,
    data_source_id: Arc<OnceCell<String>>,
}

impl NotionKbClient {
    /// Create a new Notion knowledge-base client.
    pub fn new(config: &Config) -> Res<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", config.notion_integration_token))?);
        headers.insert("Notion-Version", HeaderValue::from_str(&config.notion_api_version)?);

        let http = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            http,
            database_id: config.notion_database_id.clone(),
            data_source_id: Arc::new(OnceCell::new()),
        })
    }

    /// Resolves the database's data source ID, caching it on first use.
    ///
    /// Single-source databases report exactly one data source.
    async fn data_source_id(&self) -> Res<&str> {
        let id = self
            .data_source_id
            .get_or_try_init(|| async {
                let response = self.http.get(format!("{NOTION_API_BASE}/databases/{}", self.database_id)).send().await?.error_for_status()?;
                let body: Value = response.json().await?;

                let id = body["data_sources"][0]["id"]
                    .as_str()
                    .ok_or_else(|| anyhow::anyhow!("Notion database {} reports no data sources", self.database_id))?;

                info!("Resolved Notion data source ID: {}", id);

                Ok::<_, anyhow::Error>(id.to_string())
            })
            .await?;

        Ok(id.as_str())
    }
}

#[async_trait]
impl GenericKbClient for NotionKbClient {
    #[instrument(skip_all)]
    async fn create_entry(&self, record: &ExtractedMessage) -> Res<Value> {
        let data_source_id = self.data_source_id().await?;

        let body = json!({
            "parent": {
                "data_source_id": data_source_id,
            },
            "properties": {
                "Timestamp": {
                    "date": { "start": ts_to_iso8601(&record.timestamp)? }
                },
                "URL": {
                    "url": &record.url,
                },
                "LinkTitle": {
                    "title": [{ "text": { "content": record.link_title.clone().unwrap_or_default() } }]
                },
                "User": {
                    "rich_text": [{ "text": { "content": &record.user } }]
                },
                "MessageContent": {
                    "rich_text": [{ "text": { "content": &record.message_content } }]
                },
                "Permalink": {
                    "rich_text": [{ "text": { "content": &record.permalink } }]
                },
            },
        });

        let response = self.http.post(format!("{NOTION_API_BASE}/pages")).json(&body).send().await?.error_for_status()?;

        Ok(response.json().await?)
    }

    #[instrument(skip_all)]
    async fn list_entries(&self) -> Res<Vec<Value>> {
        let data_source_id = self.data_source_id().await?;

        let response = self
            .http
            .post(format!("{NOTION_API_BASE}/data_sources/{data_source_id}/query"))
            .json(&json!({}))
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response.json().await?;

        Ok(body["results"].as_array().cloned().unwrap_or_default())
    }
}

/// Converts a Slack `<seconds>.<micros>` timestamp into the ISO-8601 form
/// Notion's date property expects.
fn ts_to_iso8601(ts: &str) -> Res<String> {
    let (seconds, micros) = match ts.split_once('.') {
        Some((seconds, micros)) => (seconds, micros),
        None => (ts, "0"),
    };

    let seconds = seconds.parse::<i64>().map_err(|e| anyhow::anyhow!("Invalid message timestamp {:?}: {}", ts, e))?;
    let micros = micros.parse::<u32>().unwrap_or(0);

    let datetime = DateTime::from_timestamp(seconds, micros.saturating_mul(1000)).ok_or_else(|| anyhow::anyhow!("Message timestamp {:?} is out of range", ts))?;

    Ok(datetime.to_rfc3339_opts(SecondsFormat::Millis, true))
}

// Tests.
