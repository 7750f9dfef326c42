//! Airtable-style REST tracker.
//!
//! Makers table fields: `Name`, `Slug`, `Status`.
//! Products table fields: `Name`, `Source URL`, `Maker` (linked record),
//! `Note`, `Recorded At`.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;

use crate::config::TrackerSettings;
use crate::error::{AppError, Result};
use crate::models::TrackerConfig;
use crate::tracker::{ProductRecord, Tracker};

#[derive(Debug, Deserialize)]
struct RecordList {
    #[serde(default)]
    records: Vec<Record>,
}

#[derive(Debug, Deserialize)]
struct Record {
    id: String,
}

/// Tracker backed by an Airtable-compatible API.
pub struct AirtableTracker {
    client: Client,
    settings: TrackerSettings,
    statuses: TrackerConfig,
}

impl AirtableTracker {
    pub fn new(client: Client, settings: TrackerSettings, statuses: TrackerConfig) -> Self {
        Self {
            client,
            settings,
            statuses,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!(
            "{}/{}/{}",
            self.settings.api_url.trim_end_matches('/'),
            self.settings.base_id,
            table
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.settings.api_token)
    }

    async fn send(&self, action: &str, request: RequestBuilder) -> Result<Response> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| AppError::tracker(format!("{action}: {e}")))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AppError::tracker(format!(
            "{action} failed with HTTP {status}: {}",
            body.trim()
        )))
    }

    async fn find_maker(&self, manufacturer_slug: &str) -> Result<Option<String>> {
        let formula = format!("{{Slug}}='{}'", escape_formula_value(manufacturer_slug));
        let request = self
            .client
            .get(self.table_url(&self.settings.makers_table))
            .query(&[("filterByFormula", formula.as_str()), ("maxRecords", "1")]);
        let list: RecordList = self
            .send("maker lookup", request)
            .await?
            .json()
            .await
            .map_err(|e| AppError::tracker(format!("maker lookup: {e}")))?;
        Ok(list.records.into_iter().next().map(|r| r.id))
    }
}

/// Escape a value for a single-quoted formula string.
pub fn escape_formula_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

#[async_trait]
impl Tracker for AirtableTracker {
    async fn find_or_create_maker(&self, manufacturer_slug: &str, name: &str) -> Result<String> {
        if let Some(id) = self.find_maker(manufacturer_slug).await? {
            log::debug!("Tracker maker {} found: {}", manufacturer_slug, id);
            return Ok(id);
        }

        let body = json!({
            "fields": {
                "Name": name,
                "Slug": manufacturer_slug,
                "Status": self.statuses.status_registering,
            }
        });
        let request = self
            .client
            .post(self.table_url(&self.settings.makers_table))
            .json(&body);
        let record: Record = self
            .send("maker create", request)
            .await?
            .json()
            .await
            .map_err(|e| AppError::tracker(format!("maker create: {e}")))?;

        log::info!("Tracker maker {} created: {}", manufacturer_slug, record.id);
        Ok(record.id)
    }

    async fn record_product(&self, record: &ProductRecord) -> Result<()> {
        let body = json!({
            "fields": {
                "Name": record.product_name,
                "Source URL": record.source_url,
                "Maker": [record.maker_id],
                "Note": record.note,
                "Recorded At": Utc::now().to_rfc3339(),
            }
        });
        let request = self
            .client
            .post(self.table_url(&self.settings.products_table))
            .json(&body);
        self.send("product record", request).await?;
        Ok(())
    }

    async fn finalize_maker(&self, maker_id: &str) -> Result<()> {
        let body = json!({ "fields": { "Status": self.statuses.status_registered } });
        let url = format!(
            "{}/{}",
            self.table_url(&self.settings.makers_table),
            maker_id
        );
        self.send("maker finalize", self.client.patch(url).json(&body))
            .await?;
        Ok(())
    }
}
