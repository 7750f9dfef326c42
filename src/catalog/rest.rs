//! PostgREST catalog client.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};

use crate::catalog::CatalogStore;
use crate::config::CatalogSettings;
use crate::error::{AppError, Result};
use crate::models::{CatalogRow, VariantKey};

/// Catalog table exposed through a PostgREST endpoint.
pub struct RestCatalog {
    client: Client,
    endpoint: String,
    service_key: String,
}

impl RestCatalog {
    pub fn new(client: Client, settings: &CatalogSettings, table: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/rest/v1/{}", settings.rest_url.trim_end_matches('/'), table),
            service_key: settings.service_key.clone(),
        }
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }
}

/// Query parameters selecting at most one row by natural key.
fn key_filter(key: &VariantKey) -> Vec<(&'static str, String)> {
    let weight = match key.weight {
        Some(w) => format!("eq.{w}"),
        None => "is.null".to_string(),
    };
    vec![
        ("select", "id".to_string()),
        ("manufacturer_slug", format!("eq.{}", key.manufacturer_slug)),
        ("slug", format!("eq.{}", key.slug)),
        ("color_name", format!("eq.{}", key.color_name)),
        ("weight", weight),
        ("limit", "1".to_string()),
    ]
}

async fn ensure_success(action: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AppError::persistence(format!(
        "{action} failed with HTTP {status}: {}",
        body.trim()
    )))
}

#[async_trait]
impl CatalogStore for RestCatalog {
    async fn exists(&self, key: &VariantKey) -> Result<bool> {
        let request = self.client.get(&self.endpoint).query(&key_filter(key));
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(AppError::persistence)?;
        let rows: Vec<serde_json::Value> = ensure_success("lookup", response)
            .await?
            .json()
            .await
            .map_err(AppError::persistence)?;
        Ok(!rows.is_empty())
    }

    async fn insert(&self, row: &CatalogRow) -> Result<()> {
        let request = self
            .client
            .post(&self.endpoint)
            .header("Prefer", "return=minimal")
            .json(row);
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(AppError::persistence)?;
        ensure_success("insert", response).await?;
        Ok(())
    }
}
