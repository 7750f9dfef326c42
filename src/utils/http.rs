// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;

/// Create a configured asynchronous HTTP client.
///
/// The cookie store keeps one session per client across a run.
pub fn create_async_client(config: &CrawlerConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .cookie_store(true)
        .build()?;
    Ok(client)
}

/// Map a non-success status to the matching error.
pub fn check_status(url: &str, response: Response) -> Result<Response> {
    match response.status() {
        s if s.is_success() => Ok(response),
        StatusCode::NOT_FOUND | StatusCode::GONE => Err(AppError::NotFound(url.to_string())),
        s => Err(AppError::fetch(url, s)),
    }
}

/// Fetch a page body as text.
pub async fn fetch_text(client: &Client, url: &str) -> Result<String> {
    let response = check_status(url, client.get(url).send().await?)?;
    Ok(response.text().await?)
}

/// Fetch raw bytes, e.g. an image.
pub async fn fetch_bytes(client: &Client, url: &str) -> Result<Vec<u8>> {
    let response = check_status(url, client.get(url).send().await?)?;
    Ok(response.bytes().await?.to_vec())
}
