// src/config.rs

//! Service credentials loaded from the environment.
//!
//! The TOML file holds behavior settings; endpoints and secrets for the
//! blob store, catalog and tracker come from environment variables. A
//! missing required variable is the one fatal setup error.

use crate::error::{AppError, Result};

const DEFAULT_TRACKER_API_URL: &str = "https://api.airtable.com/v0";
const DEFAULT_S3_REGION: &str = "auto";

/// S3-compatible blob store settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Settings {
    pub endpoint: String,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub public_base_url: String,
    pub region: String,
}

/// Relational catalog REST settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSettings {
    pub rest_url: String,
    pub service_key: String,
}

/// Tracker REST settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerSettings {
    pub api_url: String,
    pub api_token: String,
    pub base_id: String,
    pub makers_table: String,
    pub products_table: String,
}

/// Every external service a live run writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEnv {
    pub s3: S3Settings,
    pub catalog: CatalogSettings,
    pub tracker: TrackerSettings,
}

impl ServiceEnv {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`; empty values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mut missing = Vec::new();
        let mut required = |name: &'static str| {
            get(name).unwrap_or_else(|| {
                missing.push(name);
                String::new()
            })
        };

        let s3 = S3Settings {
            endpoint: required("S3_ENDPOINT"),
            bucket: required("S3_BUCKET"),
            access_key_id: required("S3_ACCESS_KEY_ID"),
            secret_access_key: required("S3_SECRET_ACCESS_KEY"),
            public_base_url: required("S3_PUBLIC_BASE_URL"),
            region: String::new(),
        };
        let catalog = CatalogSettings {
            rest_url: required("CATALOG_REST_URL"),
            service_key: required("CATALOG_SERVICE_KEY"),
        };
        let tracker = TrackerSettings {
            api_url: String::new(),
            api_token: required("TRACKER_API_TOKEN"),
            base_id: required("TRACKER_BASE_ID"),
            makers_table: required("TRACKER_MAKERS_TABLE"),
            products_table: required("TRACKER_PRODUCTS_TABLE"),
        };

        if !missing.is_empty() {
            return Err(AppError::config(format!(
                "missing environment variables: {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            s3: S3Settings {
                region: get("S3_REGION").unwrap_or_else(|| DEFAULT_S3_REGION.to_string()),
                ..s3
            },
            catalog,
            tracker: TrackerSettings {
                api_url: get("TRACKER_API_URL")
                    .unwrap_or_else(|| DEFAULT_TRACKER_API_URL.to_string()),
                ..tracker
            },
        })
    }
}
