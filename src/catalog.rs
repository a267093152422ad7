use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;

use crate::domain::DatasetDescriptor;
use crate::error::SyncError;

pub trait CatalogClient: Send + Sync {
    /// Every published dataset tagged with the configured theme.
    fn fetch_catalog(&self) -> Result<Vec<DatasetDescriptor>, SyncError>;
}

#[derive(Clone)]
pub struct CatalogHttpClient {
    client: Client,
    url: String,
    theme: String,
}

impl CatalogHttpClient {
    pub fn new(url: &str, theme: &str, timeout: Duration) -> Result<Self, SyncError> {
        let client = crate::http::build_client(timeout).map_err(SyncError::CatalogUnavailable)?;
        Ok(Self {
            client,
            url: url.to_string(),
            theme: theme.to_string(),
        })
    }
}

impl CatalogClient for CatalogHttpClient {
    fn fetch_catalog(&self) -> Result<Vec<DatasetDescriptor>, SyncError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .map_err(|err| SyncError::CatalogUnavailable(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::CatalogUnavailable(format!(
                "{} returned status {}",
                self.url,
                status.as_u16()
            )));
        }
        let body = response
            .bytes()
            .map_err(|err| SyncError::CatalogUnavailable(err.to_string()))?;
        parse_catalog(&body, &self.theme)
    }
}

/// Decodes the metastore listing and keeps the entries tagged with `theme`.
/// Only in-theme records must carry every descriptor field; a missing field there
/// rejects the whole listing.
pub fn parse_catalog(body: &[u8], theme: &str) -> Result<Vec<DatasetDescriptor>, SyncError> {
    let records: Vec<Value> = serde_json::from_slice(body)
        .map_err(|err| SyncError::CatalogUnavailable(format!("malformed catalog: {err}")))?;
    records
        .into_iter()
        .filter(|record| record_has_theme(record, theme))
        .map(|record| {
            serde_json::from_value::<DatasetDescriptor>(record).map_err(|err| {
                SyncError::CatalogUnavailable(format!("malformed dataset record: {err}"))
            })
        })
        .collect()
}

fn record_has_theme(record: &Value, theme: &str) -> bool {
    record
        .get("theme")
        .and_then(Value::as_array)
        .is_some_and(|tags| tags.iter().any(|tag| tag.as_str() == Some(theme)))
}
