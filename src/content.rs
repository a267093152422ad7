use std::time::Duration;

use reqwest::blocking::Client;

use crate::error::SyncError;

pub trait ContentClient: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, SyncError>;
}

impl<C: ContentClient> ContentClient for &C {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, SyncError> {
        (**self).fetch(url)
    }
}

#[derive(Clone)]
pub struct ContentHttpClient {
    client: Client,
}

impl ContentHttpClient {
    pub fn new(timeout: Duration) -> Result<Self, SyncError> {
        let client = crate::http::build_client(timeout).map_err(SyncError::Fetch)?;
        Ok(Self { client })
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, SyncError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .map(|text| text.chars().take(200).collect())
            .unwrap_or_else(|_| "content request failed".to_string());
        Err(SyncError::FetchStatus { status, message })
    }
}

impl ContentClient for ContentHttpClient {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, SyncError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| SyncError::Fetch(err.to_string()))?;
        let response = Self::handle_status(response)?;
        let body = response
            .bytes()
            .map_err(|err| SyncError::Fetch(err.to_string()))?;
        Ok(body.to_vec())
    }
}
