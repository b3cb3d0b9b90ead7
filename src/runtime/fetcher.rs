use crate::config::{ACCEPT_LANGUAGE, USER_AGENT};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE as ACCEPT_LANGUAGE_HEADER};
use reqwest::Client;

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, String>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("Network error fetching {url}: {e}"))?;

        if !response.status().is_success() {
            return Err(format!(
                "HTTP error {} fetching {url}",
                response.status().as_u16()
            ));
        }

        response
            .text()
            .await
            .map_err(|e| format!("Error reading response body from {url}: {e}"))
    }
}

/// Shared client carrying the browser-like identity the sources expect.
pub fn build_client() -> Result<Client, String> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT_LANGUAGE_HEADER,
        HeaderValue::from_static(ACCEPT_LANGUAGE),
    );
    Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .build()
        .map_err(|e| format!("Failed to build HTTP client: {e}"))
}

/// Download raw content with a capped linear retry budget. Only bulk act
/// downloads use this; section full-text fetches deliberately do not retry.
pub async fn download_with_retry(
    client: &Client,
    url: &str,
    attempts: u32,
) -> Result<Vec<u8>, String> {
    let mut last_error = format!("No download attempts budgeted for {url}");

    for attempt in 0..attempts {
        match client.get(url).send().await {
            Ok(response) if response.status().is_success() => {
                return response
                    .bytes()
                    .await
                    .map(|body| body.to_vec())
                    .map_err(|e| format!("Error reading download body from {url}: {e}"));
            }
            Ok(response) => {
                last_error = format!("HTTP error {} downloading {url}", response.status().as_u16());
                tracing::warn!(
                    "Download attempt {}/{attempts} failed: {last_error}",
                    attempt + 1
                );
            }
            Err(e) => {
                last_error = format!("Network error downloading {url}: {e}");
                tracing::warn!(
                    "Download attempt {}/{attempts} failed: {last_error}",
                    attempt + 1
                );
            }
        }
    }

    Err(last_error)
}
