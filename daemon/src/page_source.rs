/// Fetches the selected server's page for the update pipeline.
use std::time::Duration;

use reqwest::Client;
use thiserror::Error;

const PAGE_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered {status}")]
    Status { url: String, status: reqwest::StatusCode },
}

pub struct PageSource {
    client: Client,
}

impl PageSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Downloads `url` and returns the body as text.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let request_failed = |source: reqwest::Error| FetchError::Request { url: url.to_string(), source };

        let response = self
            .client
            .get(url)
            .timeout(PAGE_TIMEOUT)
            .send()
            .await
            .map_err(request_failed)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { url: url.to_string(), status });
        }
        response.text().await.map_err(request_failed)
    }
}

/// Builds the HTTP client shared by the page source and the profile query.
pub fn build_client() -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(concat!("pure-seeder/", env!("CARGO_PKG_VERSION")))
        .build()
}
