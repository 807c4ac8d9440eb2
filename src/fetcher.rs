use reqwest::{header, Client, StatusCode};
use thiserror::Error;

/// Fetch failures the poll loop cares about: throttling and gateway
/// hiccups are retried silently, everything else ends the run.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("throttled by the remote service (HTTP {0})")]
    Transient(StatusCode),

    #[error("HTTP {0}")]
    Status(StatusCode),

    #[error("{0}")]
    Http(#[from] reqwest::Error),
}

impl FetchError {
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transient(_))
    }
}

/// Downloads the xlsx export of one spreadsheet, authenticated by a raw
/// cookie header value.
pub struct SheetFetcher {
    client: Client,
    url: String,
    cookies: String,
}

impl SheetFetcher {
    pub fn new(spreadsheet_id: &str, cookies: &str) -> Self {
        Self {
            client: Client::new(),
            url: format!(
                "https://docs.google.com/spreadsheets/d/{}/export?format=xlsx",
                spreadsheet_id
            ),
            cookies: cookies.to_string(),
        }
    }

    pub async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .header(header::COOKIE, &self.cookies)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::BAD_GATEWAY {
            return Err(FetchError::Transient(status));
        }
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        Ok(response.bytes().await?.to_vec())
    }
}
