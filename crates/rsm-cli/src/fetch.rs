//! Rule list retrieval
//!
//! One request per source, no retry. `file://` locators are read from
//! disk so lists can be merged offline.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::{Client, StatusCode, Url};

use crate::config::RuleSource;

const USER_AGENT: &str = concat!("ruleset-merge/", env!("CARGO_PKG_VERSION"));

/// Failure to retrieve one source. The pipeline skips the source.
#[derive(Debug, thiserror::Error)]
#[error("Failed to fetch '{source_name}': {kind}")]
pub struct FetchError {
    pub source_name: String,
    pub kind: FetchErrorKind,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchErrorKind {
    #[error("request failed: {0}")]
    Request(reqwest::Error),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("HTTP status {0}")]
    Status(StatusCode),
    #[error("cannot read '{path}': {error}")]
    Read { path: PathBuf, error: std::io::Error },
    #[error("unsupported locator '{0}'")]
    Unsupported(Url),
}

impl FetchError {
    pub fn new(source: &RuleSource, kind: FetchErrorKind) -> Self {
        Self {
            source_name: source.name.clone(),
            kind,
        }
    }
}

/// Retrieves the raw text of a rule source.
pub trait Fetcher {
    fn fetch(&self, source: &RuleSource) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// HTTP(S) and local file fetcher.
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client, timeout })
    }

    async fn fetch_http(&self, source: &RuleSource) -> Result<String, FetchError> {
        let response = self
            .client
            .get(source.url.clone())
            .send()
            .await
            .map_err(|e| FetchError::new(source, self.request_error(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(source, FetchErrorKind::Status(status)));
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::new(source, self.request_error(e)))
    }

    fn request_error(&self, error: reqwest::Error) -> FetchErrorKind {
        if error.is_timeout() {
            FetchErrorKind::Timeout(self.timeout)
        } else {
            FetchErrorKind::Request(error)
        }
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, source: &RuleSource) -> Result<String, FetchError> {
        log::info!("downloading {} from {}", source.name, source.url);
        match source.url.scheme() {
            "http" | "https" => self.fetch_http(source).await,
            "file" => read_local(source).await,
            _ => Err(FetchError::new(
                source,
                FetchErrorKind::Unsupported(source.url.clone()),
            )),
        }
    }
}

async fn read_local(source: &RuleSource) -> Result<String, FetchError> {
    let path = source
        .url
        .to_file_path()
        .map_err(|()| FetchError::new(source, FetchErrorKind::Unsupported(source.url.clone())))?;

    tokio::fs::read_to_string(&path)
        .await
        .map_err(|error| FetchError::new(source, FetchErrorKind::Read { path, error }))
}
