use crate::documents::Document;
use futures::StreamExt;
use reqwest::header::{HeaderValue, AUTHORIZATION, RETRY_AFTER};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://readwise.io/api/v3";
pub const DEFAULT_AUTH_URL: &str = "https://readwise.io/api/v2/auth/";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// One page of the list endpoint. Bodies are HTML and can be large.
const MAX_PAGE_SIZE: usize = 32 * 1024 * 1024; // 32MB
/// Upper bound on cursor follows, so a misbehaving server cannot loop us forever.
const MAX_PAGES: usize = 1000;
const MAX_RETRIES: u32 = 3;
/// Longest server-requested back-off we are willing to honour.
const MAX_RETRY_AFTER_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request timed out after {0}s")]
    Timeout(u64),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Rate limited after {0} retries")]
    RateLimited(u32),
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Document not found")]
    NotFound,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Too many pages (stopped after {0})")]
    TooManyPages(usize),
}

/// Wire shape of `GET /list/`.
#[derive(Debug, Deserialize)]
pub struct DocumentPage {
    #[serde(default)]
    pub count: u64,
    #[serde(rename = "nextPageCursor", default)]
    pub next_page_cursor: Option<String>,
    #[serde(default)]
    pub results: Vec<Document>,
}

/// Authenticated client for the reader service.
///
/// Cheap to share behind an `Arc`; the inner `reqwest::Client` pools
/// connections across spawned tasks.
pub struct ReaderClient {
    http: reqwest::Client,
    token: SecretString,
    base_url: String,
    auth_url: Url,
    timeout: Duration,
    retry_delay: Duration,
}

impl std::fmt::Debug for ReaderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderClient")
            .field("base_url", &self.base_url)
            .field("auth_url", &self.auth_url.as_str())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ReaderClient {
    pub fn new(token: SecretString) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            http,
            token,
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_url: Url::parse(DEFAULT_AUTH_URL)?,
            timeout: DEFAULT_TIMEOUT,
            retry_delay: DEFAULT_RETRY_DELAY,
        })
    }

    /// Point the client at a different API root (e.g. a local mock).
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ApiError> {
        Url::parse(base_url)?;
        self.base_url = base_url.trim_end_matches('/').to_string();
        Ok(self)
    }

    pub fn with_auth_url(mut self, auth_url: &str) -> Result<Self, ApiError> {
        self.auth_url = Url::parse(auth_url)?;
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Base delay for exponential back-off on 429 and 5xx responses.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Fetch every document, following `nextPageCursor` until it runs out.
    ///
    /// Any failure aborts the whole walk; partial results are never returned.
    pub async fn fetch_all_documents(&self) -> Result<Vec<Document>, ApiError> {
        let mut documents = Vec::new();
        let mut cursor: Option<String> = None;

        for page_number in 1..=MAX_PAGES {
            let mut url = self.list_url()?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("withHtmlContent", "true");
                if let Some(cursor) = &cursor {
                    query.append_pair("pageCursor", cursor);
                }
            }

            let page = self.get_page(url).await?;
            tracing::debug!(
                page = page_number,
                results = page.results.len(),
                total = page.count,
                "Fetched document page"
            );
            documents.extend(page.results);

            match page.next_page_cursor.filter(|c| !c.is_empty()) {
                Some(next) => cursor = Some(next),
                None => {
                    tracing::info!(documents = documents.len(), pages = page_number, "Loaded documents");
                    return Ok(documents);
                }
            }
        }

        tracing::warn!(max_pages = MAX_PAGES, "Gave up following page cursors");
        Err(ApiError::TooManyPages(MAX_PAGES))
    }

    /// Fetch a single document by id and return its summary.
    pub async fn fetch_one(&self, id: &str) -> Result<String, ApiError> {
        let mut url = self.list_url()?;
        url.query_pairs_mut()
            .append_pair("id", id)
            .append_pair("withHtmlContent", "true");

        let page = self.get_page(url).await?;
        page.results
            .into_iter()
            .next()
            .map(|doc| doc.summary)
            .ok_or(ApiError::NotFound)
    }

    /// Check the token against the auth endpoint. Only `204 No Content`
    /// counts as accepted.
    pub async fn validate_token(&self) -> Result<(), ApiError> {
        let request = self
            .http
            .get(self.auth_url.clone())
            .header(AUTHORIZATION, self.auth_header()?);

        let response = tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| ApiError::Timeout(self.timeout.as_secs()))??;

        match response.status() {
            StatusCode::NO_CONTENT => Ok(()),
            status if status.is_success() => Err(ApiError::InvalidToken),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ApiError::InvalidToken),
            status => Err(ApiError::HttpStatus(status.as_u16())),
        }
    }

    fn list_url(&self) -> Result<Url, ApiError> {
        Ok(Url::parse(&format!("{}/list/", self.base_url))?)
    }

    fn auth_header(&self) -> Result<HeaderValue, ApiError> {
        let mut value = HeaderValue::from_str(&format!("Token {}", self.token.expose_secret()))
            .map_err(|_| ApiError::InvalidToken)?;
        value.set_sensitive(true);
        Ok(value)
    }

    /// GET one list page with back-off on rate limiting and server errors.
    async fn get_page(&self, url: Url) -> Result<DocumentPage, ApiError> {
        let mut retry_count = 0;

        loop {
            let request = self
                .http
                .get(url.clone())
                .header(AUTHORIZATION, self.auth_header()?);

            let response = tokio::time::timeout(self.timeout, request.send())
                .await
                .map_err(|_| ApiError::Timeout(self.timeout.as_secs()))??;

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                if retry_count >= MAX_RETRIES {
                    return Err(if status == StatusCode::TOO_MANY_REQUESTS {
                        ApiError::RateLimited(MAX_RETRIES)
                    } else {
                        ApiError::HttpStatus(status.as_u16())
                    });
                }

                let delay = retry_after(&response)
                    .unwrap_or_else(|| self.retry_delay * 2u32.pow(retry_count));
                tracing::warn!(
                    status = %status,
                    retry = retry_count + 1,
                    delay_ms = delay.as_millis() as u64,
                    "Reader API asked us to back off"
                );
                tokio::time::sleep(delay).await;
                retry_count += 1;
                continue;
            }

            if !status.is_success() {
                return Err(ApiError::HttpStatus(status.as_u16()));
            }

            let bytes = read_limited_bytes(response, MAX_PAGE_SIZE).await?;
            return Ok(serde_json::from_slice(&bytes)?);
        }
    }
}

/// `Retry-After` in delta-seconds form, capped.
fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    let secs: u64 = response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()?;
    Some(Duration::from_secs(secs.min(MAX_RETRY_AFTER_SECS)))
}

async fn read_limited_bytes(response: reqwest::Response, limit: usize) -> Result<Vec<u8>, ApiError> {
    if let Some(len) = response.content_length() {
        if len > limit as u64 {
            return Err(ApiError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
