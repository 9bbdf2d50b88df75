use futures::StreamExt;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while retrieving the feed document.
///
/// Transport failures and HTTP status failures are kept apart so callers can
/// log them differently, even though the UI treats both as "feed unavailable".
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, timeout)
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
}

impl FetchError {
    /// True when the server answered with a non-2xx status.
    pub fn is_http_status(&self) -> bool {
        matches!(self, FetchError::HttpStatus(_))
    }
}

/// Whether the pipeline runs natively or inside a browser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionContext {
    #[default]
    Native,
    /// Same-origin policy applies; cross-origin XML must go through a relay.
    Browser,
}

impl ExecutionContext {
    /// Build-time detection: wasm targets run in a browser.
    pub fn detect() -> Self {
        if cfg!(target_arch = "wasm32") {
            ExecutionContext::Browser
        } else {
            ExecutionContext::Native
        }
    }
}

/// How the request URL is derived from the upstream feed URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStrategy {
    /// Request the upstream feed as-is.
    Direct,
    /// Request `relay?url=<percent-encoded upstream>` instead.
    ViaRelay { relay: Url },
}

impl FetchStrategy {
    /// Picks the strategy once, at composition time.
    pub fn for_context(context: ExecutionContext, relay: Url) -> Self {
        match context {
            ExecutionContext::Native => FetchStrategy::Direct,
            ExecutionContext::Browser => FetchStrategy::ViaRelay { relay },
        }
    }

    /// URL actually requested for `feed_url`.
    ///
    /// The upstream URL becomes the relay's only `url` query parameter;
    /// any query already on the relay base is replaced.
    pub fn request_url(&self, feed_url: &Url) -> Url {
        match self {
            FetchStrategy::Direct => feed_url.clone(),
            FetchStrategy::ViaRelay { relay } => {
                let mut url = relay.clone();
                url.query_pairs_mut()
                    .clear()
                    .append_pair("url", feed_url.as_str());
                url
            }
        }
    }
}

/// Single-attempt feed retrieval: no cache, no retry, transport-default timeouts.
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: reqwest::Client,
    feed_url: Url,
    strategy: FetchStrategy,
}

impl FeedFetcher {
    pub fn new(client: reqwest::Client, feed_url: Url, strategy: FetchStrategy) -> Self {
        Self {
            client,
            feed_url,
            strategy,
        }
    }

    pub fn feed_url(&self) -> &Url {
        &self.feed_url
    }

    /// Fetches the raw feed document.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Transport`] - Connection, DNS, TLS or timeout failure
    /// - [`FetchError::HttpStatus`] - Non-2xx HTTP response
    /// - [`FetchError::ResponseTooLarge`] - Body exceeded 10MB
    pub async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        let request_url = self.strategy.request_url(&self.feed_url);
        tracing::debug!(url = %request_url, strategy = ?self.strategy, "Fetching feed");

        let response = self.client.get(request_url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %request_url, status = %status, "Feed request rejected");
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let bytes = read_limited_bytes(response, MAX_FEED_SIZE).await?;
        tracing::debug!(url = %request_url, bytes = bytes.len(), "Feed fetched");
        Ok(bytes)
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
