use std::sync::Arc;

use thiserror::Error;

use crate::feed::fetcher::{FeedFetcher, FetchError};
use crate::feed::model::Feed;
use crate::feed::parser::{FeedParser, ParseError};

/// Any failure of the fetch → parse pipeline. There is no partial result.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl FeedError {
    /// Text shown to the user in place of the list.
    pub fn user_message(&self) -> String {
        match self {
            FeedError::Fetch(e) => format!("Feed unavailable: {e}"),
            FeedError::Parse(e) => format!("Feed could not be read: {e}"),
        }
    }
}

/// Fetcher plus the parser adapter chosen by the composition root.
#[derive(Clone)]
pub struct FeedService {
    fetcher: FeedFetcher,
    parser: Arc<dyn FeedParser>,
}

impl FeedService {
    pub fn new(fetcher: FeedFetcher, parser: Arc<dyn FeedParser>) -> Self {
        Self { fetcher, parser }
    }

    /// One fetch → parse → normalize pass.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Fetch`] for transport and HTTP status failures and
    /// [`FeedError::Parse`] for malformed XML or a missing channel. Failures
    /// are logged here; transport and status failures at separate fields.
    pub async fn fetch_feed(&self) -> Result<Feed, FeedError> {
        let url = self.fetcher.feed_url();

        let bytes = self.fetcher.fetch().await.map_err(|e| {
            if e.is_http_status() {
                tracing::warn!(feed = %url, error = %e, "Feed returned error status");
            } else {
                tracing::warn!(feed = %url, error = %e, "Feed transport failure");
            }
            e
        })?;

        let feed = self.parser.parse_feed(&bytes).map_err(|e| {
            tracing::warn!(feed = %url, error = %e, "Feed parse failure");
            e
        })?;

        tracing::info!(feed = %url, posts = feed.posts.len(), "Feed loaded");
        Ok(feed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{FetchStrategy, ParserKind};
    use url::Url;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn service_for(body: ResponseTemplate, kind: ParserKind) -> (MockServer, FeedService) {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(body)
            .mount(&mock_server)
            .await;
        let url = Url::parse(&format!("{}/rss.xml", mock_server.uri())).unwrap();
        let fetcher = FeedFetcher::new(reqwest::Client::new(), url, FetchStrategy::Direct);
        (mock_server, FeedService::new(fetcher, kind.build()))
    }

    #[tokio::test]
    async fn test_fetch_feed_success() {
        let body = ResponseTemplate::new(200).set_body_string(
            "<rss><channel><title>T</title><item><title>A</title><guid>a</guid></item></channel></rss>",
        );
        let (_server, service) = service_for(body, ParserKind::Tree).await;

        let feed = service.fetch_feed().await.unwrap();
        assert_eq!(feed.title, "T");
        assert_eq!(feed.posts.len(), 1);
        assert_eq!(feed.posts[0].id, "a");
    }

    #[tokio::test]
    async fn test_malformed_feed_parse_error() {
        let body = ResponseTemplate::new(200).set_body_string("<not valid xml");
        let (_server, service) = service_for(body, ParserKind::Events).await;

        match service.fetch_feed().await.unwrap_err() {
            FeedError::Parse(_) => {}
            e => panic!("Expected Parse error, got {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_transport_failure_is_not_status() {
        let url = Url::parse("http://127.0.0.1:9/rss.xml").unwrap();
        let fetcher = FeedFetcher::new(reqwest::Client::new(), url, FetchStrategy::Direct);
        let service = FeedService::new(fetcher, ParserKind::Tree.build());

        match service.fetch_feed().await.unwrap_err() {
            FeedError::Fetch(e) => assert!(!e.is_http_status()),
            e => panic!("Expected Fetch error, got {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_status_error_message() {
        let (_server, service) = service_for(ResponseTemplate::new(503), ParserKind::Tree).await;

        let err = service.fetch_feed().await.unwrap_err();
        assert!(matches!(err, FeedError::Fetch(ref e) if e.is_http_status()));
        assert!(matches!(err, FeedError::Fetch(FetchError::HttpStatus(503))));
        assert_eq!(err.user_message(), "Feed unavailable: HTTP error: status 503");
    }
}
