use std::sync::Arc;

use thiserror::Error;

use crate::feed::events::EventParser;
use crate::feed::model::Feed;
use crate::feed::tree::TreeParser;

/// Errors produced while turning feed bytes into a [`Feed`].
#[derive(Debug, Error)]
pub enum ParseError {
    /// Markup was not well-formed XML.
    #[error("XML parse error: {0}")]
    Xml(String),
    /// No `<channel>` under the `<rss>` root.
    #[error("Feed has no rss channel")]
    MissingChannel,
    /// SEC-003: Nesting depth exceeds safety limit.
    #[error("XML nesting depth exceeds maximum of {0} levels")]
    TooDeep(usize),
    /// Document ended while elements were still open.
    #[error("Document ended with {0} unclosed element(s)")]
    UnexpectedEof(usize),
}

/// Turns raw RSS bytes into a normalized [`Feed`].
///
/// Implementations must agree byte-for-byte on the posts they produce for
/// the same input; they differ only in how they consume the XML.
pub trait FeedParser: Send + Sync {
    fn parse_feed(&self, bytes: &[u8]) -> Result<Feed, ParseError>;
}

/// Which adapter a composition root wires in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserKind {
    /// Materialize a generic tree, then normalize (application path).
    Tree,
    /// Normalize directly from the event stream (widget path).
    Events,
}

impl ParserKind {
    pub fn build(self) -> Arc<dyn FeedParser> {
        match self {
            ParserKind::Tree => Arc::new(TreeParser),
            ParserKind::Events => Arc::new(EventParser),
        }
    }
}
