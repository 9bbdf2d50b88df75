//! Feed ingestion: fetch → parse → normalize → typed post list.
//!
//! - [`fetcher`] - Request URL selection (direct or CORS relay) and the HTTP call
//! - [`tree`] - Adapter that materializes a generic XML tree before normalizing
//! - [`events`] - Adapter that normalizes straight from the XML event stream
//! - [`service`] - Wires a fetcher to one adapter
//!
//! Both adapters implement [`FeedParser`] and build posts through
//! [`Post::from_fields`], so they produce identical post lists for the same
//! document. Which one runs is decided by the composition root.
//!
//! # Example
//!
//! ```ignore
//! use changefeed::feed::{ExecutionContext, FeedFetcher, FeedService, FetchStrategy, ParserKind};
//!
//! let strategy = FetchStrategy::for_context(ExecutionContext::detect(), relay);
//! let fetcher = FeedFetcher::new(reqwest::Client::new(), feed_url, strategy);
//! let service = FeedService::new(fetcher, ParserKind::Tree.build());
//! let feed = service.fetch_feed().await?;
//! ```

mod date;
mod events;
mod fetcher;
mod model;
mod parser;
mod service;
mod tree;
mod xml;

pub use date::format_pub_date;
pub use events::EventParser;
pub use fetcher::{ExecutionContext, FeedFetcher, FetchError, FetchStrategy};
pub use model::{filter_posts, Feed, ItemFields, Post};
pub use parser::{FeedParser, ParseError, ParserKind};
pub use service::{FeedError, FeedService};
pub use tree::{build_tree, TreeParser};
