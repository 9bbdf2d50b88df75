//! # changefeed
//!
//! Changelog RSS ingestion shared by an interactive list view and a
//! home-screen widget.
//!
//! ```text
//! Fetcher → XML events → (tree | event) adapter → Feed → FeedStore / WidgetProvider
//! ```
//!
//! - [`feed`]: fetching, the two parser adapters and the post model
//! - [`store`]: application-path state with load/refresh and error surfacing
//! - [`widget`]: widget-path provider that never fails, plus text rendering
//! - [`config`]: optional TOML configuration
//! - [`util`]: width-aware text helpers

pub mod config;
pub mod feed;
pub mod store;
pub mod util;
pub mod widget;
