//! Application-path feed state.
//!
//! [`FeedStore`] is created by the composition root and handed to consumers
//! explicitly. Readers get a snapshot or a `watch::Receiver`; only the store
//! writes. Overlapping `load`/`refresh` calls are not serialized: whichever
//! finishes last sets the final state.

use std::sync::Arc;

use tokio::sync::watch;

use crate::feed::{filter_posts, FeedService, Post};

/// What the list view renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedState {
    /// Last successfully loaded posts. Kept when a later load fails.
    pub posts: Arc<Vec<Post>>,
    pub title: String,
    pub description: String,
    /// True until the first load attempt completes.
    pub loading: bool,
    /// True while a pull-to-refresh load is in flight.
    pub refreshing: bool,
    /// User-facing message from the most recent failed load.
    pub error: Option<String>,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            posts: Arc::new(Vec::new()),
            title: String::new(),
            description: String::new(),
            loading: true,
            refreshing: false,
            error: None,
        }
    }
}

impl FeedState {
    /// Posts whose title or description contains `query` (case-insensitive).
    pub fn search(&self, query: &str) -> Vec<&Post> {
        filter_posts(&self.posts, query)
    }

    /// Detail-view lookup.
    pub fn find(&self, id: &str) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == id)
    }
}

pub struct FeedStore {
    service: FeedService,
    state: watch::Sender<FeedState>,
}

impl FeedStore {
    pub fn new(service: FeedService) -> Self {
        let (state, _) = watch::channel(FeedState::default());
        Self { service, state }
    }

    /// Fetches the feed and publishes the outcome.
    ///
    /// On failure the error is logged and stored as a message while the
    /// previously loaded posts stay visible.
    pub async fn load(&self) {
        self.state.send_modify(|s| s.error = None);

        let result = self.service.fetch_feed().await;

        self.state.send_modify(|s| {
            match result {
                Ok(feed) => {
                    s.posts = Arc::new(feed.posts);
                    s.title = feed.title;
                    s.description = feed.description;
                }
                Err(e) => {
                    tracing::warn!(error = %e, kept = s.posts.len(), "Failed to load feed");
                    s.error = Some(e.user_message());
                }
            }
            s.loading = false;
            s.refreshing = false;
        });
    }

    /// Pull-to-refresh: same pipeline, flagged as refreshing while in flight.
    pub async fn refresh(&self) {
        self.state.send_modify(|s| s.refreshing = true);
        self.load().await;
    }

    pub fn snapshot(&self) -> FeedState {
        self.state.borrow().clone()
    }

    /// Read-only handle for consumers that react to changes.
    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.state.subscribe()
    }
}
