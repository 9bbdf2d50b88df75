//! Widget-path ingestion and text rendering.
//!
//! The widget host has no way to show an error, so every failure collapses
//! into an empty post list and the views fall back to an empty state. The
//! host decides when to call [`WidgetProvider::timeline`]; the provider only
//! suggests the next refresh time.

use chrono::{DateTime, TimeDelta, Utc};

use crate::feed::{FeedService, Post};
use crate::util::{strip_control_chars, truncate_to_width, wrap_lines};

/// Posts kept per snapshot.
pub const DEFAULT_MAX_POSTS: usize = 10;
/// Suggested gap between timeline reloads.
pub const DEFAULT_REFRESH_MINUTES: i64 = 60;

const BRAND: &str = "Expo";
const HEADER: &str = "Expo Changelog";
const EMPTY_STATE: &str = "No posts";
/// Posts shown by the large family.
const LARGE_POST_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum WidgetFamily {
    Small,
    Medium,
    Large,
}

/// What the widget shows at `date`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetEntry {
    pub date: DateTime<Utc>,
    pub posts: Vec<Post>,
}

/// A single-entry timeline plus the time the host should ask again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetTimeline {
    pub entries: Vec<WidgetEntry>,
    pub next_refresh: DateTime<Utc>,
}

pub struct WidgetProvider {
    service: FeedService,
    max_posts: usize,
    refresh_interval: TimeDelta,
}

impl WidgetProvider {
    pub fn new(service: FeedService) -> Self {
        Self {
            service,
            max_posts: DEFAULT_MAX_POSTS,
            refresh_interval: TimeDelta::minutes(DEFAULT_REFRESH_MINUTES),
        }
    }

    pub fn with_max_posts(mut self, max_posts: usize) -> Self {
        self.max_posts = max_posts;
        self
    }

    pub fn with_refresh_interval(mut self, interval: TimeDelta) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// First `max_posts` posts of the feed, or nothing on any failure.
    pub async fn fetch_posts(&self) -> Vec<Post> {
        match self.service.fetch_feed().await {
            Ok(feed) => {
                let mut posts = feed.posts;
                posts.truncate(self.max_posts);
                posts
            }
            Err(e) => {
                tracing::warn!(error = %e, "Widget feed unavailable, rendering empty state");
                Vec::new()
            }
        }
    }

    /// Shown by the host before any data exists.
    pub fn placeholder(&self, now: DateTime<Utc>) -> WidgetEntry {
        WidgetEntry {
            date: now,
            posts: Vec::new(),
        }
    }

    /// Gallery previews use fixed sample posts instead of the network.
    pub async fn snapshot(&self, now: DateTime<Utc>, is_preview: bool) -> WidgetEntry {
        let posts = if is_preview {
            sample_posts()
        } else {
            self.fetch_posts().await
        };
        WidgetEntry { date: now, posts }
    }

    pub async fn timeline(&self, now: DateTime<Utc>) -> WidgetTimeline {
        let posts = self.fetch_posts().await;
        WidgetTimeline {
            entries: vec![WidgetEntry { date: now, posts }],
            next_refresh: now + self.refresh_interval,
        }
    }
}

/// Fixed entries for previews.
pub fn sample_posts() -> Vec<Post> {
    vec![
        Post {
            id: "1".to_string(),
            title: "Expo SDK 55 Beta Released".to_string(),
            link: "https://expo.dev/changelog".to_string(),
            published_raw: "2025-01-15".to_string(),
            description: Some("New features including Expo Router v7".to_string()),
            thumbnail_url: None,
            formatted_date: "January 15, 2025".to_string(),
        },
        Post {
            id: "2".to_string(),
            title: "Expo Router Updates".to_string(),
            link: "https://expo.dev/changelog".to_string(),
            published_raw: "2025-01-10".to_string(),
            description: Some("Stack Toolbar and more".to_string()),
            thumbnail_url: None,
            formatted_date: "January 10, 2025".to_string(),
        },
    ]
}

/// Renders `entry` as text lines no wider than `width` columns.
///
/// Post fields come from the feed and are stripped of control characters
/// before they reach the output.
pub fn render(entry: &WidgetEntry, family: WidgetFamily, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    match family {
        WidgetFamily::Small => match entry.posts.first() {
            Some(latest) => {
                out.push(truncate_to_width(BRAND, width).into_owned());
                out.extend(wrap_lines(&latest.title, width, 3));
                out.push(feed_line(&latest.formatted_date, width));
            }
            None => out.push(truncate_to_width(EMPTY_STATE, width).into_owned()),
        },
        WidgetFamily::Medium => {
            out.push(truncate_to_width(HEADER, width).into_owned());
            if let Some(latest) = entry.posts.first() {
                push_post(&mut out, latest, width);
            }
        }
        WidgetFamily::Large => {
            out.push(truncate_to_width(HEADER, width).into_owned());
            let shown = entry.posts.iter().take(LARGE_POST_COUNT);
            for (idx, post) in shown.enumerate() {
                if idx > 0 {
                    out.push("-".repeat(width));
                }
                push_post(&mut out, post, width);
            }
        }
    }
    out
}

fn push_post(out: &mut Vec<String>, post: &Post, width: usize) {
    out.extend(wrap_lines(&post.title, width, 2));
    if let Some(description) = &post.description {
        out.extend(wrap_lines(description, width, 2));
    }
    out.push(feed_line(&post.formatted_date, width));
}

/// One line of feed text, cut to `width`.
fn feed_line(text: &str, width: usize) -> String {
    let clean = strip_control_chars(text);
    let single: String = clean.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_to_width(&single, width).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{FeedFetcher, FeedParser, FetchStrategy, ParserKind, TreeParser};
    use pretty_assertions::assert_eq;
    use url::Url;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn rss_with_items(n: usize) -> String {
        let mut xml = String::from("<rss><channel><title>Changelog</title>");
        for i in 0..n {
            xml.push_str(&format!(
                "<item><title>Post {i}</title><link>https://x/{i}</link>\
                 <pubDate>Wed, 15 Jan 2025 10:00:00 GMT</pubDate></item>"
            ));
        }
        xml.push_str("</channel></rss>");
        xml
    }

    async fn provider_for(response: ResponseTemplate) -> (MockServer, WidgetProvider) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(response)
            .mount(&server)
            .await;
        let url = Url::parse(&format!("{}/rss.xml", server.uri())).unwrap();
        let fetcher = FeedFetcher::new(reqwest::Client::new(), url, FetchStrategy::Direct);
        let service = FeedService::new(fetcher, ParserKind::Events.build());
        (server, WidgetProvider::new(service))
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-15T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[tokio::test]
    async fn test_posts_capped_at_ten() {
        let (_server, provider) =
            provider_for(ResponseTemplate::new(200).set_body_string(rss_with_items(50))).await;

        let posts = provider.fetch_posts().await;
        assert_eq!(posts.len(), 10);
        assert_eq!(posts[0].title, "Post 0");
        assert_eq!(posts[9].title, "Post 9");
    }

    #[tokio::test]
    async fn test_http_500_yields_empty_list() {
        let (_server, provider) = provider_for(ResponseTemplate::new(500)).await;
        assert!(provider.fetch_posts().await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_xml_yields_empty_list() {
        let (_server, provider) =
            provider_for(ResponseTemplate::new(200).set_body_string("<rss><channel>")).await;
        assert!(provider.fetch_posts().await.is_empty());
    }

    #[tokio::test]
    async fn test_timeline_schedules_next_refresh() {
        let (_server, provider) =
            provider_for(ResponseTemplate::new(200).set_body_string(rss_with_items(2))).await;

        let timeline = provider.timeline(now()).await;
        assert_eq!(timeline.entries.len(), 1);
        assert_eq!(timeline.entries[0].posts.len(), 2);
        assert_eq!(timeline.next_refresh, now() + TimeDelta::hours(1));
    }

    #[tokio::test]
    async fn test_preview_snapshot_skips_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let url = Url::parse(&format!("{}/rss.xml", server.uri())).unwrap();
        let fetcher = FeedFetcher::new(reqwest::Client::new(), url, FetchStrategy::Direct);
        let provider = WidgetProvider::new(FeedService::new(fetcher, ParserKind::Events.build()));

        let entry = provider.snapshot(now(), true).await;
        assert_eq!(entry.posts, sample_posts());
        assert!(provider.placeholder(now()).posts.is_empty());
    }

    #[test]
    fn test_render_small_empty_state() {
        let entry = WidgetEntry {
            date: now(),
            posts: Vec::new(),
        };
        assert_eq!(render(&entry, WidgetFamily::Small, 20), vec!["No posts"]);
    }

    #[test]
    fn test_render_small_latest() {
        let entry = WidgetEntry {
            date: now(),
            posts: sample_posts(),
        };
        assert_eq!(
            render(&entry, WidgetFamily::Small, 20),
            vec!["Expo", "Expo SDK 55 Beta", "Released", "January 15, 2025"]
        );
    }

    #[test]
    fn test_render_large_dividers_between_posts() {
        let entry = WidgetEntry {
            date: now(),
            posts: sample_posts(),
        };
        let lines = render(&entry, WidgetFamily::Large, 40);
        assert_eq!(lines[0], "Expo Changelog");
        assert_eq!(lines.iter().filter(|l| l.starts_with("---")).count(), 1);
        assert_eq!(lines.last().map(String::as_str), Some("January 10, 2025"));
    }

    #[test]
    fn test_render_strips_escape_sequences_from_feed_text() {
        let xml = "<rss><channel><item><title>T\x1b]0;pwned\x07</title>\
                   <description>Body\x1b[31m red</description>\
                   <pubDate>\x1b[2Jboom</pubDate><guid>g</guid></item></channel></rss>";
        let feed = TreeParser.parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(feed.posts[0].formatted_date, "\x1b[2Jboom");

        let entry = WidgetEntry {
            date: now(),
            posts: feed.posts,
        };
        assert_eq!(
            render(&entry, WidgetFamily::Small, 40),
            vec!["Expo", "T", "boom"]
        );
        let medium = render(&entry, WidgetFamily::Medium, 40);
        assert_eq!(medium, vec!["Expo Changelog", "T", "Body red", "boom"]);
        for family in [WidgetFamily::Small, WidgetFamily::Medium, WidgetFamily::Large] {
            for line in render(&entry, family, 40) {
                assert!(!line.chars().any(char::is_control), "{line:?} has controls");
            }
        }
    }

    #[test]
    fn test_render_respects_width() {
        let entry = WidgetEntry {
            date: now(),
            posts: sample_posts(),
        };
        for family in [WidgetFamily::Small, WidgetFamily::Medium, WidgetFamily::Large] {
            for line in render(&entry, family, 12) {
                assert!(crate::util::display_width(&line) <= 12, "{line:?} too wide");
            }
        }
    }
}
