//! Event adapter: normalizes posts straight from the XML event stream,
//! without materializing a tree. Used by the widget host.

use crate::feed::model::{Feed, ItemFields, Post};
use crate::feed::parser::{FeedParser, ParseError};
use crate::feed::xml::{self, XmlSink};

const THUMBNAIL_ELEMENT: &str = "media:thumbnail";

/// Streaming counterpart of [`TreeParser`](crate::feed::tree::TreeParser).
#[derive(Debug, Clone, Copy, Default)]
pub struct EventParser;

impl FeedParser for EventParser {
    fn parse_feed(&self, bytes: &[u8]) -> Result<Feed, ParseError> {
        let mut normalizer = EventNormalizer::default();
        xml::drive(bytes, &mut normalizer)?;
        normalizer.finish()
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
enum ChannelState {
    #[default]
    NotSeen,
    Open,
    /// Only the first channel contributes posts.
    Done,
}

/// Accumulates one item at a time.
///
/// Element paths are fixed: `rss > channel > item > field`. Text belongs to
/// a field only while that field is the innermost open element, so text of
/// nested markup (`<title>a<b>x</b></title>`) is skipped, matching the tree
/// adapter's `#text` rule.
#[derive(Default)]
struct EventNormalizer {
    stack: Vec<String>,
    channel: ChannelState,
    title: String,
    description: String,
    current: Option<ItemFields>,
    posts: Vec<Post>,
}

impl EventNormalizer {
    fn finish(self) -> Result<Feed, ParseError> {
        if self.channel == ChannelState::NotSeen {
            return Err(ParseError::MissingChannel);
        }
        Ok(Feed {
            title: self.title,
            description: self.description,
            posts: self.posts,
        })
    }

    fn in_channel(&self) -> bool {
        self.channel == ChannelState::Open && self.stack.len() == 2
    }

    fn in_item(&self) -> bool {
        self.current.is_some() && self.stack.len() == 3
    }
}

impl XmlSink for EventNormalizer {
    fn open(&mut self, name: &str, attrs: &[(String, String)]) {
        if name == "channel"
            && self.channel == ChannelState::NotSeen
            && self.stack.len() == 1
            && self.stack[0] == "rss"
        {
            self.channel = ChannelState::Open;
        } else if name == "item" && self.in_channel() {
            // Reset: every field starts out empty/absent
            self.current = Some(ItemFields::default());
        } else if self.in_item() {
            if let Some(item) = self.current.as_mut() {
                match name {
                    "description" => {
                        item.description.get_or_insert_with(String::new);
                    }
                    THUMBNAIL_ELEMENT if item.thumbnail_url.is_none() => {
                        // Attributes arrive with the open event, never as text
                        item.thumbnail_url = attrs
                            .iter()
                            .find(|(key, _)| key == "url")
                            .map(|(_, value)| value.clone());
                    }
                    _ => {}
                }
            }
        }
        self.stack.push(name.to_string());
    }

    fn text(&mut self, chunk: &str) {
        let depth = self.stack.len();
        let Some(top) = self.stack.last() else {
            return;
        };

        if let Some(item) = self.current.as_mut() {
            if depth != 4 {
                return;
            }
            // Chunks of one element concatenate; parsers may split text
            match top.as_str() {
                "title" => item.title.push_str(chunk),
                "link" => item.link.push_str(chunk),
                "pubDate" => item.pub_date.push_str(chunk),
                "guid" => item.guid.push_str(chunk),
                "description" => item
                    .description
                    .get_or_insert_with(String::new)
                    .push_str(chunk),
                _ => {}
            }
        } else if self.channel == ChannelState::Open && depth == 3 {
            match top.as_str() {
                "title" => self.title.push_str(chunk),
                "description" => self.description.push_str(chunk),
                _ => {}
            }
        }
    }

    fn close(&mut self, name: &str) {
        self.stack.pop();
        let depth = self.stack.len();

        if name == "item" && depth == 2 {
            if let Some(fields) = self.current.take() {
                self.posts.push(Post::from_fields(fields));
            }
        } else if name == "channel" && depth == 1 && self.channel == ChannelState::Open {
            self.channel = ChannelState::Done;
        }
    }
}
