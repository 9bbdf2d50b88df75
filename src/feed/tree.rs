//! Tree adapter: XML → generic object tree → [`Feed`].
//!
//! The tree mirrors what a generic XML-to-object converter yields, which is
//! why the normalizer has to cope with a single `item` arriving as a bare
//! object instead of a one-element array.

use serde_json::{Map, Value};

use crate::feed::model::{Feed, ItemFields, Post};
use crate::feed::parser::{FeedParser, ParseError};
use crate::feed::xml::{self, XmlSink};

/// Key holding an element's text when it also has attributes or children.
pub const TEXT_KEY: &str = "#text";
/// Prefix for attribute keys (`@_url`).
pub const ATTR_PREFIX: &str = "@_";

const THUMBNAIL_ELEMENT: &str = "media:thumbnail";
const THUMBNAIL_URL_KEY: &str = "@_url";

/// Materializes the whole document, then normalizes it.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeParser;

impl FeedParser for TreeParser {
    fn parse_feed(&self, bytes: &[u8]) -> Result<Feed, ParseError> {
        let root = build_tree(bytes)?;
        normalize(&root)
    }
}

/// Parses `bytes` into a generic tree.
///
/// - Leaf elements without attributes become strings (`<a/>` → `""`)
/// - Other elements become objects: attributes under `@_name`, text under
///   `#text`, children under their qualified names
/// - Repeated sibling names collapse into an array in document order
pub fn build_tree(bytes: &[u8]) -> Result<Value, ParseError> {
    let mut builder = TreeBuilder::default();
    xml::drive(bytes, &mut builder)?;
    Ok(Value::Object(builder.root))
}

struct Frame {
    name: String,
    fields: Map<String, Value>,
    has_fields: bool,
    text: String,
}

#[derive(Default)]
struct TreeBuilder {
    root: Map<String, Value>,
    stack: Vec<Frame>,
}

impl TreeBuilder {
    fn attach(&mut self, name: String, value: Value) {
        let parent = match self.stack.last_mut() {
            Some(frame) => {
                frame.has_fields = true;
                &mut frame.fields
            }
            None => &mut self.root,
        };
        match parent.get_mut(&name) {
            Some(Value::Array(existing)) => existing.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                parent.insert(name, value);
            }
        }
    }
}

impl XmlSink for TreeBuilder {
    fn open(&mut self, name: &str, attrs: &[(String, String)]) {
        let mut fields = Map::new();
        for (key, value) in attrs {
            fields.insert(format!("{ATTR_PREFIX}{key}"), Value::String(value.clone()));
        }
        self.stack.push(Frame {
            name: name.to_string(),
            has_fields: !fields.is_empty(),
            fields,
            text: String::new(),
        });
    }

    fn text(&mut self, chunk: &str) {
        if let Some(frame) = self.stack.last_mut() {
            frame.text.push_str(chunk);
        }
    }

    fn close(&mut self, _name: &str) {
        // End-name mismatches are rejected by the reader before we get here
        let Some(frame) = self.stack.pop() else {
            return;
        };
        let value = if frame.has_fields {
            let mut fields = frame.fields;
            if !frame.text.is_empty() {
                fields.insert(TEXT_KEY.to_string(), Value::String(frame.text));
            }
            Value::Object(fields)
        } else {
            Value::String(frame.text)
        };
        self.attach(frame.name, value);
    }
}

/// Normalizes a tree built by [`build_tree`] into a [`Feed`].
///
/// # Errors
///
/// [`ParseError::MissingChannel`] if there is no `rss > channel`. A channel
/// without items is valid and yields no posts.
pub fn normalize(root: &Value) -> Result<Feed, ParseError> {
    let channel = root
        .get("rss")
        .map(first)
        .and_then(|rss| rss.get("channel"))
        .map(first)
        .ok_or(ParseError::MissingChannel)?;

    let posts = as_list(channel.get("item"))
        .into_iter()
        .map(|item| Post::from_fields(item_fields(item)))
        .collect();

    Ok(Feed {
        title: text_of(channel.get("title")),
        description: text_of(channel.get("description")),
        posts,
    })
}

/// A missing node is an empty list; a bare node is a one-element list.
fn as_list(node: Option<&Value>) -> Vec<&Value> {
    match node {
        None => Vec::new(),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(single) => vec![single],
    }
}

fn first(node: &Value) -> &Value {
    match node {
        Value::Array(items) => items.first().unwrap_or(node),
        other => other,
    }
}

fn item_fields(item: &Value) -> ItemFields {
    let thumbnail_url = as_list(item.get(THUMBNAIL_ELEMENT))
        .into_iter()
        .find_map(|t| t.get(THUMBNAIL_URL_KEY))
        .and_then(Value::as_str)
        .map(str::to_string);

    ItemFields {
        title: text_of(item.get("title")),
        link: text_of(item.get("link")),
        pub_date: text_of(item.get("pubDate")),
        guid: text_of(item.get("guid")),
        description: item.get("description").map(|d| text_of(Some(d))),
        thumbnail_url,
    }
}

/// Text content of a node. Plain strings are used as-is, objects contribute
/// their `#text`, and repeated elements concatenate.
fn text_of(node: Option<&Value>) -> String {
    match node {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Object(fields)) => fields
            .get(TEXT_KEY)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Some(Value::Array(items)) => items.iter().map(|v| text_of(Some(v))).collect(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_tree_shape() {
        let xml = br#"<rss version="2.0"><channel>
            <title>Changelog</title>
            <item><guid isPermaLink="false">abc</guid><empty/></item>
            <item><media:thumbnail url="https://img/1.png"/></item>
        </channel></rss>"#;
        let tree = build_tree(xml).unwrap();
        assert_eq!(
            tree,
            json!({
                "rss": {
                    "@_version": "2.0",
                    "channel": {
                        "title": "Changelog",
                        "item": [
                            {
                                "guid": { "@_isPermaLink": "false", "#text": "abc" },
                                "empty": ""
                            },
                            { "media:thumbnail": { "@_url": "https://img/1.png" } }
                        ]
                    }
                }
            })
        );
    }

    #[test]
    fn test_single_item_stays_bare_object() {
        let tree = build_tree(b"<rss><channel><item><title>Only</title></item></channel></rss>")
            .unwrap();
        assert!(tree["rss"]["channel"]["item"].is_object());
    }

    #[test]
    fn test_single_item_normalized_to_one_post() {
        let feed = TreeParser
            .parse_feed(b"<rss><channel><item><title>Only</title><link>https://x/only</link></item></channel></rss>")
            .unwrap();
        assert_eq!(feed.posts.len(), 1);
        assert_eq!(feed.posts[0].title, "Only");
        assert_eq!(feed.posts[0].id, "https://x/only");
    }

    #[test]
    fn test_guid_text_unwrapped_from_attributes() {
        let item = json!({ "guid": { "@_isPermaLink": "true", "#text": "https://x/g" } });
        assert_eq!(item_fields(&item).guid, "https://x/g");

        let item = json!({ "guid": "plain" });
        assert_eq!(item_fields(&item).guid, "plain");
    }

    #[test]
    fn test_description_presence_tracks_element() {
        let absent = item_fields(&json!({ "title": "t" }));
        assert_eq!(absent.description, None);

        let empty = item_fields(&json!({ "description": "" }));
        assert_eq!(empty.description.as_deref(), Some(""));
    }

    #[test]
    fn test_thumbnail_without_url_is_absent() {
        let fields = item_fields(&json!({ "media:thumbnail": { "@_width": "10" } }));
        assert_eq!(fields.thumbnail_url, None);

        let fields = item_fields(&json!({ "media:thumbnail": "" }));
        assert_eq!(fields.thumbnail_url, None);
    }

    #[test]
    fn test_missing_channel() {
        let err = TreeParser.parse_feed(b"<rss version=\"2.0\"></rss>").unwrap_err();
        assert!(matches!(err, ParseError::MissingChannel));

        let err = TreeParser.parse_feed(b"<feed><entry/></feed>").unwrap_err();
        assert!(matches!(err, ParseError::MissingChannel));

        let err = TreeParser.parse_feed(b"").unwrap_err();
        assert!(matches!(err, ParseError::MissingChannel));
    }

    #[test]
    fn test_channel_without_items() {
        let feed = TreeParser
            .parse_feed(b"<rss><channel><title>T</title><description>D</description></channel></rss>")
            .unwrap();
        assert_eq!(feed.title, "T");
        assert_eq!(feed.description, "D");
        assert!(feed.posts.is_empty());
    }

    #[test]
    fn test_malformed_xml() {
        let err = TreeParser.parse_feed(b"<not valid xml").unwrap_err();
        assert!(matches!(
            err,
            ParseError::Xml(_) | ParseError::UnexpectedEof(_) | ParseError::MissingChannel
        ));
    }
}
