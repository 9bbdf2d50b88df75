use serde::Serialize;

use crate::feed::date::format_pub_date;

/// One normalized changelog entry.
///
/// Immutable once built: both parser adapters construct posts exclusively
/// through [`Post::from_fields`], which applies the id fallback, the
/// optional-field presence rules and date formatting in one place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// GUID text, or the link when the GUID is absent or empty.
    pub id: String,
    pub title: String,
    pub link: String,
    /// Date string exactly as the feed provided it.
    #[serde(rename = "pubDate")]
    pub published_raw: String,
    /// `None` only when the item has no `<description>` element at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `url` attribute of the item's `media:thumbnail` element.
    #[serde(rename = "thumbnail", skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// Long-form date ("January 15, 2025"), or `published_raw` if unparseable.
    pub formatted_date: String,
}

/// Raw per-item values gathered by a parser adapter before normalization.
///
/// `description` and `thumbnail_url` track element/attribute existence:
/// `Some("")` means the element was present with empty text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFields {
    pub title: String,
    pub link: String,
    pub pub_date: String,
    pub guid: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
}

impl Post {
    pub fn from_fields(fields: ItemFields) -> Self {
        let ItemFields {
            title,
            link,
            pub_date,
            guid,
            description,
            thumbnail_url,
        } = fields;

        let id = if guid.is_empty() { link.clone() } else { guid };
        let formatted_date = format_pub_date(&pub_date);

        Self {
            id,
            title,
            link,
            published_raw: pub_date,
            description,
            thumbnail_url,
            formatted_date,
        }
    }

    /// Case-insensitive substring match against title or description.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle))
    }
}

/// A parsed RSS channel: metadata plus posts in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Feed {
    pub title: String,
    pub description: String,
    pub posts: Vec<Post>,
}

impl Feed {
    /// Posts matching `query`, in feed order. An empty query matches everything.
    pub fn search(&self, query: &str) -> Vec<&Post> {
        filter_posts(&self.posts, query)
    }

    pub fn find(&self, id: &str) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == id)
    }
}

/// Shared by [`Feed::search`] and the store snapshot.
pub fn filter_posts<'a>(posts: &'a [Post], query: &str) -> Vec<&'a Post> {
    let query = query.trim();
    if query.is_empty() {
        return posts.iter().collect();
    }
    posts.iter().filter(|p| p.matches(query)).collect()
}
