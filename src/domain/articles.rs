//! Article records and the display projection served by listings.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Kind of media attached to an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Image,
    Video,
    Audio,
}

/// A media attachment on an article. Video and audio resources may carry a
/// subtitle track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleResource {
    pub kind: ResourceKind,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle_url: Option<String>,
}

/// Full persisted article row.
///
/// `deleted` is a soft-delete flag: deleted rows stay in the table but are
/// excluded from every listing and count. `updated_at` is the listing sort
/// key and is touched by every write, so any mutation reorders the listing.
#[derive(Debug, Clone)]
pub struct ArticleRecord {
    pub id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub author_avatar: String,
    pub title: String,
    pub description: String,
    pub cover_url: String,
    pub resources: Vec<ArticleResource>,
    pub views: i64,
    pub favorites: i64,
    pub deleted: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Display projection of an article as it appears in a listing page.
///
/// This is the shape that gets serialized into the page cache, so adding or
/// renaming fields changes what stale cached pages deserialize into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleCard {
    pub id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub author_avatar: String,
    pub title: String,
    pub description: String,
    pub cover_url: String,
    pub resources: Vec<ArticleResource>,
    pub views: i64,
    pub favorites: i64,
}

impl From<ArticleRecord> for ArticleCard {
    fn from(record: ArticleRecord) -> Self {
        Self {
            id: record.id,
            author_id: record.author_id,
            author_name: record.author_name,
            author_avatar: record.author_avatar,
            title: record.title,
            description: record.description,
            cover_url: record.cover_url,
            resources: record.resources,
            views: record.views,
            favorites: record.favorites,
        }
    }
}
