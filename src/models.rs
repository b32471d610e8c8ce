//! Domain entities owned by the feed store
//!
//! Entities are created by the response mapper from wire DTOs, or synthesized
//! locally with client-generated ids for optimistic creation. The store owns
//! them exclusively; observers only ever receive cloned snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Post author or user reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub name: String,
    pub avatar_url: Option<String>,
}

/// Media attachment kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

/// Media attachment on a user post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: String,
    pub kind: MediaKind,
    pub url: String,
}

/// Variant-specific post payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PostBody {
    /// Editorial quote attributed to an author
    Author { author: Author, quote: String },
    /// User-generated post with optional media
    User {
        user: Author,
        content: String,
        media: Vec<MediaItem>,
    },
}

/// A post in the feed with its nested comments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    #[serde(flatten)]
    pub body: PostBody,
    pub like_count: i64,
    pub comment_count: i64,
    pub share_count: i64,
    pub is_liked: bool,
    pub is_bookmarked: bool,
    /// Derived: true iff `comments` contains a comment by the viewer.
    /// Recomputed whenever comments change, never trusted from the wire.
    pub has_viewer_comment: bool,
    /// Newest first. May be absent or partial until comments are loaded.
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Id of the account behind this post, regardless of variant
    pub fn author_id(&self) -> &str {
        match &self.body {
            PostBody::Author { author, .. } => &author.id,
            PostBody::User { user, .. } => &user.id,
        }
    }

    /// Recompute the derived viewer-comment flag from the comment list
    pub fn recompute_viewer_comment(&mut self, viewer_id: &str) {
        self.has_viewer_comment = self.comments.iter().any(|c| c.user_id == viewer_id);
    }

    pub fn find_comment_mut(&mut self, comment_id: &str) -> Option<&mut Comment> {
        self.comments.iter_mut().find(|c| c.id == comment_id)
    }
}

/// A comment on a post, optionally replying to another comment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    pub user_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub like_count: i64,
    pub is_liked: bool,
    pub reply_to_id: Option<String>,
    pub reply_to_user_name: Option<String>,
}

/// One mapped page of the feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedPage {
    pub posts: Vec<Post>,
    pub total: i64,
    pub page: i32,
    pub has_more: bool,
}

/// Load-state machine of the feed store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    Idle,
    LoadingFirstPage,
    LoadingNextPage,
    Refreshing,
    Error,
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(
            self,
            Self::LoadingFirstPage | Self::LoadingNextPage | Self::Refreshing
        )
    }
}

/// Where the currently displayed list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Network,
    Cache,
}

/// Immutable state snapshot published to observers
#[derive(Debug, Clone, Serialize)]
pub struct FeedSnapshot {
    pub posts: Vec<Post>,
    pub state: LoadState,
    pub data_source: Option<DataSource>,
    /// Timestamp of the data currently displayed: cache entry time for cached
    /// pages, response time for network pages
    pub last_sync: Option<DateTime<Utc>>,
    pub has_more: bool,
    /// Failure reason retained for display while in the error state
    pub last_error: Option<String>,
}
