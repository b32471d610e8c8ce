//! Wire DTOs for the feed backend
//!
//! Field names follow the REST contract (camelCase on the wire). Counters and
//! flags default to zero/false so partial server payloads still decode; the
//! mapper is responsible for turning these into domain entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Paginated post listing: GET /posts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPageDto {
    pub data: Vec<PostDto>,
    #[serde(default)]
    pub total: i64,
    pub page: i32,
    #[serde(default)]
    pub limit: i32,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDto {
    pub id: String,
    #[serde(default)]
    pub post_type: Option<String>,
    #[serde(default)]
    pub author: Option<AuthorDto>,
    #[serde(default)]
    pub user: Option<AuthorDto>,
    #[serde(default)]
    pub quote: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub media: Vec<MediaDto>,
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub comment_count: i64,
    #[serde(default)]
    pub share_count: i64,
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub is_bookmarked: bool,
    #[serde(default)]
    pub comments: Option<Vec<CommentDto>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorDto {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDto {
    pub id: String,
    #[serde(default)]
    pub media_type: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDto {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    pub user_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub reply_to_id: Option<String>,
    #[serde(default)]
    pub reply_to_user_name: Option<String>,
}

/// Paginated comment listing: GET /posts/{id}/comments
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPageDto {
    pub data: Vec<CommentDto>,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub has_more: bool,
}

/// Response to POST / DELETE /posts/{id}/like and /comments/{id}/like
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponseDto {
    pub success: bool,
    pub like_count: i64,
    pub is_liked: bool,
}

/// Response to POST /posts/{id}/share
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareResponseDto {
    pub success: bool,
    /// Authoritative counter when the server returns one
    #[serde(default)]
    pub share_count: Option<i64>,
}

/// Bare acknowledgement body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AckDto {
    pub success: bool,
}

/// Body of POST /posts/{id}/comments
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentBody {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

/// Body of POST /posts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_ids: Option<Vec<String>>,
}

/// Body of POST /posts/{id}/report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportBody {
    pub reason: String,
}
