//! External collaborator seams
//!
//! The engine depends on three interfaces: a keyed cache of raw feed pages,
//! the REST backend, and durable moderation storage. Concrete
//! implementations live in the submodules; tests inject in-memory fakes.

pub mod http;
pub mod redis;

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dto::{
    CommentDto, CommentPageDto, CreateCommentBody, CreatePostBody, FeedPageDto, LikeResponseDto,
    PostDto, ShareResponseDto,
};
use crate::error::EngineResult;

/// A previously-seen raw server page with the time it was stored. TTL and
/// eviction belong to the gateway; the store only reads `timestamp` to
/// report staleness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub payload: FeedPageDto,
    pub timestamp: DateTime<Utc>,
}

/// Keyed get/set of raw feed pages
#[async_trait]
pub trait CacheGateway: Send + Sync {
    async fn get(&self, key: &str) -> EngineResult<Option<CacheEntry>>;
    async fn set(&self, key: &str, payload: &FeedPageDto, ttl: Duration) -> EngineResult<()>;
}

/// REST surface of the feed backend
#[async_trait]
pub trait NetworkGateway: Send + Sync {
    /// GET /posts?page&limit
    async fn list_posts(&self, page: i32, limit: i32) -> EngineResult<FeedPageDto>;

    /// POST /posts/{id}/like
    async fn like_post(&self, post_id: &str) -> EngineResult<LikeResponseDto>;
    /// DELETE /posts/{id}/like
    async fn unlike_post(&self, post_id: &str) -> EngineResult<LikeResponseDto>;

    /// GET /posts/{id}/comments?page&limit
    async fn list_comments(
        &self,
        post_id: &str,
        page: i32,
        limit: i32,
    ) -> EngineResult<CommentPageDto>;
    /// POST /posts/{id}/comments
    async fn add_comment(
        &self,
        post_id: &str,
        body: &CreateCommentBody,
    ) -> EngineResult<CommentDto>;
    /// DELETE /comments/{id}
    async fn delete_comment(&self, comment_id: &str) -> EngineResult<()>;
    /// POST /comments/{id}/like
    async fn like_comment(&self, comment_id: &str) -> EngineResult<LikeResponseDto>;
    /// DELETE /comments/{id}/like
    async fn unlike_comment(&self, comment_id: &str) -> EngineResult<LikeResponseDto>;

    /// POST /posts/{id}/share
    async fn share_post(&self, post_id: &str) -> EngineResult<ShareResponseDto>;
    /// POST /posts/{id}/bookmark
    async fn bookmark_post(&self, post_id: &str) -> EngineResult<()>;
    /// DELETE /posts/{id}/bookmark
    async fn unbookmark_post(&self, post_id: &str) -> EngineResult<()>;

    /// POST /posts/{id}/hide
    async fn hide_post(&self, post_id: &str) -> EngineResult<()>;
    /// POST /authors/{id}/block
    async fn block_author(&self, author_id: &str) -> EngineResult<()>;
    /// DELETE /authors/{id}/block
    async fn unblock_author(&self, author_id: &str) -> EngineResult<()>;
    /// POST /posts/{id}/report
    async fn report_post(&self, post_id: &str, reason: &str) -> EngineResult<()>;

    /// POST /posts
    async fn create_post(&self, body: &CreatePostBody) -> EngineResult<PostDto>;
}

/// Durable moderation storage: JSON-encoded string sets, loaded at startup
/// and overwritten wholesale on every moderation mutation
#[async_trait]
pub trait ModerationStore: Send + Sync {
    async fn load(&self, key: &str) -> EngineResult<Option<HashSet<String>>>;
    async fn save(&self, key: &str, ids: &HashSet<String>) -> EngineResult<()>;
}
