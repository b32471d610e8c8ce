//! Optimistic mutation protocol
//!
//! Every user mutation follows the same shape: locate the target, snapshot
//! exactly the fields about to change, apply the new values synchronously so
//! observers see them before the network call starts, dispatch, then either
//! keep the optimistic state (server counters win when present) or restore
//! the snapshot verbatim. Failures on like/comment/share are recovered
//! locally and logged; the caller only sees an error for validation and for
//! targets missing from the local model.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::dto::{CreateCommentBody, CreatePostBody};
use crate::error::{EngineError, EngineResult};
use crate::gateway::NetworkGateway;
use crate::models::{Author, Comment, MediaItem, Post, PostBody};
use crate::store::{FeedStore, MutationKey, MutationKind};

/// Snapshot of a removed comment, sufficient to reinsert it on rollback
struct DeletedComment {
    comment: Comment,
    index: usize,
    comment_count: i64,
}

pub struct OptimisticMutationCoordinator {
    store: Arc<FeedStore>,
    network: Arc<dyn NetworkGateway>,
    config: EngineConfig,
}

impl OptimisticMutationCoordinator {
    pub fn new(
        store: Arc<FeedStore>,
        network: Arc<dyn NetworkGateway>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            network,
            config,
        }
    }

    // ============= Post likes =============

    pub async fn like_post(&self, post_id: &str) -> EngineResult<()> {
        let key = MutationKey {
            entity_id: post_id.to_string(),
            kind: MutationKind::Like,
        };
        if !self.store.begin_mutation(key.clone()).await {
            debug!(post_id, "like already in flight, ignoring");
            return Ok(());
        }
        let result = self.set_post_like(post_id, true).await;
        self.store.end_mutation(&key).await;
        result
    }

    pub async fn unlike_post(&self, post_id: &str) -> EngineResult<()> {
        let key = MutationKey {
            entity_id: post_id.to_string(),
            kind: MutationKind::Like,
        };
        if !self.store.begin_mutation(key.clone()).await {
            debug!(post_id, "unlike already in flight, ignoring");
            return Ok(());
        }
        let result = self.set_post_like(post_id, false).await;
        self.store.end_mutation(&key).await;
        result
    }

    async fn set_post_like(&self, post_id: &str, liked: bool) -> EngineResult<()> {
        let snapshot = self
            .store
            .with_post(post_id, |post| {
                let snap = (post.is_liked, post.like_count);
                if post.is_liked != liked {
                    post.is_liked = liked;
                    post.like_count = if liked {
                        post.like_count + 1
                    } else {
                        (post.like_count - 1).max(0)
                    };
                }
                snap
            })
            .await?;

        if snapshot.0 == liked {
            // Already in the requested state; nothing dispatched.
            return Ok(());
        }

        let response = if liked {
            self.network.like_post(post_id).await
        } else {
            self.network.unlike_post(post_id).await
        };

        match response {
            Ok(resp) => {
                // Server counters are authoritative over the optimistic guess.
                let _ = self
                    .store
                    .with_post(post_id, |post| {
                        post.like_count = resp.like_count.max(0);
                        post.is_liked = resp.is_liked;
                    })
                    .await;
                Ok(())
            }
            Err(e) => {
                warn!(post_id, liked, error = %e, "like failed, rolling back");
                let _ = self
                    .store
                    .with_post(post_id, |post| {
                        post.is_liked = snapshot.0;
                        post.like_count = snapshot.1;
                    })
                    .await;
                Ok(())
            }
        }
    }

    // ============= Comments =============

    /// Add a comment by the viewer, optionally replying to another comment.
    /// The optimistic entity keeps its client-generated id even after the
    /// server confirms, so the UI never sees an id swap.
    pub async fn add_comment(
        &self,
        post_id: &str,
        content: &str,
        reply_to: Option<&Comment>,
    ) -> EngineResult<()> {
        let content = content.trim();
        if content.is_empty() {
            return Err(EngineError::Validation("comment content is empty".into()));
        }
        if content.chars().count() > self.config.max_comment_length {
            return Err(EngineError::Validation(format!(
                "comment exceeds {} characters",
                self.config.max_comment_length
            )));
        }

        let key = MutationKey {
            entity_id: post_id.to_string(),
            kind: MutationKind::AddComment,
        };
        if !self.store.begin_mutation(key.clone()).await {
            debug!(post_id, "comment add already in flight, ignoring");
            return Ok(());
        }

        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            post_id: post_id.to_string(),
            user_id: self.config.viewer_id.clone(),
            user_name: self.config.viewer_name.clone(),
            content: content.to_string(),
            created_at: Utc::now(),
            like_count: 0,
            is_liked: false,
            reply_to_id: reply_to.map(|c| c.id.clone()),
            reply_to_user_name: reply_to.map(|c| c.user_name.clone()),
        };

        let result = self.add_comment_inner(post_id, comment).await;
        self.store.end_mutation(&key).await;
        result
    }

    async fn add_comment_inner(&self, post_id: &str, comment: Comment) -> EngineResult<()> {
        let snapshot = {
            let comment = comment.clone();
            self.store
                .with_post(post_id, move |post| {
                    let snap = (post.comment_count, post.has_viewer_comment);
                    // Optimistic insertion always goes to index 0.
                    post.comments.insert(0, comment);
                    post.comment_count += 1;
                    post.has_viewer_comment = true;
                    snap
                })
                .await?
        };

        let body = CreateCommentBody {
            content: comment.content.clone(),
            reply_to: comment.reply_to_id.clone(),
        };

        match self.network.add_comment(post_id, &body).await {
            // The server echo is intentionally discarded: the client copy is
            // already final. Known gap: a server-side rewrite (different id,
            // moderated content) leaves the stale client copy in place.
            Ok(_) => Ok(()),
            Err(e) => {
                warn!(post_id, error = %e, "comment add failed, rolling back");
                let _ = self
                    .store
                    .with_post(post_id, |post| {
                        post.comments.retain(|c| c.id != comment.id);
                        post.comment_count = snapshot.0;
                        post.has_viewer_comment = snapshot.1;
                    })
                    .await;
                Ok(())
            }
        }
    }

    pub async fn delete_comment(&self, post_id: &str, comment_id: &str) -> EngineResult<()> {
        let key = MutationKey {
            entity_id: comment_id.to_string(),
            kind: MutationKind::DeleteComment,
        };
        if !self.store.begin_mutation(key.clone()).await {
            debug!(comment_id, "comment delete already in flight, ignoring");
            return Ok(());
        }
        let result = self.delete_comment_inner(post_id, comment_id).await;
        self.store.end_mutation(&key).await;
        result
    }

    async fn delete_comment_inner(&self, post_id: &str, comment_id: &str) -> EngineResult<()> {
        let viewer_id = self.config.viewer_id.clone();
        let snapshot = self
            .store
            .with_post(post_id, |post| {
                let index = post.comments.iter().position(|c| c.id == comment_id)?;
                let snap = DeletedComment {
                    comment: post.comments.remove(index),
                    index,
                    comment_count: post.comment_count,
                };
                post.comment_count = (post.comment_count - 1).max(0);
                post.recompute_viewer_comment(&viewer_id);
                Some(snap)
            })
            .await?;

        let Some(snapshot) = snapshot else {
            return Err(EngineError::NotFound(format!("comment {comment_id}")));
        };

        match self.network.delete_comment(comment_id).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(comment_id, error = %e, "comment delete failed, rolling back");
                let viewer_id = self.config.viewer_id.clone();
                let _ = self
                    .store
                    .with_post(post_id, move |post| {
                        let index = snapshot.index.min(post.comments.len());
                        post.comments.insert(index, snapshot.comment);
                        post.comment_count = snapshot.comment_count;
                        // Re-scan instead of reusing the pre-deletion flag:
                        // other comments may have changed while the call was
                        // in flight.
                        post.recompute_viewer_comment(&viewer_id);
                    })
                    .await;
                Ok(())
            }
        }
    }

    pub async fn like_comment(&self, comment_id: &str) -> EngineResult<()> {
        self.set_comment_like(comment_id, true).await
    }

    pub async fn unlike_comment(&self, comment_id: &str) -> EngineResult<()> {
        self.set_comment_like(comment_id, false).await
    }

    async fn set_comment_like(&self, comment_id: &str, liked: bool) -> EngineResult<()> {
        let key = MutationKey {
            entity_id: comment_id.to_string(),
            kind: MutationKind::LikeComment,
        };
        if !self.store.begin_mutation(key.clone()).await {
            debug!(comment_id, "comment like already in flight, ignoring");
            return Ok(());
        }
        let result = self.set_comment_like_inner(comment_id, liked).await;
        self.store.end_mutation(&key).await;
        result
    }

    async fn set_comment_like_inner(&self, comment_id: &str, liked: bool) -> EngineResult<()> {
        let snapshot = self
            .store
            .with_comment(comment_id, |comment| {
                let snap = (comment.is_liked, comment.like_count);
                if comment.is_liked != liked {
                    comment.is_liked = liked;
                    comment.like_count = if liked {
                        comment.like_count + 1
                    } else {
                        (comment.like_count - 1).max(0)
                    };
                }
                snap
            })
            .await?;

        if snapshot.0 == liked {
            return Ok(());
        }

        let response = if liked {
            self.network.like_comment(comment_id).await
        } else {
            self.network.unlike_comment(comment_id).await
        };

        match response {
            Ok(resp) => {
                let _ = self
                    .store
                    .with_comment(comment_id, |comment| {
                        comment.like_count = resp.like_count.max(0);
                        comment.is_liked = resp.is_liked;
                    })
                    .await;
                Ok(())
            }
            Err(e) => {
                warn!(comment_id, liked, error = %e, "comment like failed, rolling back");
                let _ = self
                    .store
                    .with_comment(comment_id, |comment| {
                        comment.is_liked = snapshot.0;
                        comment.like_count = snapshot.1;
                    })
                    .await;
                Ok(())
            }
        }
    }

    // ============= Shares and bookmarks =============

    pub async fn share_post(&self, post_id: &str) -> EngineResult<()> {
        let key = MutationKey {
            entity_id: post_id.to_string(),
            kind: MutationKind::Share,
        };
        if !self.store.begin_mutation(key.clone()).await {
            debug!(post_id, "share already in flight, ignoring");
            return Ok(());
        }
        let result = self.share_post_inner(post_id).await;
        self.store.end_mutation(&key).await;
        result
    }

    async fn share_post_inner(&self, post_id: &str) -> EngineResult<()> {
        let snapshot = self
            .store
            .with_post(post_id, |post| {
                let snap = post.share_count;
                post.share_count += 1;
                snap
            })
            .await?;

        match self.network.share_post(post_id).await {
            Ok(resp) => {
                if let Some(count) = resp.share_count {
                    let _ = self
                        .store
                        .with_post(post_id, |post| post.share_count = count.max(0))
                        .await;
                }
                Ok(())
            }
            Err(e) => {
                warn!(post_id, error = %e, "share failed, rolling back");
                let _ = self
                    .store
                    .with_post(post_id, |post| post.share_count = snapshot)
                    .await;
                Ok(())
            }
        }
    }

    pub async fn bookmark_post(&self, post_id: &str) -> EngineResult<()> {
        self.set_bookmark(post_id, true).await
    }

    pub async fn unbookmark_post(&self, post_id: &str) -> EngineResult<()> {
        self.set_bookmark(post_id, false).await
    }

    async fn set_bookmark(&self, post_id: &str, bookmarked: bool) -> EngineResult<()> {
        let key = MutationKey {
            entity_id: post_id.to_string(),
            kind: MutationKind::Bookmark,
        };
        if !self.store.begin_mutation(key.clone()).await {
            debug!(post_id, "bookmark change already in flight, ignoring");
            return Ok(());
        }
        let result = self.set_bookmark_inner(post_id, bookmarked).await;
        self.store.end_mutation(&key).await;
        result
    }

    async fn set_bookmark_inner(&self, post_id: &str, bookmarked: bool) -> EngineResult<()> {
        let snapshot = self
            .store
            .with_post(post_id, |post| {
                let snap = post.is_bookmarked;
                post.is_bookmarked = bookmarked;
                snap
            })
            .await?;

        if snapshot == bookmarked {
            return Ok(());
        }

        let response = if bookmarked {
            self.network.bookmark_post(post_id).await
        } else {
            self.network.unbookmark_post(post_id).await
        };

        if let Err(e) = response {
            warn!(post_id, bookmarked, error = %e, "bookmark change failed, rolling back");
            let _ = self
                .store
                .with_post(post_id, |post| post.is_bookmarked = snapshot)
                .await;
        }
        Ok(())
    }

    // ============= Post creation =============

    /// Compose a new post by the viewer. The optimistic entity carries a
    /// client-generated id that stays final after the server confirms.
    pub async fn create_post(&self, content: &str, media: Vec<MediaItem>) -> EngineResult<()> {
        let content = content.trim();
        if content.is_empty() && media.is_empty() {
            return Err(EngineError::Validation(
                "post needs content or media".into(),
            ));
        }

        let post = Post {
            id: Uuid::new_v4().to_string(),
            body: PostBody::User {
                user: Author {
                    id: self.config.viewer_id.clone(),
                    name: self.config.viewer_name.clone(),
                    avatar_url: None,
                },
                content: content.to_string(),
                media: media.clone(),
            },
            like_count: 0,
            comment_count: 0,
            share_count: 0,
            is_liked: false,
            is_bookmarked: false,
            has_viewer_comment: false,
            comments: Vec::new(),
            created_at: Utc::now(),
        };

        let key = MutationKey {
            entity_id: post.id.clone(),
            kind: MutationKind::CreatePost,
        };
        if !self.store.begin_mutation(key.clone()).await {
            return Ok(());
        }
        let result = self.create_post_inner(post, content, media).await;
        self.store.end_mutation(&key).await;
        result
    }

    async fn create_post_inner(
        &self,
        post: Post,
        content: &str,
        media: Vec<MediaItem>,
    ) -> EngineResult<()> {
        let post_id = post.id.clone();
        self.store
            .with_posts(|posts| posts.insert(0, post))
            .await;

        let body = CreatePostBody {
            content: (!content.is_empty()).then(|| content.to_string()),
            media_ids: (!media.is_empty()).then(|| media.iter().map(|m| m.id.clone()).collect()),
        };

        match self.network.create_post(&body).await {
            // Echo discarded, same as comment creation: no id flash.
            Ok(_) => Ok(()),
            Err(e) => {
                warn!(post_id = %post_id, error = %e, "post create failed, rolling back");
                self.store
                    .with_posts(|posts| posts.retain(|p| p.id != post_id))
                    .await;
                Ok(())
            }
        }
    }
}
