//! Moderation set and feed filtering
//!
//! The set is loaded once at engine start and applied to every feed
//! materialization, whether the page came from the network or the cache.
//! Local moderation is sticky: entries are never removed because a remote
//! sync failed.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::gateway::ModerationStore;
use crate::keys::storage;
use crate::models::Post;

/// Blocked-author, blocked-post and hidden-post id sets
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModerationSet {
    pub blocked_authors: HashSet<String>,
    /// Posts blocked through reporting. Persisted unioned into the
    /// hidden-posts storage key; kept distinct in memory.
    pub blocked_posts: HashSet<String>,
    pub hidden_posts: HashSet<String>,
}

impl ModerationSet {
    /// Load the durable set. A read failure logs and starts empty rather than
    /// refusing to start the engine.
    pub async fn load(store: &dyn ModerationStore) -> Self {
        let blocked_authors = match store.load(storage::BLOCKED_AUTHORS).await {
            Ok(set) => set.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "blocked-author load failed, starting empty");
                HashSet::new()
            }
        };
        let hidden_posts = match store.load(storage::HIDDEN_POSTS).await {
            Ok(set) => set.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "hidden-post load failed, starting empty");
                HashSet::new()
            }
        };
        Self {
            blocked_authors,
            blocked_posts: HashSet::new(),
            hidden_posts,
        }
    }

    /// Gate applied to every post before it enters the feed
    pub fn allows(&self, post: &Post) -> bool {
        !self.blocked_authors.contains(post.author_id())
            && !self.hidden_posts.contains(&post.id)
            && !self.blocked_posts.contains(&post.id)
    }

    pub fn filter(&self, posts: Vec<Post>) -> Vec<Post> {
        posts.into_iter().filter(|p| self.allows(p)).collect()
    }

    pub fn block_author(&mut self, author_id: &str) -> bool {
        self.blocked_authors.insert(author_id.to_string())
    }

    pub fn unblock_author(&mut self, author_id: &str) -> bool {
        self.blocked_authors.remove(author_id)
    }

    pub fn hide_post(&mut self, post_id: &str) -> bool {
        self.hidden_posts.insert(post_id.to_string())
    }

    pub fn block_post(&mut self, post_id: &str) -> bool {
        self.blocked_posts.insert(post_id.to_string())
    }

    /// Union written to the hidden-posts storage key: the durable contract
    /// has two keys, blocked posts ride along with hidden ones.
    pub fn persisted_hidden(&self) -> HashSet<String> {
        self.hidden_posts
            .union(&self.blocked_posts)
            .cloned()
            .collect()
    }
}
