//! Authoritative feed store
//!
//! Owns the ordered post list, pagination cursor and load-state machine, and
//! reconciles server truth, cached pages and moderation state. All model
//! mutations happen under one writer lock acquired only for synchronous
//! sections; cache and network awaits run with the lock released and their
//! results are applied back through the same lock. Observers receive
//! fully-applied snapshots over a watch channel, never partial states.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::dto::FeedPageDto;
use crate::error::{EngineError, EngineResult};
use crate::filter::ModerationSet;
use crate::gateway::{CacheGateway, ModerationStore, NetworkGateway};
use crate::keys::{storage, CacheKey};
use crate::mapper::ResponseMapper;
use crate::models::{DataSource, FeedSnapshot, LoadState, Post};

/// One optimistic mutation in flight: target entity plus operation kind.
/// A duplicate key is rejected; different kinds on the same entity proceed
/// independently.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct MutationKey {
    pub entity_id: String,
    pub kind: MutationKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum MutationKind {
    Like,
    AddComment,
    DeleteComment,
    LikeComment,
    Share,
    Bookmark,
    CreatePost,
}

struct FeedInner {
    posts: Vec<Post>,
    state: LoadState,
    next_page: i32,
    has_more: bool,
    /// Bumped by every first-page load; in-flight next-page results carrying
    /// an older value are discarded instead of appended.
    generation: u64,
    data_source: Option<DataSource>,
    last_sync: Option<DateTime<Utc>>,
    last_error: Option<String>,
    /// Cache-first paint happens only on the very first load of the process
    cold_start: bool,
    moderation: ModerationSet,
    in_flight: HashSet<MutationKey>,
}

impl FeedInner {
    fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            posts: self.posts.clone(),
            state: self.state,
            data_source: self.data_source,
            last_sync: self.last_sync,
            has_more: self.has_more,
            last_error: self.last_error.clone(),
        }
    }
}

pub struct FeedStore {
    inner: Mutex<FeedInner>,
    cache: Arc<dyn CacheGateway>,
    network: Arc<dyn NetworkGateway>,
    moderation_store: Arc<dyn ModerationStore>,
    mapper: ResponseMapper,
    config: EngineConfig,
    snapshot_tx: watch::Sender<FeedSnapshot>,
}

impl FeedStore {
    pub async fn new(
        config: EngineConfig,
        network: Arc<dyn NetworkGateway>,
        cache: Arc<dyn CacheGateway>,
        moderation_store: Arc<dyn ModerationStore>,
    ) -> Self {
        let moderation = ModerationSet::load(moderation_store.as_ref()).await;
        let inner = FeedInner {
            posts: Vec::new(),
            state: LoadState::Idle,
            next_page: 1,
            has_more: true,
            generation: 0,
            data_source: None,
            last_sync: None,
            last_error: None,
            cold_start: true,
            moderation,
            in_flight: HashSet::new(),
        };
        let (snapshot_tx, _) = watch::channel(inner.snapshot());
        Self {
            inner: Mutex::new(inner),
            cache,
            network,
            moderation_store,
            mapper: ResponseMapper::new(config.viewer_id.clone()),
            config,
            snapshot_tx,
        }
    }

    /// Subscribe to immutable state snapshots
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Current state snapshot
    pub async fn snapshot(&self) -> FeedSnapshot {
        self.inner.lock().await.snapshot()
    }

    fn publish(&self, inner: &FeedInner) {
        self.snapshot_tx.send_replace(inner.snapshot());
    }

    // ============= Loads =============

    /// Load the first page. Paints from cache on cold start while the
    /// network attempt proceeds; on network failure falls back to cache
    /// silently and only surfaces an error when no cached page exists.
    pub async fn load_first(&self) -> EngineResult<()> {
        self.load_front(false).await
    }

    /// Pull-to-refresh: first-page semantics, but never reads the cache
    /// before the network.
    pub async fn refresh(&self) -> EngineResult<()> {
        self.load_front(true).await
    }

    async fn load_front(&self, force_network: bool) -> EngineResult<()> {
        let (generation, try_cache_first) = {
            let mut inner = self.inner.lock().await;
            // A first-page load supersedes an in-flight next-page load (the
            // generation bump below discards its result); a concurrent
            // first-page load is a silent no-op.
            if matches!(
                inner.state,
                LoadState::LoadingFirstPage | LoadState::Refreshing
            ) {
                debug!(state = ?inner.state, "first-page load already in flight, ignoring");
                return Ok(());
            }
            inner.generation += 1;
            inner.state = if force_network {
                LoadState::Refreshing
            } else {
                LoadState::LoadingFirstPage
            };
            inner.last_error = None;
            inner.next_page = 1;
            inner.has_more = true;
            let try_cache_first = !force_network && inner.cold_start;
            self.publish(&inner);
            (inner.generation, try_cache_first)
        };

        let key = CacheKey::feed_page(1);

        if try_cache_first {
            // Instant paint; the load-state machine is not exited and the
            // network attempt still follows.
            match self.cache.get(&key).await {
                Ok(Some(entry)) => {
                    let mut inner = self.inner.lock().await;
                    if inner.generation == generation {
                        let timestamp = entry.timestamp;
                        self.install_first_page(
                            &mut inner,
                            entry.payload,
                            DataSource::Cache,
                            timestamp,
                        );
                        self.publish(&inner);
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(key = %key, error = %e, "cache read failed"),
            }
        }

        match self.network.list_posts(1, self.config.page_limit).await {
            Ok(page) => {
                {
                    let mut inner = self.inner.lock().await;
                    if inner.generation != generation {
                        debug!("stale first-page response discarded");
                        return Ok(());
                    }
                    self.install_first_page(&mut inner, page.clone(), DataSource::Network, Utc::now());
                    inner.state = LoadState::Idle;
                    inner.cold_start = false;
                    self.publish(&inner);
                }
                if let Err(e) = self
                    .cache
                    .set(&key, &page, Duration::from_secs(self.config.cache_ttl_secs))
                    .await
                {
                    warn!(key = %key, error = %e, "cache write failed");
                }
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "first-page load failed, trying cache fallback");
                let fallback = self.cache.get(&key).await.unwrap_or_else(|ce| {
                    warn!(key = %key, error = %ce, "cache read failed");
                    None
                });
                let mut inner = self.inner.lock().await;
                if inner.generation != generation {
                    return Ok(());
                }
                inner.cold_start = false;
                match fallback {
                    Some(entry) => {
                        // Silent fallback: no user-visible error.
                        let timestamp = entry.timestamp;
                        self.install_first_page(
                            &mut inner,
                            entry.payload,
                            DataSource::Cache,
                            timestamp,
                        );
                        inner.state = LoadState::Idle;
                        self.publish(&inner);
                        Ok(())
                    }
                    None => {
                        inner.state = LoadState::Error;
                        inner.last_error = Some(e.to_string());
                        self.publish(&inner);
                        Err(e)
                    }
                }
            }
        }
    }

    /// Load the next page and append it, deduplicated against the existing
    /// list. Eligible only when idle with more pages available.
    pub async fn load_next(&self) -> EngineResult<()> {
        let (generation, page) = {
            let mut inner = self.inner.lock().await;
            if !inner.has_more || inner.state != LoadState::Idle {
                debug!(state = ?inner.state, has_more = inner.has_more, "next-page load not eligible, ignoring");
                return Ok(());
            }
            inner.state = LoadState::LoadingNextPage;
            self.publish(&inner);
            (inner.generation, inner.next_page)
        };

        let key = CacheKey::feed_page(page);

        match self.network.list_posts(page, self.config.page_limit).await {
            Ok(dto) => {
                {
                    let mut inner = self.inner.lock().await;
                    if inner.generation != generation {
                        debug!(page, "stale next-page response discarded");
                        return Ok(());
                    }
                    self.append_page(&mut inner, dto.clone());
                    inner.state = LoadState::Idle;
                    self.publish(&inner);
                }
                if let Err(e) = self
                    .cache
                    .set(&key, &dto, Duration::from_secs(self.config.cache_ttl_secs))
                    .await
                {
                    warn!(key = %key, error = %e, "cache write failed");
                }
                Ok(())
            }
            Err(e) => {
                warn!(page, error = %e, "next-page load failed, trying cache fallback");
                let fallback = self.cache.get(&key).await.unwrap_or_else(|ce| {
                    warn!(key = %key, error = %ce, "cache read failed");
                    None
                });
                let mut inner = self.inner.lock().await;
                if inner.generation != generation {
                    return Ok(());
                }
                match fallback {
                    Some(entry) => {
                        self.append_page(&mut inner, entry.payload);
                        inner.state = LoadState::Idle;
                        self.publish(&inner);
                        Ok(())
                    }
                    None => {
                        inner.state = LoadState::Error;
                        inner.last_error = Some(e.to_string());
                        self.publish(&inner);
                        Err(e)
                    }
                }
            }
        }
    }

    /// Fetch a comment page for a post and merge it, deduplicated by id
    pub async fn load_comments(&self, post_id: &str, page: i32, limit: i32) -> EngineResult<()> {
        let dto = self.network.list_comments(post_id, page, limit).await?;
        let mapped: Vec<_> = dto
            .data
            .into_iter()
            .map(|c| self.mapper.map_comment(c))
            .collect();

        let mut inner = self.inner.lock().await;
        let Some(post) = inner.posts.iter_mut().find(|p| p.id == post_id) else {
            return Err(EngineError::NotFound(format!("post {post_id}")));
        };
        let existing: HashSet<String> = post.comments.iter().map(|c| c.id.clone()).collect();
        for comment in mapped {
            if !existing.contains(&comment.id) {
                post.comments.push(comment);
            }
        }
        post.comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        post.recompute_viewer_comment(&self.config.viewer_id);
        self.publish(&inner);
        Ok(())
    }

    fn install_first_page(
        &self,
        inner: &mut FeedInner,
        page: FeedPageDto,
        source: DataSource,
        sync: DateTime<Utc>,
    ) {
        let mapped = self.mapper.map_page(page);
        inner.posts = inner.moderation.filter(mapped.posts);
        inner.has_more = mapped.has_more;
        inner.next_page = mapped.page + 1;
        inner.data_source = Some(source);
        inner.last_sync = Some(sync);
        inner.last_error = None;
    }

    fn append_page(&self, inner: &mut FeedInner, page: FeedPageDto) {
        let mapped = self.mapper.map_page(page);
        inner.has_more = mapped.has_more;
        inner.next_page = mapped.page + 1;
        let filtered = inner.moderation.filter(mapped.posts);
        // Overlapping pages happen when moderation shifts server-side
        // pagination windows; a post already present is skipped, not moved.
        let existing: HashSet<String> = inner.posts.iter().map(|p| p.id.clone()).collect();
        for post in filtered {
            if !existing.contains(&post.id) {
                inner.posts.push(post);
            }
        }
    }

    // ============= Moderation =============
    //
    // Moderation is sticky, not optimistic: the local change applies
    // immediately, persists wholesale, then syncs best-effort. A sync
    // failure is logged, never rolled back.

    /// Block an author: remove their posts at once and exclude them from
    /// every future materialization
    pub async fn block_author(&self, author_id: &str) {
        let set = {
            let mut inner = self.inner.lock().await;
            inner.moderation.block_author(author_id);
            inner.posts.retain(|p| p.author_id() != author_id);
            self.publish(&inner);
            inner.moderation.clone()
        };
        self.persist_moderation(&set).await;
        if let Err(e) = self.network.block_author(author_id).await {
            warn!(author_id, error = %e, "author block sync failed");
        }
    }

    /// Permit future loads to include the author again. Does not restore
    /// previously removed posts.
    pub async fn unblock_author(&self, author_id: &str) {
        let set = {
            let mut inner = self.inner.lock().await;
            inner.moderation.unblock_author(author_id);
            self.publish(&inner);
            inner.moderation.clone()
        };
        self.persist_moderation(&set).await;
        if let Err(e) = self.network.unblock_author(author_id).await {
            warn!(author_id, error = %e, "author unblock sync failed");
        }
    }

    pub async fn hide_post(&self, post_id: &str) {
        let set = {
            let mut inner = self.inner.lock().await;
            inner.moderation.hide_post(post_id);
            inner.posts.retain(|p| p.id != post_id);
            self.publish(&inner);
            inner.moderation.clone()
        };
        self.persist_moderation(&set).await;
        if let Err(e) = self.network.hide_post(post_id).await {
            warn!(post_id, error = %e, "post hide sync failed");
        }
    }

    /// Report a post: blocked locally like a hide, then reported remotely
    pub async fn report_post(&self, post_id: &str, reason: &str) {
        let set = {
            let mut inner = self.inner.lock().await;
            inner.moderation.block_post(post_id);
            inner.posts.retain(|p| p.id != post_id);
            self.publish(&inner);
            inner.moderation.clone()
        };
        self.persist_moderation(&set).await;
        if let Err(e) = self.network.report_post(post_id, reason).await {
            warn!(post_id, error = %e, "post report sync failed");
        }
    }

    async fn persist_moderation(&self, set: &ModerationSet) {
        if let Err(e) = self
            .moderation_store
            .save(storage::BLOCKED_AUTHORS, &set.blocked_authors)
            .await
        {
            warn!(error = %e, "blocked-author persist failed");
        }
        if let Err(e) = self
            .moderation_store
            .save(storage::HIDDEN_POSTS, &set.persisted_hidden())
            .await
        {
            warn!(error = %e, "hidden-post persist failed");
        }
    }

    // ============= Mutation support =============

    /// Reserve an entity+operation slot. Returns false when the same
    /// mutation is already outstanding.
    pub(crate) async fn begin_mutation(&self, key: MutationKey) -> bool {
        let mut inner = self.inner.lock().await;
        inner.in_flight.insert(key)
    }

    pub(crate) async fn end_mutation(&self, key: &MutationKey) {
        let mut inner = self.inner.lock().await;
        inner.in_flight.remove(key);
    }

    /// Run a synchronous closure against one post under the writer lock and
    /// publish the applied state
    pub(crate) async fn with_post<T>(
        &self,
        post_id: &str,
        f: impl FnOnce(&mut Post) -> T,
    ) -> EngineResult<T> {
        let mut inner = self.inner.lock().await;
        let Some(post) = inner.posts.iter_mut().find(|p| p.id == post_id) else {
            return Err(EngineError::NotFound(format!("post {post_id}")));
        };
        let out = f(post);
        self.publish(&inner);
        Ok(out)
    }

    /// Run a synchronous closure against one nested comment under the
    /// writer lock and publish the applied state
    pub(crate) async fn with_comment<T>(
        &self,
        comment_id: &str,
        f: impl FnOnce(&mut crate::models::Comment) -> T,
    ) -> EngineResult<T> {
        let mut inner = self.inner.lock().await;
        let Some(comment) = inner
            .posts
            .iter_mut()
            .flat_map(|p| p.comments.iter_mut())
            .find(|c| c.id == comment_id)
        else {
            return Err(EngineError::NotFound(format!("comment {comment_id}")));
        };
        let out = f(comment);
        self.publish(&inner);
        Ok(out)
    }

    /// Run a synchronous closure against the whole list under the writer
    /// lock and publish the applied state
    pub(crate) async fn with_posts<T>(&self, f: impl FnOnce(&mut Vec<Post>) -> T) -> T {
        let mut inner = self.inner.lock().await;
        let out = f(&mut inner.posts);
        self.publish(&inner);
        out
    }
}
