//! Shared fakes and builders for engine scenario tests
//!
//! Gateways are scripted in-memory doubles: pages and responses are seeded
//! up front, failures injected per concern, and every call recorded so
//! tests can assert on dispatch behavior.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use feedsync::dto::{
    AuthorDto, CommentDto, CommentPageDto, CreateCommentBody, CreatePostBody, FeedPageDto,
    LikeResponseDto, PostDto, ShareResponseDto,
};
use feedsync::{
    CacheEntry, CacheGateway, EngineConfig, EngineError, EngineResult, FeedEngine,
    ModerationStore, NetworkGateway,
};

pub const VIEWER_ID: &str = "viewer-1";
pub const VIEWER_NAME: &str = "Viewer One";

static TRACING: Once = Once::new();

/// Engine logs while debugging a test: RUST_LOG=feedsync=debug cargo test
fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

// ============= Fake network =============

#[derive(Default)]
struct NetworkState {
    pages: HashMap<i32, FeedPageDto>,
    comment_pages: HashMap<String, CommentPageDto>,
    like_response: Option<LikeResponseDto>,
    share_response: Option<ShareResponseDto>,
    fail_loads: bool,
    garble_loads: bool,
    fail_mutations: bool,
    fail_moderation: bool,
    delay: Option<Duration>,
    calls: Vec<String>,
}

pub struct FakeNetwork {
    state: Mutex<NetworkState>,
}

impl FakeNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(NetworkState::default()),
        })
    }

    pub fn set_page(&self, page: i32, dto: FeedPageDto) {
        self.state.lock().unwrap().pages.insert(page, dto);
    }

    pub fn set_comment_page(&self, post_id: &str, dto: CommentPageDto) {
        self.state
            .lock()
            .unwrap()
            .comment_pages
            .insert(post_id.to_string(), dto);
    }

    pub fn set_like_response(&self, dto: LikeResponseDto) {
        self.state.lock().unwrap().like_response = Some(dto);
    }

    pub fn set_share_response(&self, dto: ShareResponseDto) {
        self.state.lock().unwrap().share_response = Some(dto);
    }

    pub fn fail_loads(&self, on: bool) {
        self.state.lock().unwrap().fail_loads = on;
    }

    /// Loads respond with an undecodable body instead of a transport failure
    pub fn garble_loads(&self, on: bool) {
        self.state.lock().unwrap().garble_loads = on;
    }

    pub fn fail_mutations(&self, on: bool) {
        self.state.lock().unwrap().fail_mutations = on;
    }

    pub fn fail_moderation(&self, on: bool) {
        self.state.lock().unwrap().fail_moderation = on;
    }

    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }

    pub fn clear_delay(&self) {
        self.state.lock().unwrap().delay = None;
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self, prefix: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }

    async fn pause(&self) {
        let delay = self.state.lock().unwrap().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn load_guard(&self) -> EngineResult<()> {
        let state = self.state.lock().unwrap();
        if state.garble_loads {
            Err(EngineError::Decode("injected malformed payload".into()))
        } else if state.fail_loads {
            Err(EngineError::Network("injected load failure".into()))
        } else {
            Ok(())
        }
    }

    fn mutation_guard(&self) -> EngineResult<()> {
        if self.state.lock().unwrap().fail_mutations {
            Err(EngineError::Network("injected mutation failure".into()))
        } else {
            Ok(())
        }
    }

    fn moderation_guard(&self) -> EngineResult<()> {
        if self.state.lock().unwrap().fail_moderation {
            Err(EngineError::Network("injected moderation failure".into()))
        } else {
            Ok(())
        }
    }

    fn like_echo(&self, liked: bool) -> LikeResponseDto {
        self.state
            .lock()
            .unwrap()
            .like_response
            .clone()
            .unwrap_or(LikeResponseDto {
                success: true,
                like_count: i64::from(liked),
                is_liked: liked,
            })
    }
}

#[async_trait]
impl NetworkGateway for FakeNetwork {
    async fn list_posts(&self, page: i32, _limit: i32) -> EngineResult<FeedPageDto> {
        self.record(format!("list_posts:{page}"));
        self.pause().await;
        self.load_guard()?;
        self.state
            .lock()
            .unwrap()
            .pages
            .get(&page)
            .cloned()
            .ok_or_else(|| EngineError::Network(format!("no scripted page {page}")))
    }

    async fn like_post(&self, post_id: &str) -> EngineResult<LikeResponseDto> {
        self.record(format!("like_post:{post_id}"));
        self.pause().await;
        self.mutation_guard()?;
        Ok(self.like_echo(true))
    }

    async fn unlike_post(&self, post_id: &str) -> EngineResult<LikeResponseDto> {
        self.record(format!("unlike_post:{post_id}"));
        self.pause().await;
        self.mutation_guard()?;
        Ok(self.like_echo(false))
    }

    async fn list_comments(
        &self,
        post_id: &str,
        page: i32,
        _limit: i32,
    ) -> EngineResult<CommentPageDto> {
        self.record(format!("list_comments:{post_id}:{page}"));
        self.pause().await;
        self.load_guard()?;
        self.state
            .lock()
            .unwrap()
            .comment_pages
            .get(post_id)
            .cloned()
            .ok_or_else(|| EngineError::Network(format!("no scripted comments for {post_id}")))
    }

    async fn add_comment(
        &self,
        post_id: &str,
        body: &CreateCommentBody,
    ) -> EngineResult<CommentDto> {
        self.record(format!("add_comment:{post_id}"));
        self.pause().await;
        self.mutation_guard()?;
        Ok(CommentDto {
            id: format!("server-{post_id}-comment"),
            post_id: post_id.to_string(),
            user_id: VIEWER_ID.to_string(),
            user_name: VIEWER_NAME.to_string(),
            content: body.content.clone(),
            created_at: Utc::now(),
            like_count: 0,
            is_liked: false,
            reply_to_id: body.reply_to.clone(),
            reply_to_user_name: None,
        })
    }

    async fn delete_comment(&self, comment_id: &str) -> EngineResult<()> {
        self.record(format!("delete_comment:{comment_id}"));
        self.pause().await;
        self.mutation_guard()
    }

    async fn like_comment(&self, comment_id: &str) -> EngineResult<LikeResponseDto> {
        self.record(format!("like_comment:{comment_id}"));
        self.pause().await;
        self.mutation_guard()?;
        Ok(self.like_echo(true))
    }

    async fn unlike_comment(&self, comment_id: &str) -> EngineResult<LikeResponseDto> {
        self.record(format!("unlike_comment:{comment_id}"));
        self.pause().await;
        self.mutation_guard()?;
        Ok(self.like_echo(false))
    }

    async fn share_post(&self, post_id: &str) -> EngineResult<ShareResponseDto> {
        self.record(format!("share_post:{post_id}"));
        self.pause().await;
        self.mutation_guard()?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .share_response
            .clone()
            .unwrap_or(ShareResponseDto {
                success: true,
                share_count: None,
            }))
    }

    async fn bookmark_post(&self, post_id: &str) -> EngineResult<()> {
        self.record(format!("bookmark_post:{post_id}"));
        self.pause().await;
        self.mutation_guard()
    }

    async fn unbookmark_post(&self, post_id: &str) -> EngineResult<()> {
        self.record(format!("unbookmark_post:{post_id}"));
        self.pause().await;
        self.mutation_guard()
    }

    async fn hide_post(&self, post_id: &str) -> EngineResult<()> {
        self.record(format!("hide_post:{post_id}"));
        self.pause().await;
        self.moderation_guard()
    }

    async fn block_author(&self, author_id: &str) -> EngineResult<()> {
        self.record(format!("block_author:{author_id}"));
        self.pause().await;
        self.moderation_guard()
    }

    async fn unblock_author(&self, author_id: &str) -> EngineResult<()> {
        self.record(format!("unblock_author:{author_id}"));
        self.pause().await;
        self.moderation_guard()
    }

    async fn report_post(&self, post_id: &str, reason: &str) -> EngineResult<()> {
        self.record(format!("report_post:{post_id}:{reason}"));
        self.pause().await;
        self.moderation_guard()
    }

    async fn create_post(&self, body: &CreatePostBody) -> EngineResult<PostDto> {
        self.record("create_post".to_string());
        self.pause().await;
        self.mutation_guard()?;
        Ok(PostDto {
            id: "server-post".to_string(),
            post_type: Some("user".to_string()),
            author: None,
            user: Some(AuthorDto {
                id: VIEWER_ID.to_string(),
                name: VIEWER_NAME.to_string(),
                avatar_url: None,
            }),
            quote: None,
            content: body.content.clone(),
            media: vec![],
            like_count: 0,
            comment_count: 0,
            share_count: 0,
            is_liked: false,
            is_bookmarked: false,
            comments: None,
            created_at: Utc::now(),
        })
    }
}

// ============= Fake cache =============

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    fail_get: bool,
    fail_set: bool,
    get_count: usize,
    set_keys: Vec<String>,
}

pub struct FakeCache {
    state: Mutex<CacheState>,
}

impl FakeCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(CacheState::default()),
        })
    }

    pub fn seed(&self, key: &str, payload: FeedPageDto, timestamp: DateTime<Utc>) {
        self.state
            .lock()
            .unwrap()
            .entries
            .insert(key.to_string(), CacheEntry { payload, timestamp });
    }

    pub fn entry(&self, key: &str) -> Option<CacheEntry> {
        self.state.lock().unwrap().entries.get(key).cloned()
    }

    pub fn get_count(&self) -> usize {
        self.state.lock().unwrap().get_count
    }

    pub fn set_keys(&self) -> Vec<String> {
        self.state.lock().unwrap().set_keys.clone()
    }

    pub fn fail_get(&self, on: bool) {
        self.state.lock().unwrap().fail_get = on;
    }

    pub fn fail_set(&self, on: bool) {
        self.state.lock().unwrap().fail_set = on;
    }
}

#[async_trait]
impl CacheGateway for FakeCache {
    async fn get(&self, key: &str) -> EngineResult<Option<CacheEntry>> {
        let mut state = self.state.lock().unwrap();
        state.get_count += 1;
        if state.fail_get {
            return Err(EngineError::Cache("injected cache failure".into()));
        }
        Ok(state.entries.get(key).cloned())
    }

    async fn set(&self, key: &str, payload: &FeedPageDto, _ttl: Duration) -> EngineResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_set {
            return Err(EngineError::Cache("injected cache failure".into()));
        }
        state.set_keys.push(key.to_string());
        state.entries.insert(
            key.to_string(),
            CacheEntry {
                payload: payload.clone(),
                timestamp: Utc::now(),
            },
        );
        Ok(())
    }
}

// ============= Fake moderation storage =============

#[derive(Default)]
struct StorageState {
    sets: HashMap<String, HashSet<String>>,
    fail: bool,
    save_count: usize,
}

pub struct FakeModerationStore {
    state: Mutex<StorageState>,
}

impl FakeModerationStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(StorageState::default()),
        })
    }

    pub fn seed(&self, key: &str, ids: impl IntoIterator<Item = &'static str>) {
        self.state
            .lock()
            .unwrap()
            .sets
            .insert(key.to_string(), ids.into_iter().map(str::to_string).collect());
    }

    pub fn saved(&self, key: &str) -> Option<HashSet<String>> {
        self.state.lock().unwrap().sets.get(key).cloned()
    }

    pub fn save_count(&self) -> usize {
        self.state.lock().unwrap().save_count
    }

    pub fn fail(&self, on: bool) {
        self.state.lock().unwrap().fail = on;
    }
}

#[async_trait]
impl ModerationStore for FakeModerationStore {
    async fn load(&self, key: &str) -> EngineResult<Option<HashSet<String>>> {
        let state = self.state.lock().unwrap();
        if state.fail {
            return Err(EngineError::Storage("injected storage failure".into()));
        }
        Ok(state.sets.get(key).cloned())
    }

    async fn save(&self, key: &str, ids: &HashSet<String>) -> EngineResult<()> {
        let mut state = self.state.lock().unwrap();
        state.save_count += 1;
        if state.fail {
            return Err(EngineError::Storage("injected storage failure".into()));
        }
        state.sets.insert(key.to_string(), ids.clone());
        Ok(())
    }
}

// ============= DTO builders =============

pub fn author_post(id: &str, author_id: &str) -> PostDto {
    PostDto {
        id: id.to_string(),
        post_type: Some("author".to_string()),
        author: Some(AuthorDto {
            id: author_id.to_string(),
            name: format!("Author {author_id}"),
            avatar_url: None,
        }),
        user: None,
        quote: Some("quoted words".to_string()),
        content: None,
        media: vec![],
        like_count: 0,
        comment_count: 0,
        share_count: 0,
        is_liked: false,
        is_bookmarked: false,
        comments: None,
        created_at: Utc::now(),
    }
}

pub fn comment_dto(id: &str, post_id: &str, user_id: &str) -> CommentDto {
    CommentDto {
        id: id.to_string(),
        post_id: post_id.to_string(),
        user_id: user_id.to_string(),
        user_name: format!("User {user_id}"),
        content: "a comment".to_string(),
        created_at: Utc::now(),
        like_count: 0,
        is_liked: false,
        reply_to_id: None,
        reply_to_user_name: None,
    }
}

pub fn page(posts: Vec<PostDto>, page_no: i32, has_more: bool) -> FeedPageDto {
    FeedPageDto {
        total: posts.len() as i64,
        data: posts,
        page: page_no,
        limit: 20,
        has_more,
    }
}

// ============= Harness =============

pub struct Harness {
    pub network: Arc<FakeNetwork>,
    pub cache: Arc<FakeCache>,
    pub storage: Arc<FakeModerationStore>,
}

pub fn harness() -> Harness {
    init_tracing();
    Harness {
        network: FakeNetwork::new(),
        cache: FakeCache::new(),
        storage: FakeModerationStore::new(),
    }
}

pub fn test_config() -> EngineConfig {
    EngineConfig::new("http://feed.test", VIEWER_ID, VIEWER_NAME)
}

pub async fn engine(h: &Harness) -> FeedEngine {
    FeedEngine::new(
        test_config(),
        h.network.clone(),
        h.cache.clone(),
        h.storage.clone(),
    )
    .await
}

pub fn post_ids(snapshot: &feedsync::FeedSnapshot) -> Vec<String> {
    snapshot.posts.iter().map(|p| p.id.clone()).collect()
}
