//! Client-side feed synchronization and optimistic-mutation engine
//!
//! Owns the authoritative in-memory view of a paginated post list with
//! nested comments and keeps it consistent across three competing
//! influences: server truth, previously cached pages and speculative local
//! edits. Provides:
//! - Cache-first cold start with silent cache fallback on network failure
//! - Page append with id dedup and a generation counter discarding stale
//!   in-flight results
//! - Apply-then-confirm-or-rollback protocol for likes, comments, shares,
//!   bookmarks and post creation
//! - Sticky moderation (hide/block/report) that survives remote sync
//!   failure
//!
//! Rendering, media handling and platform integrations stay outside; the
//! engine is constructed with injected cache, network and storage gateways
//! and publishes immutable snapshots over a watch channel.

pub mod config;
pub mod coordinator;
pub mod dto;
pub mod engine;
pub mod error;
pub mod filter;
pub mod gateway;
pub mod keys;
pub mod mapper;
pub mod models;
pub mod store;

pub use config::EngineConfig;
pub use coordinator::OptimisticMutationCoordinator;
pub use engine::FeedEngine;
pub use error::{EngineError, EngineResult};
pub use filter::ModerationSet;
pub use gateway::{CacheEntry, CacheGateway, ModerationStore, NetworkGateway};
pub use mapper::ResponseMapper;
pub use models::{
    Author, Comment, DataSource, FeedPage, FeedSnapshot, LoadState, MediaItem, MediaKind, Post,
    PostBody,
};
pub use store::FeedStore;
