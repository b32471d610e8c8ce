/// Configuration for the feed engine
///
/// Loads configuration from environment variables.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base URL of the feed backend (no trailing slash)
    pub api_base_url: String,
    /// Id of the signed-in viewer, used for viewer-comment derivation
    /// and for locally synthesized posts and comments
    pub viewer_id: String,
    /// Display name of the signed-in viewer
    pub viewer_name: String,
    /// Posts requested per page
    #[serde(default = "default_page_limit")]
    pub page_limit: i32,
    /// TTL for cached feed pages (seconds)
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Maximum comment length accepted before dispatch
    #[serde(default = "default_max_comment_length")]
    pub max_comment_length: usize,
}

// Default values
fn default_page_limit() -> i32 {
    20
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_max_comment_length() -> usize {
    1000
}

impl EngineConfig {
    /// Create a configuration with default tuning values
    pub fn new(
        api_base_url: impl Into<String>,
        viewer_id: impl Into<String>,
        viewer_name: impl Into<String>,
    ) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            viewer_id: viewer_id.into(),
            viewer_name: viewer_name.into(),
            page_limit: default_page_limit(),
            cache_ttl_secs: default_cache_ttl_secs(),
            max_comment_length: default_max_comment_length(),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api_base_url: std::env::var("FEED_API_BASE_URL")
                .context("FEED_API_BASE_URL environment variable not set")?,
            viewer_id: std::env::var("FEED_VIEWER_ID")
                .context("FEED_VIEWER_ID environment variable not set")?,
            viewer_name: std::env::var("FEED_VIEWER_NAME").unwrap_or_else(|_| "You".to_string()),
            page_limit: std::env::var("FEED_PAGE_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_page_limit),
            cache_ttl_secs: std::env::var("FEED_CACHE_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_cache_ttl_secs),
            max_comment_length: std::env::var("FEED_MAX_COMMENT_LENGTH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_max_comment_length),
        })
    }
}
