//! Cache and durable-storage key schema
//!
//! All gateways must use these generators to keep keys consistent.
//! Feed page format: feed:page:{n}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Cached raw feed page
    /// Format: feed:page:{n}
    pub fn feed_page(page: i32) -> String {
        format!("feed:page:{}", page)
    }
}

/// Durable moderation storage keys. Each holds a JSON-encoded string set and
/// is overwritten wholesale on every moderation mutation.
pub mod storage {
    pub const BLOCKED_AUTHORS: &str = "blockedAuthors";
    pub const HIDDEN_POSTS: &str = "hiddenPosts";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_page_key() {
        assert_eq!(CacheKey::feed_page(1), "feed:page:1");
        assert_eq!(CacheKey::feed_page(17), "feed:page:17");
    }
}
