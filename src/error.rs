//! Error taxonomy for the feed engine
//!
//! Loads treat transient and decode failures the same way (cache fallback),
//! while optimistic mutations roll back on any failure. Validation and
//! not-found errors are rejected before any state change.

use thiserror::Error;

/// Result type alias for engine operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Network request failed in transit or the server rejected it
    #[error("network error: {0}")]
    Network(String),

    /// Response body could not be decoded into the expected shape
    #[error("decode error: {0}")]
    Decode(String),

    /// Input rejected before any optimistic change was applied
    #[error("validation error: {0}")]
    Validation(String),

    /// Target entity is not present in the local model
    #[error("not found: {0}")]
    NotFound(String),

    /// Cache gateway failure
    #[error("cache error: {0}")]
    Cache(String),

    /// Durable moderation storage failure
    #[error("storage error: {0}")]
    Storage(String),
}

impl EngineError {
    /// Check if this error is worth retrying
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Cache(_))
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<redis::RedisError> for EngineError {
    fn from(err: redis::RedisError) -> Self {
        Self::Cache(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(EngineError::Network("timeout".into()).is_transient());
        assert!(EngineError::Cache("down".into()).is_transient());
        assert!(!EngineError::Validation("empty".into()).is_transient());
        assert!(!EngineError::NotFound("post p1".into()).is_transient());
    }

    #[test]
    fn decode_from_serde() {
        let err = serde_json::from_str::<u32>("not json").unwrap_err();
        assert!(matches!(EngineError::from(err), EngineError::Decode(_)));
    }
}
