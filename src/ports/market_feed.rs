//! Market Feed Port
//!
//! Contract every source adapter implements. An adapter performs one bounded
//! fetch per refresh cycle and reports failure as a `FeedError`; the pipeline
//! converts any error into an empty batch so siblings are never aborted.

use async_trait::async_trait;
use thiserror::Error;

use super::models::RawFeedRecord;
use crate::domain::SourceFamily;

/// Adapter-level failure. Contained at the adapter boundary, never surfaced
/// to callers of `refresh()`.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out after {0} s")]
    Timeout(u64),

    #[error("Upstream returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FeedError::Parse(err.to_string())
        } else if err.is_timeout() {
            FeedError::Transport(format!("timeout: {}", err))
        } else {
            FeedError::Transport(err.to_string())
        }
    }
}

/// Source adapter contract
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketFeed: Send + Sync {
    /// Adapter name for diagnostics
    fn name(&self) -> &'static str;

    /// Provider family, drives the aggregator's volume merge rule
    fn family(&self) -> SourceFamily;

    /// Fetch one batch of raw records
    async fn fetch_batch(&self) -> Result<Vec<RawFeedRecord>, FeedError>;
}
