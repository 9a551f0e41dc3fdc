use std::sync::{Arc, Mutex};
use std::time::Duration;
use async_trait::async_trait;

use super::market_feed::{FeedError, MarketFeed};
use super::models::RawFeedRecord;
use super::presenter::Presenter;
use crate::domain::{ScoredToken, SourceFamily};

/// In-memory feed that returns a fixed batch and records how often it was polled
#[derive(Debug, Clone)]
pub struct StaticFeed {
    name: &'static str,
    family: SourceFamily,
    records: Vec<RawFeedRecord>,
    failure: Option<String>,
    delay: Option<Duration>,
    calls: Arc<Mutex<usize>>,
}

impl StaticFeed {
    pub fn new(name: &'static str, family: SourceFamily) -> Self {
        Self {
            name,
            family,
            records: Vec::new(),
            failure: None,
            delay: None,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Builder method to set the batch returned on every fetch
    pub fn with_records(mut self, records: Vec<RawFeedRecord>) -> Self {
        self.records = records;
        self
    }

    /// Builder method to make every fetch fail with a transport error
    pub fn failing(mut self, reason: &str) -> Self {
        self.failure = Some(reason.to_string());
        self
    }

    /// Builder method to delay each fetch (for timeout / supersession tests)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of fetches made so far
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| *c).unwrap_or(0)
    }
}

#[async_trait]
impl MarketFeed for StaticFeed {
    fn name(&self) -> &'static str {
        self.name
    }

    fn family(&self) -> SourceFamily {
        self.family
    }

    async fn fetch_batch(&self) -> Result<Vec<RawFeedRecord>, FeedError> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls += 1;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.failure {
            Some(reason) => Err(FeedError::Transport(reason.clone())),
            None => Ok(self.records.clone()),
        }
    }
}

/// Presenter that keeps every rendered frame
#[derive(Debug, Default, Clone)]
pub struct RecordingPresenter {
    frames: Arc<Mutex<Vec<(Vec<String>, String)>>>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Symbols of each rendered frame, with the query that was active
    pub fn frames(&self) -> Vec<(Vec<String>, String)> {
        self.frames.lock().map(|f| f.clone()).unwrap_or_default()
    }
}

impl Presenter for RecordingPresenter {
    fn render(&self, view: &[ScoredToken], query: &str) {
        let symbols = view.iter().map(|t| t.symbol().to_string()).collect();
        if let Ok(mut frames) = self.frames.lock() {
            frames.push((symbols, query.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::models::CoinMarketRecord;

    #[tokio::test]
    async fn test_static_feed_returns_records() {
        let feed = StaticFeed::new("listing", SourceFamily::CoinGecko)
            .with_records(vec![RawFeedRecord::Listing(CoinMarketRecord::default())]);

        let batch = feed.fetch_batch().await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(feed.call_count(), 1);
    }

    #[tokio::test]
    async fn test_static_feed_failure() {
        let feed = StaticFeed::new("down", SourceFamily::Okx).failing("connection reset");

        let result = feed.fetch_batch().await;
        assert!(matches!(result, Err(FeedError::Transport(_))));
        assert_eq!(feed.call_count(), 1);
    }

    #[test]
    fn test_recording_presenter() {
        let presenter = RecordingPresenter::new();
        presenter.render(&[], "btc");
        assert_eq!(presenter.frames(), vec![(Vec::<String>::new(), "btc".to_string())]);
    }
}
