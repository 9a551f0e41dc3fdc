//! Ranking Pipeline
//!
//! One refresh cycle: fan out to every adapter of a source chain, join the
//! batches, normalize, aggregate, score and rank. If the primary chain yields
//! no scored tokens the fallback chain is tried once with the simplified
//! range-proxy scoring. Nothing is retried beyond that.
//!
//! ```text
//!   PRIMARY --(non-empty)--> done: Success
//!      |
//!   (empty)
//!      v
//!   FALLBACK --(non-empty)--> done: EmptyPrimary
//!      |
//!   (empty)--> done: EmptyAll / SourceError
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use futures::future::join_all;
use serde::Serialize;
use thiserror::Error;

use crate::adapters::market_data::{CoinGeckoClient, CoinGeckoListing, CoinGeckoTrending, OkxPerpetuals};
use crate::config::{Config, PipelineSection};
use crate::domain::{
    normalize_batch, rank, Aggregator, AmplitudeModel, MarketSnapshot, RankKey, ScoredToken,
    Scorer, ScoringStrategy, Stage,
};
use crate::ports::models::RawFeedRecord;
use crate::ports::{FeedError, MarketFeed};

/// Shared handle to a source adapter
pub type FeedHandle = Arc<dyn MarketFeed>;

/// Result of one `refresh()`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "count", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Primary chain produced this many ranked tokens
    Success(usize),
    /// Primary chain was empty; fallback produced this many
    EmptyPrimary(usize),
    /// Both chains empty although at least one source answered
    EmptyAll,
    /// Every adapter of both chains failed
    SourceError,
    /// A newer refresh cancelled this run before it committed
    Superseded,
}

impl RunOutcome {
    /// Ranked count of a run that produced data, otherwise the typed reason it did not
    pub fn into_result(self) -> Result<usize, PipelineError> {
        match self {
            RunOutcome::Success(n) | RunOutcome::EmptyPrimary(n) => Ok(n),
            RunOutcome::EmptyAll | RunOutcome::SourceError => Err(PipelineError::EmptyPopulation),
            RunOutcome::Superseded => Err(PipelineError::Superseded),
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Success(n) => write!(f, "{} tokens ranked from primary sources", n),
            RunOutcome::EmptyPrimary(n) => write!(f, "primary sources empty, {} tokens ranked from fallback", n),
            RunOutcome::EmptyAll => write!(f, "no data: primary and fallback sources yielded nothing"),
            RunOutcome::SourceError => write!(f, "no data: every source failed"),
            RunOutcome::Superseded => write!(f, "superseded by a newer refresh"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No records survived scoring in either the primary or fallback stage")]
    EmptyPopulation,

    #[error("Refresh was superseded by a newer run")]
    Superseded,

    #[error("Failed to build source adapter: {0}")]
    AdapterSetup(#[from] FeedError),
}

/// Tunables for a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub rank_key: RankKey,
    pub top_n: usize,
    pub highlight_fraction: f64,
    pub scoring_strategy: ScoringStrategy,
    pub adapter_wait: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from(&PipelineSection::default())
    }
}

impl From<&PipelineSection> for PipelineSettings {
    fn from(section: &PipelineSection) -> Self {
        Self {
            rank_key: section.rank_key,
            top_n: section.top_n,
            highlight_fraction: section.highlight_fraction,
            scoring_strategy: section.scoring_strategy,
            adapter_wait: Duration::from_secs(section.adapter_wait_secs),
        }
    }
}

/// Joined output of one source chain
#[derive(Debug, Default)]
pub struct Collection {
    pub snapshots: Vec<MarketSnapshot>,
    /// Adapters that returned a batch (possibly empty)
    pub answered: usize,
    /// Adapters degraded to an empty batch by an error or timeout
    pub failed: usize,
}

/// Ranked output of one stage
#[derive(Debug)]
pub struct StageReport {
    pub stage: Stage,
    pub ranked: Vec<ScoredToken>,
    pub answered: usize,
    pub failed: usize,
}

/// Final product of a pipeline run
#[derive(Debug)]
pub struct PipelineRun {
    pub outcome: RunOutcome,
    pub stage: Option<Stage>,
    pub ranked: Vec<ScoredToken>,
}

impl PipelineRun {
    fn empty(outcome: RunOutcome) -> Self {
        Self { outcome, stage: None, ranked: Vec::new() }
    }
}

/// Raw batches already fetched during one run.
///
/// A feed listed in both chains is fetched once; the fallback stage reuses
/// its primary batch, or its failure.
#[derive(Default)]
pub struct BatchCache {
    entries: Vec<(FeedHandle, Option<Vec<RawFeedRecord>>)>,
}

impl BatchCache {
    fn get(&self, feed: &FeedHandle) -> Option<&Option<Vec<RawFeedRecord>>> {
        self.entries
            .iter()
            .find(|(cached, _)| Arc::ptr_eq(cached, feed))
            .map(|(_, batch)| batch)
    }

    fn contains(&self, feed: &FeedHandle) -> bool {
        self.get(feed).is_some()
    }
}

#[derive(Debug, Clone, Copy)]
enum ControllerState {
    Primary,
    Fallback { primary_answered: usize },
}

pub struct RankingPipeline {
    primary: Vec<FeedHandle>,
    fallback: Vec<FeedHandle>,
    aggregator: Aggregator,
    settings: PipelineSettings,
}

impl RankingPipeline {
    pub fn new(
        primary: Vec<FeedHandle>,
        fallback: Vec<FeedHandle>,
        aggregator: Aggregator,
        settings: PipelineSettings,
    ) -> Self {
        Self { primary, fallback, aggregator, settings }
    }

    /// Wire the live adapters described by the configuration.
    ///
    /// Primary: OKX perpetuals + CoinGecko trending.
    /// Fallback: CoinGecko listing + CoinGecko trending.
    pub fn from_config(config: &Config) -> Result<Self, PipelineError> {
        let timeout = Duration::from_secs(config.sources.request_timeout_secs);
        let gecko = CoinGeckoClient::new(
            &config.sources.get_coingecko_api_url(),
            &config.sources.vs_currency,
            timeout,
        )?;

        let okx: FeedHandle = Arc::new(OkxPerpetuals::new(&config.sources.get_okx_api_url(), timeout)?);
        let trending: FeedHandle = Arc::new(CoinGeckoTrending::new(gecko.clone()));
        let listing: FeedHandle = Arc::new(CoinGeckoListing::new(gecko, config.sources.listing_per_page));

        Ok(Self::new(
            vec![okx, Arc::clone(&trending)],
            vec![listing, trending],
            Aggregator::new(&config.filters.denylist),
            PipelineSettings::from(&config.pipeline),
        ))
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Run the primary chain, then the fallback chain if primary was empty
    pub async fn run(&self) -> PipelineRun {
        let mut cache = BatchCache::default();
        let mut state = ControllerState::Primary;
        loop {
            match state {
                ControllerState::Primary => {
                    let report = self.run_stage(Stage::Primary, &mut cache).await;
                    if !report.ranked.is_empty() {
                        return PipelineRun {
                            outcome: RunOutcome::Success(report.ranked.len()),
                            stage: Some(Stage::Primary),
                            ranked: report.ranked,
                        };
                    }
                    tracing::warn!(
                        "Primary sources produced no scoreable tokens ({} answered, {} failed), trying fallback",
                        report.answered,
                        report.failed
                    );
                    state = ControllerState::Fallback { primary_answered: report.answered };
                }
                ControllerState::Fallback { primary_answered } => {
                    let report = self.run_stage(Stage::Fallback, &mut cache).await;
                    if !report.ranked.is_empty() {
                        return PipelineRun {
                            outcome: RunOutcome::EmptyPrimary(report.ranked.len()),
                            stage: Some(Stage::Fallback),
                            ranked: report.ranked,
                        };
                    }

                    let outcome = if primary_answered + report.answered == 0 {
                        RunOutcome::SourceError
                    } else {
                        RunOutcome::EmptyAll
                    };
                    tracing::warn!("{}", outcome);
                    return PipelineRun::empty(outcome);
                }
            }
        }
    }

    /// Collect, merge, score and rank one source chain
    pub async fn run_stage(&self, stage: Stage, cache: &mut BatchCache) -> StageReport {
        let (feeds, scorer) = match stage {
            Stage::Primary => (
                &self.primary,
                Scorer::new(self.settings.scoring_strategy, AmplitudeModel::OpenAnchored),
            ),
            Stage::Fallback => (
                &self.fallback,
                Scorer::new(ScoringStrategy::Earliness, AmplitudeModel::RangeProxy),
            ),
        };
        let scorer = scorer.with_highlight_fraction(self.settings.highlight_fraction);

        let collection = self.collect(feeds, cache).await;
        let raw_count = collection.snapshots.len();
        let merged = self.aggregator.merge(collection.snapshots);
        let merged_count = merged.len();
        let scored = scorer.score(merged);
        let ranked = rank(scored, self.settings.rank_key, self.settings.top_n);

        tracing::info!(
            "{} stage: {} snapshots, {} merged assets, {} ranked ({} sources answered, {} failed)",
            stage,
            raw_count,
            merged_count,
            ranked.len(),
            collection.answered,
            collection.failed
        );

        StageReport {
            stage,
            ranked,
            answered: collection.answered,
            failed: collection.failed,
        }
    }

    /// Fan out to every adapter concurrently and join in provider-list order.
    ///
    /// Each adapter gets at most `adapter_wait`; errors and timeouts degrade
    /// that adapter to an empty batch without touching its siblings. Feeds
    /// already in `cache` are not fetched again.
    pub async fn collect(&self, feeds: &[FeedHandle], cache: &mut BatchCache) -> Collection {
        let wait = self.settings.adapter_wait;

        let mut pending: Vec<&FeedHandle> = Vec::new();
        for feed in feeds {
            if cache.contains(feed) {
                tracing::debug!("Source {} already fetched this run, reusing its batch", feed.name());
            } else if !pending.iter().any(|p| Arc::ptr_eq(p, feed)) {
                pending.push(feed);
            }
        }

        let fetches = pending.into_iter().map(|feed| async move {
            let result = match tokio::time::timeout(wait, feed.fetch_batch()).await {
                Ok(result) => result,
                Err(_) => Err(FeedError::Timeout(wait.as_secs())),
            };
            (Arc::clone(feed), result)
        });

        for (feed, result) in join_all(fetches).await {
            let batch = match result {
                Ok(records) => Some(records),
                Err(e) => {
                    tracing::warn!("Source {} degraded to empty batch: {}", feed.name(), e);
                    None
                }
            };
            cache.entries.push((feed, batch));
        }

        let mut collection = Collection::default();
        for feed in feeds {
            match cache.get(feed) {
                Some(Some(records)) => {
                    let snapshots = normalize_batch(records);
                    tracing::debug!(
                        "Source {} returned {} records, {} normalized",
                        feed.name(),
                        records.len(),
                        snapshots.len()
                    );
                    collection.answered += 1;
                    collection.snapshots.extend(snapshots);
                }
                _ => collection.failed += 1,
            }
        }
        collection
    }
}
