//! Ranking Engine
//!
//! Owns the `RankingState` and drives the pipeline. Refreshes follow a
//! cancel-and-restart policy: a new `refresh()` cancels the run in flight,
//! and a run only commits if it is still the latest one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use super::pipeline::{PipelineError, RankingPipeline, RunOutcome};
use crate::config::Config;
use crate::domain::{RankingState, ScoredToken, Stage};
use crate::ports::Presenter;

/// Default pause between refreshes in watch mode
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub is_running: bool,
    pub stage: Option<Stage>,
    pub population: usize,
    pub visible: usize,
    pub query: String,
    pub refreshed_at: Option<DateTime<Utc>>,
    pub generation: u64,
}

pub struct RankingEngine {
    pipeline: Arc<RankingPipeline>,
    state: Arc<RwLock<RankingState>>,
    generation: Arc<AtomicU64>,
    in_flight: Arc<Mutex<CancellationToken>>,
    is_running: Arc<RwLock<bool>>,
    shutdown: CancellationToken,
    refresh_interval: Duration,
}

impl RankingEngine {
    pub fn new(pipeline: RankingPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            state: Arc::new(RwLock::new(RankingState::new())),
            generation: Arc::new(AtomicU64::new(0)),
            in_flight: Arc::new(Mutex::new(CancellationToken::new())),
            is_running: Arc::new(RwLock::new(false)),
            shutdown: CancellationToken::new(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }

    /// Engine wired to the live sources in `config`
    pub fn from_config(config: &Config) -> Result<Self, PipelineError> {
        Ok(Self::new(RankingPipeline::from_config(config)?))
    }

    /// Set custom refresh interval for `run`
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Run one pipeline cycle and commit its result to the ranking state.
    ///
    /// Any refresh still in flight is cancelled and reports `Superseded`.
    pub async fn refresh(&self) -> RunOutcome {
        let token = CancellationToken::new();
        let generation = {
            let mut in_flight = self.in_flight.lock().await;
            in_flight.cancel();
            *in_flight = token.clone();
            self.generation.fetch_add(1, Ordering::SeqCst) + 1
        };

        tracing::debug!("Refresh #{} started", generation);

        let run = tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::info!("Refresh #{} superseded before completion", generation);
                return RunOutcome::Superseded;
            }
            run = self.pipeline.run() => run,
        };

        let mut state = self.state.write().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::info!("Refresh #{} finished after a newer run started, discarding", generation);
            return RunOutcome::Superseded;
        }

        match run.stage {
            Some(stage) => state.replace_population(run.ranked, stage),
            None => state.clear_population(),
        }

        tracing::info!("Refresh #{}: {}", generation, run.outcome);
        run.outcome
    }

    /// Current ranked and filtered view
    pub async fn ranked_view(&self) -> Vec<ScoredToken> {
        self.state.read().await.view().to_vec()
    }

    /// Update the live filter; the view is recomputed before this returns
    pub async fn set_query(&self, query: &str) {
        self.state.write().await.set_query(query);
    }

    /// Which chain produced the current population
    pub async fn stage(&self) -> Option<Stage> {
        self.state.read().await.stage()
    }

    /// Hand the current view to a presenter
    pub async fn present(&self, presenter: &dyn Presenter) {
        let state = self.state.read().await;
        presenter.render(state.view(), state.query());
    }

    /// Refresh and present in a loop until `stop` is called
    pub async fn run(&self, presenter: &dyn Presenter) {
        *self.is_running.write().await = true;

        tracing::info!(
            "Starting ranking engine - refresh interval: {:?}",
            self.refresh_interval
        );

        while *self.is_running.read().await && !self.shutdown.is_cancelled() {
            let outcome = self.refresh().await;
            if outcome != RunOutcome::Superseded {
                self.present(presenter).await;
            }
            tokio::select! {
                _ = tokio::time::sleep(self.refresh_interval) => {}
                _ = self.shutdown.cancelled() => break,
            }
        }
        *self.is_running.write().await = false;

        tracing::info!("Ranking engine stopped");
    }

    /// Stop the refresh loop and cancel any run in flight. Final for this engine.
    pub async fn stop(&self) {
        *self.is_running.write().await = false;
        self.shutdown.cancel();
        self.in_flight.lock().await.cancel();
        tracing::info!("Stop signal sent to ranking engine");
    }

    /// Get current status snapshot
    pub async fn status(&self) -> EngineStatus {
        let state = self.state.read().await;
        EngineStatus {
            is_running: *self.is_running.read().await,
            stage: state.stage(),
            population: state.population().len(),
            visible: state.view().len(),
            query: state.query().to_string(),
            refreshed_at: state.refreshed_at(),
            generation: self.generation.load(Ordering::SeqCst),
        }
    }
}

// Shares state with the original (needed for refresh triggers from other tasks)
impl Clone for RankingEngine {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
            state: Arc::clone(&self.state),
            generation: Arc::clone(&self.generation),
            in_flight: Arc::clone(&self.in_flight),
            is_running: Arc::clone(&self.is_running),
            shutdown: self.shutdown.clone(),
            refresh_interval: self.refresh_interval,
        }
    }
}
