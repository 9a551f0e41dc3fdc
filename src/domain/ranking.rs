//! Ranking and Filtering
//!
//! Orders the scored population by the configured key, bounds it to the
//! top N and applies the live search query. `RankingState` owns the result;
//! presenters only ever read it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::token::ScoredToken;

/// Default number of tokens kept after ranking
pub const DEFAULT_TOP_N: usize = 100;

/// Sort key for the ranked view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankKey {
    #[default]
    MomentumScore,
    CompletionPct,
    Volume,
}

impl RankKey {
    fn value(&self, token: &ScoredToken) -> f64 {
        match self {
            RankKey::MomentumScore => token.momentum_score,
            RankKey::CompletionPct => token.completion_pct,
            RankKey::Volume => token.snapshot.volume_24h,
        }
    }
}

/// Which source chain produced the current population
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Primary,
    Fallback,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Primary => write!(f, "primary"),
            Stage::Fallback => write!(f, "fallback"),
        }
    }
}

/// Stable descending sort by `key`, truncated to `top_n`
pub fn rank(mut population: Vec<ScoredToken>, key: RankKey, top_n: usize) -> Vec<ScoredToken> {
    population.sort_by(|a, b| key.value(b).total_cmp(&key.value(a)));
    population.truncate(top_n);
    population
}

/// Case-insensitive substring match on name or symbol, order preserved.
/// An empty (or blank) query returns the population unchanged.
pub fn filter(population: &[ScoredToken], query: &str) -> Vec<ScoredToken> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return population.to_vec();
    }
    population
        .iter()
        .filter(|token| token.matches(&needle))
        .cloned()
        .collect()
}

/// Current ranked population plus the filtered view derived from it
#[derive(Debug, Clone, Default)]
pub struct RankingState {
    population: Vec<ScoredToken>,
    query: String,
    view: Vec<ScoredToken>,
    stage: Option<Stage>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl RankingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a freshly ranked population in one step and rebuild the view
    pub fn replace_population(&mut self, ranked: Vec<ScoredToken>, stage: Stage) {
        self.population = ranked;
        self.stage = Some(stage);
        self.refreshed_at = Some(Utc::now());
        self.view = filter(&self.population, &self.query);
    }

    /// Record a run that produced no data: empty population, no stage
    pub fn clear_population(&mut self) {
        self.population.clear();
        self.view.clear();
        self.stage = None;
        self.refreshed_at = Some(Utc::now());
    }

    /// Update the live query and recompute the view
    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.view = filter(&self.population, &self.query);
    }

    pub fn view(&self) -> &[ScoredToken] {
        &self.view
    }

    pub fn population(&self) -> &[ScoredToken] {
        &self.population
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn stage(&self) -> Option<Stage> {
        self.stage
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }
}
