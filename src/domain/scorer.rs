//! Momentum Scorer
//!
//! Classifies each merged snapshot, estimates how far its current move has
//! already travelled and computes a momentum score that rewards liquidity,
//! magnitude and earliness.
//!
//! For the default strategy:
//!
//! ```text
//! open        = price / (1 + change24h/100)      (price when change24h = -100)
//! amplitude   = high24h - open   (pumping)
//!             = open - low24h    (dumping)
//! completion  = clamp(|price - open| / amplitude * 100, 0, 100)
//! momentum    = volume/maxVolume * |shortChange| * (1 - completion/100)
//! ```
//!
//! Records without the inputs, or with a non-positive amplitude, are dropped
//! rather than scored as zero.

use serde::{Deserialize, Serialize};

use super::snapshot::MarketSnapshot;
use super::token::{Category, ScoredToken};

/// Default share of the population flagged as highlighted
pub const DEFAULT_HIGHLIGHT_FRACTION: f64 = 0.10;

/// How the liquidity weight of the momentum score is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringStrategy {
    /// volume share x |change| x earliness
    #[default]
    Earliness,
    /// volume/market-cap turnover share instead of raw volume share
    Turnover,
    /// earliness score weighted by the amplitude as a % of open
    Amplitude,
}

/// How the predicted amplitude and completion are estimated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmplitudeModel {
    /// Anchored on the estimated 24h open (primary sources)
    #[default]
    OpenAnchored,
    /// Full 24h high-low range with a 1h-move completion proxy (fallback)
    RangeProxy,
}

/// Per-record output of steps 1-3
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub category: Category,
    pub short_change: f64,
    pub open_price: f64,
    pub predicted_amplitude: f64,
    pub completion_pct: f64,
}

#[derive(Debug, Clone)]
pub struct Scorer {
    strategy: ScoringStrategy,
    model: AmplitudeModel,
    highlight_fraction: f64,
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(ScoringStrategy::default(), AmplitudeModel::default())
    }
}

impl Scorer {
    pub fn new(strategy: ScoringStrategy, model: AmplitudeModel) -> Self {
        Self {
            strategy,
            model,
            highlight_fraction: DEFAULT_HIGHLIGHT_FRACTION,
        }
    }

    /// Override the highlighted share of the population
    pub fn with_highlight_fraction(mut self, fraction: f64) -> Self {
        self.highlight_fraction = fraction;
        self
    }

    pub fn strategy(&self) -> ScoringStrategy {
        self.strategy
    }

    pub fn model(&self) -> AmplitudeModel {
        self.model
    }

    /// Category, amplitude and completion for one snapshot
    pub fn measure(&self, snap: &MarketSnapshot) -> Option<Measurement> {
        if !snap.is_scoreable() {
            return None;
        }
        let short_change = snap.short_horizon_change()?;
        let category = Category::from_change(short_change);
        let open_price = snap.open_price();
        let high = snap.high_24h?;
        let low = snap.low_24h?;

        let (predicted_amplitude, progress) = match self.model {
            AmplitudeModel::OpenAnchored => {
                let amplitude = match category {
                    Category::Pumping => high - open_price,
                    Category::Dumping => open_price - low,
                    Category::Neutral => (high - open_price).max(open_price - low),
                };
                (amplitude, (snap.price - open_price).abs())
            }
            AmplitudeModel::RangeProxy => {
                let open_1h = match snap.change_pct_1h {
                    Some(change) if change != -100.0 => snap.price / (1.0 + change / 100.0),
                    Some(_) => snap.price,
                    None => open_price,
                };
                (high - low, (snap.price - open_1h).abs())
            }
        };

        // flat or inverted range carries no signal
        if !(predicted_amplitude.is_finite() && predicted_amplitude > 0.0) {
            return None;
        }

        let completion_pct = (progress / predicted_amplitude * 100.0).clamp(0.0, 100.0);
        if !completion_pct.is_finite() {
            return None;
        }

        Some(Measurement {
            category,
            short_change,
            open_price,
            predicted_amplitude,
            completion_pct,
        })
    }

    /// Score a merged population.
    ///
    /// Returns the survivors sorted by momentum (descending, stable) with the
    /// top share flagged as highlighted.
    pub fn score(&self, population: Vec<MarketSnapshot>) -> Vec<ScoredToken> {
        let measured: Vec<(MarketSnapshot, Measurement)> = population
            .into_iter()
            .filter_map(|snap| {
                let measurement = self.measure(&snap);
                if measurement.is_none() {
                    tracing::debug!("Unscoreable record {} dropped", snap.asset_key);
                }
                measurement.map(|m| (snap, m))
            })
            .collect();

        let max_volume = measured
            .iter()
            .map(|(s, _)| s.volume_24h)
            .fold(0.0_f64, f64::max);
        let max_turnover = measured
            .iter()
            .map(|(s, _)| turnover(s))
            .fold(0.0_f64, f64::max);

        let mut scored: Vec<ScoredToken> = measured
            .into_iter()
            .map(|(snap, m)| {
                let weight = match self.strategy {
                    ScoringStrategy::Earliness => share(snap.volume_24h, max_volume),
                    ScoringStrategy::Turnover => share(turnover(&snap), max_turnover),
                    ScoringStrategy::Amplitude => {
                        let amplitude_pct = if m.open_price > 0.0 {
                            m.predicted_amplitude / m.open_price * 100.0
                        } else {
                            0.0
                        };
                        share(snap.volume_24h, max_volume) * amplitude_pct
                    }
                };
                let earliness = 1.0 - m.completion_pct / 100.0;
                let momentum = weight * m.short_change.abs() * earliness;

                ScoredToken {
                    snapshot: snap,
                    category: m.category,
                    completion_pct: m.completion_pct,
                    predicted_amplitude: m.predicted_amplitude,
                    momentum_score: if momentum.is_finite() { momentum.max(0.0) } else { 0.0 },
                    highlighted: false,
                }
            })
            .collect();

        scored.sort_by(|a, b| b.momentum_score.total_cmp(&a.momentum_score));

        let highlighted = highlight_count(scored.len(), self.highlight_fraction);
        for token in scored.iter_mut().take(highlighted) {
            token.highlighted = true;
        }

        scored
    }
}

/// `max(1, round(n * fraction))` for a non-empty population, 0 otherwise
pub fn highlight_count(population: usize, fraction: f64) -> usize {
    if population == 0 {
        return 0;
    }
    let count = (population as f64 * fraction).round() as usize;
    count.clamp(1, population)
}

fn share(value: f64, max: f64) -> f64 {
    if max > 0.0 {
        value / max
    } else {
        0.0
    }
}

fn turnover(snap: &MarketSnapshot) -> f64 {
    if snap.market_cap > 0.0 {
        snap.volume_24h / snap.market_cap
    } else {
        0.0
    }
}
