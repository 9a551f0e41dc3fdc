//! Market Snapshot
//!
//! The normalized unit every source adapter's raw records are mapped into.
//! Snapshots live for a single refresh cycle and are discarded once scored.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Upstream provider family a record came from
///
/// Volumes are only summed between records of the same family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFamily {
    CoinGecko,
    Okx,
}

impl fmt::Display for SourceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFamily::CoinGecko => write!(f, "coingecko"),
            SourceFamily::Okx => write!(f, "okx"),
        }
    }
}

/// Where a snapshot came from, used by the aggregator's merge rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceTag {
    pub family: SourceFamily,
    /// Provider-side asset identity (CoinGecko coin id, OKX base currency)
    pub provider_id: String,
    /// Tradable instrument identity (OKX instId, CoinGecko coin id)
    pub instrument_id: String,
}

/// Normalized market record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Lower-cased merge key; not globally unique across providers
    pub asset_key: String,
    pub display_name: String,
    pub symbol: String,
    pub image_url: Option<String>,
    pub price: f64,
    pub volume_24h: f64,
    /// 0.0 when unknown
    pub market_cap: f64,
    pub change_pct_1h: Option<f64>,
    pub change_pct_24h: Option<f64>,
    pub high_24h: Option<f64>,
    pub low_24h: Option<f64>,
    pub is_trending: bool,
    pub source: SourceTag,
}

impl MarketSnapshot {
    /// Short-horizon change: 1h when available, otherwise 24h
    pub fn short_horizon_change(&self) -> Option<f64> {
        self.change_pct_1h.or(self.change_pct_24h)
    }

    /// Estimated 24h open price.
    ///
    /// `price / (1 + change/100)`, or the current price when the 24h change
    /// is exactly -100% (or unknown) so the division never blows up.
    pub fn open_price(&self) -> f64 {
        match self.change_pct_24h {
            Some(change) if change != -100.0 => self.price / (1.0 + change / 100.0),
            _ => self.price,
        }
    }

    /// Eligible for scoring: positive price and at least one change figure
    pub fn is_scoreable(&self) -> bool {
        self.price.is_finite()
            && self.price > 0.0
            && self.short_horizon_change().is_some()
    }

    /// How much presentation metadata this record carries.
    /// Used to prefer the richer record in cross-provider merges.
    pub fn richness(&self) -> u8 {
        let mut score = 0;
        if self.image_url.as_deref().is_some_and(|u| !u.is_empty()) {
            score += 4;
        }
        if !self.display_name.is_empty() && !self.display_name.eq_ignore_ascii_case(&self.symbol) {
            score += 2;
        }
        if self.change_pct_1h.is_some() {
            score += 1;
        }
        score
    }

    /// Fill optional fields that are missing here from another record
    pub fn fill_missing_from(&mut self, other: &MarketSnapshot) {
        if self.image_url.as_deref().map_or(true, str::is_empty) {
            self.image_url = other.image_url.clone().filter(|u| !u.is_empty());
        }
        if self.display_name.is_empty() {
            self.display_name = other.display_name.clone();
        }
        if self.market_cap <= 0.0 {
            self.market_cap = other.market_cap;
        }
        self.change_pct_1h = self.change_pct_1h.or(other.change_pct_1h);
        self.change_pct_24h = self.change_pct_24h.or(other.change_pct_24h);
        self.high_24h = self.high_24h.or(other.high_24h);
        self.low_24h = self.low_24h.or(other.low_24h);
        self.is_trending |= other.is_trending;
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Minimal snapshot with sensible defaults for tests
    pub fn snapshot(symbol: &str, price: f64, volume: f64) -> MarketSnapshot {
        MarketSnapshot {
            asset_key: symbol.to_lowercase(),
            display_name: symbol.to_uppercase(),
            symbol: symbol.to_uppercase(),
            image_url: None,
            price,
            volume_24h: volume,
            market_cap: 0.0,
            change_pct_1h: None,
            change_pct_24h: Some(0.0),
            high_24h: Some(price),
            low_24h: Some(price),
            is_trending: false,
            source: SourceTag {
                family: SourceFamily::Okx,
                provider_id: symbol.to_uppercase(),
                instrument_id: format!("{}-USDT-SWAP", symbol.to_uppercase()),
            },
        }
    }
}
