//! Raw feed models
//!
//! Wire shapes returned by upstream market-data providers. These are owned
//! transiently by the adapter that fetched them and are discarded once the
//! normalizer has mapped them into `MarketSnapshot`s.

use serde::{Deserialize, Serialize};

/// CoinGecko `/coins/markets` entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoinMarketRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    pub image: Option<String>,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub market_cap_rank: Option<u32>,
    pub total_volume: Option<f64>,
    pub high_24h: Option<f64>,
    pub low_24h: Option<f64>,
    pub price_change_percentage_1h: Option<f64>,
    pub price_change_percentage_24h: Option<f64>,
    pub price_change_percentage_1h_in_currency: Option<f64>,
    pub price_change_percentage_24h_in_currency: Option<f64>,
}

/// CoinGecko `/search/trending` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrendingResponse {
    #[serde(default)]
    pub coins: Vec<TrendingCoin>,
}

/// Wrapper around a trending item
#[derive(Debug, Clone, Deserialize)]
pub struct TrendingCoin {
    pub item: TrendingItem,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrendingItem {
    pub id: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    pub large: Option<String>,
    pub market_cap_rank: Option<u32>,
}

/// OKX v5 response envelope. `code == "0"` means success.
#[derive(Debug, Clone, Deserialize)]
pub struct OkxEnvelope<T> {
    pub code: String,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub data: Vec<T>,
}

/// OKX `/public/instruments` descriptor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OkxInstrument {
    #[serde(rename = "instId")]
    pub inst_id: String,
    #[serde(rename = "instType", default)]
    pub inst_type: String,
    #[serde(default)]
    pub state: String,
    #[serde(rename = "ctValCcy", default)]
    pub ct_val_ccy: String,
    #[serde(rename = "settleCcy", default)]
    pub settle_ccy: String,
    #[serde(default)]
    pub uly: String,
}

impl OkxInstrument {
    /// Live perpetual swap
    pub fn is_live_perpetual(&self) -> bool {
        self.inst_type.eq_ignore_ascii_case("SWAP") && self.state.eq_ignore_ascii_case("live")
    }

    /// Base currency, taken from the underlying ("BTC-USDT") or the
    /// instrument id ("BTC-USD-SWAP"). `ctValCcy` is the quote on inverse
    /// contracts so it is not used here.
    pub fn base_currency(&self) -> Option<&str> {
        let source = if self.uly.is_empty() { &self.inst_id } else { &self.uly };
        source.split('-').next().filter(|base| !base.is_empty())
    }
}

/// OKX `/market/tickers` entry. Numbers arrive as strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OkxTicker {
    #[serde(rename = "instId")]
    pub inst_id: String,
    #[serde(default)]
    pub last: String,
    #[serde(rename = "open24h", default)]
    pub open_24h: String,
    #[serde(rename = "high24h", default)]
    pub high_24h: String,
    #[serde(rename = "low24h", default)]
    pub low_24h: String,
    /// 24h volume in base currency
    #[serde(rename = "volCcy24h", default)]
    pub vol_ccy_24h: String,
}

/// A live perpetual instrument joined with its ticker
#[derive(Debug, Clone, PartialEq)]
pub struct PerpetualTicker {
    pub instrument: OkxInstrument,
    pub ticker: OkxTicker,
}

/// Source-specific raw record handed from an adapter to the normalizer
#[derive(Debug, Clone, PartialEq)]
pub enum RawFeedRecord {
    /// General market listing entry
    Listing(CoinMarketRecord),
    /// Market listing entry resolved from the trending directory
    Trending(CoinMarketRecord),
    /// Derivatives venue perpetual
    Perpetual(PerpetualTicker),
}

impl RawFeedRecord {
    pub fn kind(&self) -> &'static str {
        match self {
            RawFeedRecord::Listing(_) => "listing",
            RawFeedRecord::Trending(_) => "trending",
            RawFeedRecord::Perpetual(_) => "perpetual",
        }
    }
}
