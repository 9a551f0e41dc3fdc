//! OKX Perpetuals Adapter
//!
//! Two-stage fetch against the OKX v5 public API:
//! 1. `/api/v5/public/instruments?instType=SWAP` selects live perpetuals
//! 2. `/api/v5/market/tickers?instType=SWAP` supplies last/open/high/low/volume
//!
//! Stage 2 is skipped when no live perpetual survives stage 1.

use std::collections::HashMap;
use std::time::Duration;
use async_trait::async_trait;
use reqwest::Client;

use super::http::{build_client, endpoint, get_json};
use crate::domain::SourceFamily;
use crate::ports::models::{OkxEnvelope, OkxInstrument, OkxTicker, PerpetualTicker, RawFeedRecord};
use crate::ports::{FeedError, MarketFeed};

const INSTRUMENTS_PATH: &str = "api/v5/public/instruments";
const TICKERS_PATH: &str = "api/v5/market/tickers";

#[derive(Debug, Clone)]
pub struct OkxPerpetuals {
    http: Client,
    base_url: String,
}

impl OkxPerpetuals {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FeedError> {
        Ok(Self {
            http: build_client(timeout)?,
            base_url: base_url.to_string(),
        })
    }

    async fn fetch_instruments(&self) -> Result<Vec<OkxInstrument>, FeedError> {
        let envelope: OkxEnvelope<OkxInstrument> = get_json(
            &self.http,
            &endpoint(&self.base_url, INSTRUMENTS_PATH),
            &[("instType", "SWAP".to_string())],
        )
        .await?;
        unwrap_envelope(envelope, "instruments")
    }

    async fn fetch_tickers(&self) -> Result<Vec<OkxTicker>, FeedError> {
        let envelope: OkxEnvelope<OkxTicker> = get_json(
            &self.http,
            &endpoint(&self.base_url, TICKERS_PATH),
            &[("instType", "SWAP".to_string())],
        )
        .await?;
        unwrap_envelope(envelope, "tickers")
    }
}

#[async_trait]
impl MarketFeed for OkxPerpetuals {
    fn name(&self) -> &'static str {
        "okx-perpetuals"
    }

    fn family(&self) -> SourceFamily {
        SourceFamily::Okx
    }

    async fn fetch_batch(&self) -> Result<Vec<RawFeedRecord>, FeedError> {
        let live: Vec<OkxInstrument> = self
            .fetch_instruments()
            .await?
            .into_iter()
            .filter(OkxInstrument::is_live_perpetual)
            .collect();

        if live.is_empty() {
            tracing::debug!("No live perpetuals listed, skipping ticker fetch");
            return Ok(Vec::new());
        }

        let tickers = self.fetch_tickers().await?;
        Ok(join_live_perpetuals(live, tickers)
            .into_iter()
            .map(RawFeedRecord::Perpetual)
            .collect())
    }
}

/// OKX signals API-level failures in the body with a non-"0" code
fn unwrap_envelope<T>(envelope: OkxEnvelope<T>, endpoint: &str) -> Result<Vec<T>, FeedError> {
    if envelope.code != "0" {
        return Err(FeedError::Parse(format!(
            "okx {} returned code {}: {}",
            endpoint, envelope.code, envelope.msg
        )));
    }
    Ok(envelope.data)
}

/// Pair each ticker with its live instrument, in ticker order.
/// Tickers without a live instrument are dropped.
pub fn join_live_perpetuals(
    instruments: Vec<OkxInstrument>,
    tickers: Vec<OkxTicker>,
) -> Vec<PerpetualTicker> {
    let mut by_id: HashMap<String, OkxInstrument> = instruments
        .into_iter()
        .filter(OkxInstrument::is_live_perpetual)
        .map(|inst| (inst.inst_id.clone(), inst))
        .collect();

    tickers
        .into_iter()
        .filter_map(|ticker| {
            let instrument = by_id.remove(&ticker.inst_id)?;
            Some(PerpetualTicker { instrument, ticker })
        })
        .collect()
}
