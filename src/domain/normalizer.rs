//! Normalizer
//!
//! Pure mapping from each provider's raw schema into `MarketSnapshot`.
//! A record with a missing or invalid required field is rejected with a
//! `SchemaGap`; the caller drops that record and keeps the rest of the batch.

use thiserror::Error;

use super::snapshot::{MarketSnapshot, SourceFamily, SourceTag};
use crate::ports::models::{CoinMarketRecord, PerpetualTicker, RawFeedRecord};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum NormalizeError {
    #[error("Schema gap in {kind} record {id:?}: missing or invalid `{field}`")]
    SchemaGap {
        kind: &'static str,
        id: String,
        field: &'static str,
    },
}

/// Map one raw record into a snapshot
pub fn normalize(raw: &RawFeedRecord) -> Result<MarketSnapshot, NormalizeError> {
    match raw {
        RawFeedRecord::Listing(record) => normalize_coin_market(record, false),
        RawFeedRecord::Trending(record) => normalize_coin_market(record, true),
        RawFeedRecord::Perpetual(perp) => normalize_perpetual(perp),
    }
}

/// Normalize a whole batch, dropping records with schema gaps
pub fn normalize_batch(records: &[RawFeedRecord]) -> Vec<MarketSnapshot> {
    records
        .iter()
        .filter_map(|raw| match normalize(raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::debug!("Dropping record: {}", e);
                None
            }
        })
        .collect()
}

fn normalize_coin_market(
    record: &CoinMarketRecord,
    trending: bool,
) -> Result<MarketSnapshot, NormalizeError> {
    let kind = if trending { "trending" } else { "listing" };
    let gap = |field| NormalizeError::SchemaGap { kind, id: record.id.clone(), field };

    let symbol = record.symbol.trim();
    if symbol.is_empty() {
        return Err(gap("symbol"));
    }

    let price = record
        .current_price
        .filter(|p| p.is_finite() && *p > 0.0)
        .ok_or_else(|| gap("current_price"))?;

    let volume_24h = match record.total_volume {
        None => 0.0,
        Some(v) if v.is_finite() && v >= 0.0 => v,
        Some(_) => return Err(gap("total_volume")),
    };

    // "in_currency" variants take precedence over the generic field
    let change_pct_24h = record
        .price_change_percentage_24h_in_currency
        .or(record.price_change_percentage_24h)
        .filter(|c| c.is_finite())
        .ok_or_else(|| gap("price_change_percentage_24h"))?;

    let change_pct_1h = record
        .price_change_percentage_1h_in_currency
        .or(record.price_change_percentage_1h)
        .filter(|c| c.is_finite());

    let display_name = if record.name.trim().is_empty() {
        symbol.to_uppercase()
    } else {
        record.name.trim().to_string()
    };

    Ok(MarketSnapshot {
        asset_key: symbol.to_lowercase(),
        display_name,
        symbol: symbol.to_uppercase(),
        image_url: record.image.clone().filter(|url| !url.trim().is_empty()),
        price,
        volume_24h,
        market_cap: record.market_cap.filter(|m| m.is_finite() && *m >= 0.0).unwrap_or(0.0),
        change_pct_1h,
        change_pct_24h: Some(change_pct_24h),
        high_24h: positive(record.high_24h),
        low_24h: positive(record.low_24h),
        is_trending: trending,
        source: SourceTag {
            family: SourceFamily::CoinGecko,
            provider_id: record.id.clone(),
            instrument_id: record.id.clone(),
        },
    })
}

fn normalize_perpetual(perp: &PerpetualTicker) -> Result<MarketSnapshot, NormalizeError> {
    let ticker = &perp.ticker;
    let gap = |field| NormalizeError::SchemaGap {
        kind: "perpetual",
        id: ticker.inst_id.clone(),
        field,
    };

    let base = perp.instrument.base_currency().ok_or_else(|| gap("instId"))?;
    let last = positive(parse_number(&ticker.last)).ok_or_else(|| gap("last"))?;
    let open = positive(parse_number(&ticker.open_24h)).ok_or_else(|| gap("open24h"))?;

    let base_volume = if ticker.vol_ccy_24h.trim().is_empty() {
        0.0
    } else {
        parse_number(&ticker.vol_ccy_24h)
            .filter(|v| *v >= 0.0)
            .ok_or_else(|| gap("volCcy24h"))?
    };

    let symbol = base.to_uppercase();

    Ok(MarketSnapshot {
        asset_key: base.to_lowercase(),
        display_name: symbol.clone(),
        symbol: symbol.clone(),
        image_url: None,
        price: last,
        // quote-converted so it is comparable with listing volumes
        volume_24h: base_volume * last,
        market_cap: 0.0,
        change_pct_1h: None,
        change_pct_24h: Some((last - open) / open * 100.0),
        high_24h: positive(parse_number(&ticker.high_24h)),
        low_24h: positive(parse_number(&ticker.low_24h)),
        is_trending: false,
        source: SourceTag {
            family: SourceFamily::Okx,
            provider_id: symbol,
            instrument_id: ticker.inst_id.clone(),
        },
    })
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}
