//! Ranking Pipeline Integration Tests
//!
//! End-to-end checks of the public API, from raw provider records to the
//! ranked view:
//! 1. OKX perpetuals + CoinGecko trending -> merge -> score -> rank
//! 2. Primary -> fallback hand-over and the no-data outcomes
//! 3. RankingEngine query handling on top of a refresh
//!
//! All tests are deterministic (no real network calls) and use in-memory feeds.

use std::sync::Arc;

use momentum_radar::application::{
    FeedHandle, PipelineSettings, RankingEngine, RankingPipeline, RunOutcome,
};
use momentum_radar::domain::{Aggregator, Category, Stage, SourceFamily};
use momentum_radar::ports::mocks::StaticFeed;
use momentum_radar::ports::models::{
    CoinMarketRecord, OkxInstrument, OkxTicker, PerpetualTicker, RawFeedRecord,
};

// ============================================================================
// Test Fixtures
// ============================================================================

/// OKX perpetual: open 90, last 100, high 120, low 85
fn perpetual(inst_id: &str, base_volume: &str) -> RawFeedRecord {
    RawFeedRecord::Perpetual(PerpetualTicker {
        instrument: OkxInstrument {
            inst_id: inst_id.to_string(),
            inst_type: "SWAP".to_string(),
            state: "live".to_string(),
            ..Default::default()
        },
        ticker: OkxTicker {
            inst_id: inst_id.to_string(),
            last: "100".to_string(),
            open_24h: "90".to_string(),
            high_24h: "120".to_string(),
            low_24h: "85".to_string(),
            vol_ccy_24h: base_volume.to_string(),
        },
    })
}

fn coin(id: &str, symbol: &str, name: &str, volume: f64) -> CoinMarketRecord {
    CoinMarketRecord {
        id: id.to_string(),
        symbol: symbol.to_string(),
        name: name.to_string(),
        image: Some(format!("https://img.example/{}.png", id)),
        current_price: Some(110.0),
        market_cap: Some(volume * 10.0),
        total_volume: Some(volume),
        high_24h: Some(130.0),
        low_24h: Some(95.0),
        price_change_percentage_24h: Some(10.0),
        price_change_percentage_1h: Some(1.0),
        ..Default::default()
    }
}

fn feed(name: &'static str, family: SourceFamily, records: Vec<RawFeedRecord>) -> FeedHandle {
    Arc::new(StaticFeed::new(name, family).with_records(records))
}

fn pipeline(primary: Vec<FeedHandle>, fallback: Vec<FeedHandle>) -> RankingPipeline {
    RankingPipeline::new(primary, fallback, Aggregator::default(), PipelineSettings::default())
}

// ============================================================================
// Primary stage
// ============================================================================

#[tokio::test]
async fn test_primary_merges_sources_end_to_end() {
    let okx = feed(
        "okx",
        SourceFamily::Okx,
        vec![
            perpetual("SOL-USDT-SWAP", "1"),
            perpetual("SOL-USD-SWAP", "0.5"),
            perpetual("BTC-USDT-SWAP", "2"),
            perpetual("USDC-USDT-SWAP", "9"),
        ],
    );
    let trending = feed(
        "trending",
        SourceFamily::CoinGecko,
        vec![RawFeedRecord::Trending(coin("bitcoin", "btc", "Bitcoin", 5_000.0))],
    );

    let run = pipeline(vec![okx, trending], vec![]).run().await;
    assert_eq!(run.outcome, RunOutcome::Success(2));
    assert_eq!(run.stage, Some(Stage::Primary));

    // two SOL instruments on one venue: 100 + 50 quote volume
    let sol = run.ranked.iter().find(|t| t.symbol() == "SOL").unwrap();
    assert_eq!(sol.snapshot.volume_24h, 150.0);
    assert_eq!(sol.category, Category::Pumping);

    // the richer CoinGecko record wins and keeps its image and trending flag
    let btc = run.ranked.iter().find(|t| t.symbol() == "BTC").unwrap();
    assert_eq!(btc.display_name(), "Bitcoin");
    assert!(btc.snapshot.image_url.is_some());
    assert!(btc.snapshot.is_trending);

    // stablecoin perpetual is denylisted
    assert!(run.ranked.iter().all(|t| t.symbol() != "USDC"));

    for pair in run.ranked.windows(2) {
        assert!(pair[0].momentum_score >= pair[1].momentum_score);
    }
    assert_eq!(run.ranked.iter().filter(|t| t.highlighted).count(), 1);
}

#[tokio::test]
async fn test_completion_bounded_and_amplitude_positive() {
    let records = (0..30)
        .map(|i| {
            let mut record = coin(&format!("c{}", i), &format!("c{}", i), "Coin", 100.0 + i as f64);
            // some moves overshoot the recorded high
            record.high_24h = Some(105.0 + i as f64);
            RawFeedRecord::Listing(record)
        })
        .collect();

    let run = pipeline(vec![feed("listing", SourceFamily::CoinGecko, records)], vec![]).run().await;
    assert!(run.outcome.into_result().is_ok());
    for token in &run.ranked {
        assert!((0.0..=100.0).contains(&token.completion_pct));
        assert!(token.predicted_amplitude > 0.0);
    }
    assert_eq!(run.ranked.iter().filter(|t| t.highlighted).count(), 3);
}

// ============================================================================
// Fallback controller
// ============================================================================

#[tokio::test]
async fn test_fallback_used_when_primary_down() {
    let okx: FeedHandle = Arc::new(StaticFeed::new("okx", SourceFamily::Okx).failing("dns error"));
    let listing = feed(
        "listing",
        SourceFamily::CoinGecko,
        vec![
            RawFeedRecord::Listing(coin("ethereum", "eth", "Ethereum", 9_000.0)),
            RawFeedRecord::Listing(coin("tether", "usdt", "Tether", 90_000.0)),
        ],
    );

    let run = pipeline(vec![okx], vec![listing]).run().await;
    assert_eq!(run.outcome, RunOutcome::EmptyPrimary(1));
    assert_eq!(run.stage, Some(Stage::Fallback));
    assert_eq!(run.ranked[0].symbol(), "ETH");
}

#[tokio::test]
async fn test_all_sources_empty_reports_empty_all() {
    let run = pipeline(
        vec![feed("okx", SourceFamily::Okx, vec![]), feed("trending", SourceFamily::CoinGecko, vec![])],
        vec![feed("listing", SourceFamily::CoinGecko, vec![])],
    )
    .run()
    .await;

    assert_eq!(run.outcome, RunOutcome::EmptyAll);
    assert!(run.ranked.is_empty());
}

#[tokio::test]
async fn test_all_sources_failing_reports_source_error() {
    let down = |name| -> FeedHandle { Arc::new(StaticFeed::new(name, SourceFamily::CoinGecko).failing("timeout")) };
    let run = pipeline(vec![down("a")], vec![down("b")]).run().await;
    assert_eq!(run.outcome, RunOutcome::SourceError);
}

#[tokio::test]
async fn test_total_loss_record_is_ranked_without_overflow() {
    let mut rugged = coin("rug", "rug", "Rug Pull", 1_000.0);
    rugged.current_price = Some(0.001);
    rugged.price_change_percentage_24h = Some(-100.0);
    rugged.price_change_percentage_1h = None;
    rugged.high_24h = Some(1.0);
    rugged.low_24h = Some(0.0005);

    let run = pipeline(
        vec![feed("listing", SourceFamily::CoinGecko, vec![RawFeedRecord::Listing(rugged)])],
        vec![],
    )
    .run()
    .await;

    assert_eq!(run.outcome, RunOutcome::Success(1));
    let token = &run.ranked[0];
    assert_eq!(token.category, Category::Dumping);
    assert!(token.momentum_score.is_finite());
    assert!(token.completion_pct.is_finite());
}

// ============================================================================
// Engine
// ============================================================================

#[tokio::test]
async fn test_engine_query_applies_to_refreshed_population() {
    let listing = feed(
        "listing",
        SourceFamily::CoinGecko,
        vec![
            RawFeedRecord::Listing(coin("pepe", "pepe", "Pepe", 800.0)),
            RawFeedRecord::Listing(coin("dogwifcoin", "wif", "dogwifhat", 600.0)),
            RawFeedRecord::Listing(coin("bonk", "bonk", "Bonk", 400.0)),
        ],
    );
    let engine = RankingEngine::new(pipeline(vec![listing], vec![]));

    engine.set_query("HAT").await;
    assert_eq!(engine.refresh().await, RunOutcome::Success(3));

    let view = engine.ranked_view().await;
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].symbol(), "WIF");

    engine.set_query("").await;
    let symbols: Vec<String> = engine.ranked_view().await.iter().map(|t| t.symbol().to_string()).collect();
    assert_eq!(symbols, vec!["PEPE", "WIF", "BONK"]);

    let status = engine.status().await;
    assert_eq!(status.population, 3);
    assert_eq!(status.stage, Some(Stage::Primary));
}
