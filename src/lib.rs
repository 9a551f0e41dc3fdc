//! Momentum Radar - early-move ranking for crypto markets
//!
//! Pulls market data from several public sources, merges it per asset and
//! ranks assets by how far their current move still has to run.
//!
//! # Modules
//!
//! - `domain`: Core ranking logic (Normalizer, Aggregator, Scorer, RankingState)
//! - `ports`: Trait abstractions (MarketFeed, Presenter) and wire models
//! - `adapters`: External implementations (OKX, CoinGecko, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Pipeline with primary/fallback stages and the ranking engine

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod config;
pub mod application;
