//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement.
//! Following hexagonal architecture, these traits abstract:
//! - Market data feeds (listings, tickers, trending directories)
//! - The presenter that displays the ranked view

pub mod market_feed;
pub mod models;
pub mod presenter;
pub mod mocks;

pub use market_feed::{FeedError, MarketFeed};
pub use models::RawFeedRecord;
pub use presenter::Presenter;
