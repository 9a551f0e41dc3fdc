//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Market Data: OKX and CoinGecko source adapters
//! - CLI: Command-line interface and terminal presenter

pub mod cli;
pub mod market_data;

pub use cli::{CliApp, TablePresenter};
pub use market_data::{CoinGeckoClient, CoinGeckoListing, CoinGeckoTrending, OkxPerpetuals};
