//! Market Data Adapters
//!
//! `MarketFeed` implementations backed by public REST APIs:
//! - `OkxPerpetuals`: live perpetual swaps with 24h tickers (primary)
//! - `CoinGeckoTrending`: trending directory resolved to market records
//! - `CoinGeckoListing`: broad top-volume listing (fallback)
//!
//! All adapters are read-only and unauthenticated, with one attempt per
//! refresh cycle and an explicit request timeout.

mod http;
mod coingecko;
mod okx;

#[cfg(test)]
mod test_server;

pub use coingecko::{trending_ids, CoinGeckoClient, CoinGeckoListing, CoinGeckoTrending};
pub use okx::{join_live_perpetuals, OkxPerpetuals};
