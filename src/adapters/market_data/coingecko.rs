//! CoinGecko Adapters
//!
//! - `CoinGeckoListing`: top-volume market listing, the broad fallback source
//! - `CoinGeckoTrending`: two-stage adapter. Stage 1 reads the trending
//!   directory for coin ids, stage 2 requests market records for those ids.
//!   Stage 2 is skipped when stage 1 comes back empty.

use std::time::Duration;
use async_trait::async_trait;
use reqwest::Client;

use super::http::{build_client, endpoint, get_json};
use crate::domain::SourceFamily;
use crate::ports::models::{CoinMarketRecord, RawFeedRecord, TrendingResponse};
use crate::ports::{FeedError, MarketFeed};

/// Shared CoinGecko v3 client
#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    http: Client,
    base_url: String,
    vs_currency: String,
}

impl CoinGeckoClient {
    pub fn new(base_url: &str, vs_currency: &str, timeout: Duration) -> Result<Self, FeedError> {
        Ok(Self {
            http: build_client(timeout)?,
            base_url: base_url.to_string(),
            vs_currency: vs_currency.to_lowercase(),
        })
    }

    /// `/coins/markets`, optionally restricted to a set of ids
    pub async fn fetch_markets(
        &self,
        ids: Option<&[String]>,
        per_page: u32,
    ) -> Result<Vec<CoinMarketRecord>, FeedError> {
        let mut query = vec![
            ("vs_currency", self.vs_currency.clone()),
            ("order", "volume_desc".to_string()),
            ("per_page", per_page.to_string()),
            ("page", "1".to_string()),
            ("sparkline", "false".to_string()),
            ("price_change_percentage", "1h,24h".to_string()),
        ];
        if let Some(ids) = ids {
            query.push(("ids", ids.join(",")));
        }

        get_json(&self.http, &endpoint(&self.base_url, "coins/markets"), &query).await
    }

    /// `/search/trending`, reduced to coin ids
    pub async fn fetch_trending_ids(&self) -> Result<Vec<String>, FeedError> {
        let response: TrendingResponse =
            get_json(&self.http, &endpoint(&self.base_url, "search/trending"), &[]).await?;
        Ok(trending_ids(&response))
    }
}

/// Unique, non-empty ids in directory order
pub fn trending_ids(response: &TrendingResponse) -> Vec<String> {
    let mut ids: Vec<String> = Vec::with_capacity(response.coins.len());
    for coin in &response.coins {
        let id = coin.item.id.trim();
        if !id.is_empty() && !ids.iter().any(|existing| existing == id) {
            ids.push(id.to_string());
        }
    }
    ids
}

/// Broad top-volume market listing
#[derive(Debug, Clone)]
pub struct CoinGeckoListing {
    client: CoinGeckoClient,
    per_page: u32,
}

impl CoinGeckoListing {
    pub fn new(client: CoinGeckoClient, per_page: u32) -> Self {
        Self { client, per_page }
    }
}

#[async_trait]
impl MarketFeed for CoinGeckoListing {
    fn name(&self) -> &'static str {
        "coingecko-listing"
    }

    fn family(&self) -> SourceFamily {
        SourceFamily::CoinGecko
    }

    async fn fetch_batch(&self) -> Result<Vec<RawFeedRecord>, FeedError> {
        let records = self.client.fetch_markets(None, self.per_page).await?;
        Ok(records.into_iter().map(RawFeedRecord::Listing).collect())
    }
}

/// Trending coins resolved to full market records
#[derive(Debug, Clone)]
pub struct CoinGeckoTrending {
    client: CoinGeckoClient,
}

impl CoinGeckoTrending {
    pub fn new(client: CoinGeckoClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MarketFeed for CoinGeckoTrending {
    fn name(&self) -> &'static str {
        "coingecko-trending"
    }

    fn family(&self) -> SourceFamily {
        SourceFamily::CoinGecko
    }

    async fn fetch_batch(&self) -> Result<Vec<RawFeedRecord>, FeedError> {
        let ids = self.client.fetch_trending_ids().await?;
        if ids.is_empty() {
            tracing::debug!("Trending directory empty, skipping market lookup");
            return Ok(Vec::new());
        }

        let per_page = u32::try_from(ids.len()).unwrap_or(u32::MAX).min(250);
        let records = self.client.fetch_markets(Some(&ids), per_page).await?;
        Ok(records.into_iter().map(RawFeedRecord::Trending).collect())
    }
}
