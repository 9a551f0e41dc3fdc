//! Aggregator
//!
//! Merges normalized snapshots from every source into one record per asset key.
//!
//! Merge rules, applied in provider-list order:
//! - same family, same provider id, different instrument: volumes summed
//! - same family, same instrument: duplicate listing, flags OR-ed
//! - same family, different provider id: ambiguous ticker, first one wins
//! - different families: richer record wins, trending OR-ed, no volume sum
//!
//! The first-wins rule for ambiguous tickers is a best-effort heuristic; two
//! unrelated assets sharing a symbol cannot be told apart from the key alone.

use std::collections::{HashMap, HashSet};

use super::snapshot::{MarketSnapshot, SourceFamily};

/// Stable / fiat-pegged symbols never worth ranking
pub const DEFAULT_DENYLIST: &[&str] = &[
    "USDT", "USDC", "BUSD", "DAI", "TUSD", "USDP", "FDUSD", "PYUSD", "USDE", "USDD", "FRAX",
    "EUR", "EURC", "EURT", "GBP",
];

/// Everything one family reported for an asset key
#[derive(Debug)]
struct FamilyGroup {
    family: SourceFamily,
    provider_id: String,
    instruments: Vec<MarketSnapshot>,
}

impl FamilyGroup {
    /// Collapse instruments: highest-volume instrument supplies the prices,
    /// volume is the sum across distinct instruments.
    fn collapse(self) -> Option<MarketSnapshot> {
        let total_volume: f64 = self.instruments.iter().map(|s| s.volume_24h).sum();

        let mut iter = self.instruments.into_iter();
        let mut best = iter.next()?;
        let mut rest = Vec::new();
        for snap in iter {
            if snap.volume_24h > best.volume_24h {
                rest.push(std::mem::replace(&mut best, snap));
            } else {
                rest.push(snap);
            }
        }
        for other in &rest {
            best.fill_missing_from(other);
        }
        best.volume_24h = total_volume;
        Some(best)
    }
}

#[derive(Debug, Clone)]
pub struct Aggregator {
    denylist: HashSet<String>,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(DEFAULT_DENYLIST.iter().copied())
    }
}

impl Aggregator {
    /// Create an aggregator with a custom denylist (case-insensitive)
    pub fn new<I, S>(denylist: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            denylist: denylist
                .into_iter()
                .map(|s| s.as_ref().trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn is_denied(&self, symbol: &str) -> bool {
        self.denylist.contains(&symbol.trim().to_uppercase())
    }

    /// Merge snapshots into one record per asset key, in first-seen order
    pub fn merge(&self, snapshots: Vec<MarketSnapshot>) -> Vec<MarketSnapshot> {
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<FamilyGroup>> = HashMap::new();

        for snap in snapshots {
            if self.is_denied(&snap.symbol) {
                tracing::debug!("Excluding denylisted symbol {}", snap.symbol);
                continue;
            }

            let families = groups.entry(snap.asset_key.clone()).or_insert_with(|| {
                order.push(snap.asset_key.clone());
                Vec::new()
            });

            match families.iter_mut().find(|g| g.family == snap.source.family) {
                None => families.push(FamilyGroup {
                    family: snap.source.family,
                    provider_id: snap.source.provider_id.clone(),
                    instruments: vec![snap],
                }),
                Some(group) if group.provider_id != snap.source.provider_id => {
                    tracing::debug!(
                        "Ambiguous ticker {}: keeping {} over {} ({})",
                        snap.asset_key,
                        group.provider_id,
                        snap.source.provider_id,
                        snap.source.family
                    );
                }
                Some(group) => {
                    match group
                        .instruments
                        .iter_mut()
                        .find(|s| s.source.instrument_id == snap.source.instrument_id)
                    {
                        Some(existing) => existing.fill_missing_from(&snap),
                        None => group.instruments.push(snap),
                    }
                }
            }
        }

        order
            .into_iter()
            .filter_map(|key| {
                let families = groups.remove(&key)?;
                merge_families(families)
            })
            .collect()
    }
}

/// Cross-provider merge: prefer the richer record, earlier one on ties
fn merge_families(families: Vec<FamilyGroup>) -> Option<MarketSnapshot> {
    let mut collapsed = families.into_iter().filter_map(FamilyGroup::collapse);
    let mut winner = collapsed.next()?;
    for candidate in collapsed {
        if candidate.richness() > winner.richness() {
            let loser = std::mem::replace(&mut winner, candidate);
            winner.fill_missing_from(&loser);
        } else {
            winner.fill_missing_from(&candidate);
        }
    }
    Some(winner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::snapshot::fixtures::snapshot;
    use crate::domain::snapshot::SourceTag;

    fn okx(symbol: &str, inst: &str, volume: f64) -> MarketSnapshot {
        let mut snap = snapshot(symbol, 10.0, volume);
        snap.source.instrument_id = inst.to_string();
        snap
    }

    fn gecko(symbol: &str, id: &str, volume: f64) -> MarketSnapshot {
        let mut snap = snapshot(symbol, 10.0, volume);
        snap.source = SourceTag {
            family: SourceFamily::CoinGecko,
            provider_id: id.to_string(),
            instrument_id: id.to_string(),
        };
        snap
    }

    #[test]
    fn test_same_family_instruments_volume_summed() {
        let merged = Aggregator::default().merge(vec![
            okx("btc", "BTC-USDT-SWAP", 100.0),
            okx("btc", "BTC-USD-SWAP", 50.0),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].volume_24h, 150.0);
    }

    #[test]
    fn test_highest_volume_instrument_supplies_price() {
        let mut small = okx("eth", "ETH-USD-SWAP", 10.0);
        small.price = 1.0;
        let mut big = okx("eth", "ETH-USDT-SWAP", 90.0);
        big.price = 2.0;

        let merged = Aggregator::default().merge(vec![small, big]);
        assert_eq!(merged[0].price, 2.0);
        assert_eq!(merged[0].volume_24h, 100.0);
    }

    #[test]
    fn test_duplicate_instrument_not_summed() {
        let listing = gecko("pepe", "pepe", 100.0);
        let mut trending = gecko("pepe", "pepe", 100.0);
        trending.is_trending = true;

        let merged = Aggregator::default().merge(vec![listing, trending]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].volume_24h, 100.0);
        assert!(merged[0].is_trending);
    }

    #[test]
    fn test_cross_provider_keeps_richer_record() {
        let bare = okx("doge", "DOGE-USDT-SWAP", 500.0);
        let mut rich = gecko("doge", "dogecoin", 80.0);
        rich.image_url = Some("https://img/doge.png".into());
        rich.display_name = "Dogecoin".into();

        let merged = Aggregator::default().merge(vec![bare, rich]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].image_url.as_deref(), Some("https://img/doge.png"));
        assert_eq!(merged[0].display_name, "Dogecoin");
        // volumes are not summed across independent providers
        assert_eq!(merged[0].volume_24h, 80.0);
    }

    #[test]
    fn test_cross_provider_trending_is_ored() {
        let mut rich = okx("wif", "WIF-USDT-SWAP", 10.0);
        rich.image_url = Some("https://img/wif.png".into());
        let mut trending = gecko("wif", "dogwifcoin", 5.0);
        trending.is_trending = true;

        let merged = Aggregator::default().merge(vec![rich, trending]);
        assert!(merged[0].is_trending);
        assert_eq!(merged[0].source.family, SourceFamily::Okx);
    }

    #[test]
    fn test_ambiguous_ticker_first_candidate_wins() {
        let merged = Aggregator::default().merge(vec![
            gecko("uni", "uniswap", 1000.0),
            gecko("uni", "universe-token", 5.0),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].source.provider_id, "uniswap");
        assert_eq!(merged[0].volume_24h, 1000.0);
    }

    #[test]
    fn test_denylist_excluded() {
        let merged = Aggregator::default().merge(vec![
            gecko("usdt", "tether", 1e9),
            gecko("btc", "bitcoin", 1e8),
            gecko("Eur", "euro", 1e6),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].asset_key, "btc");
    }

    #[test]
    fn test_custom_denylist() {
        let aggregator = Aggregator::new(["btc"]);
        assert!(aggregator.is_denied("BTC"));
        assert!(!aggregator.is_denied("USDT"));
    }

    #[test]
    fn test_output_keeps_first_seen_order() {
        let merged = Aggregator::default().merge(vec![
            gecko("sol", "solana", 1.0),
            gecko("btc", "bitcoin", 1.0),
            okx("sol", "SOL-USDT-SWAP", 1.0),
        ]);
        let keys: Vec<_> = merged.iter().map(|s| s.asset_key.as_str()).collect();
        assert_eq!(keys, vec!["sol", "btc"]);
    }
}
