//! Records served by the indexing API
//!
//! Read-only projections: nothing here is mutated locally, changes only show
//! up after a refetch.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// `{totalItems, items}` body of a paginated endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPage<T> {
    #[serde(default)]
    pub total_items: u64,
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

impl<T> Default for RawPage<T> {
    fn default() -> Self {
        Self {
            total_items: 0,
            items: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingModel {
    pub name: String,
    pub address: String,
    pub symbol: String,
    pub decimals: u8,
    #[serde(rename = "logoURI", default)]
    pub logo_uri: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Swap,
    Mint,
    Burn,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Swap => "swap",
            EventKind::Mint => "mint",
            EventKind::Burn => "burn",
        }
    }
}

/// Event-type filter for the DEX events collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventFilter {
    #[default]
    All,
    Only(EventKind),
}

impl EventFilter {
    /// Value of the `eventName` query parameter, absent for `All`
    pub fn event_name(&self) -> Option<&'static str> {
        match self {
            EventFilter::All => None,
            EventFilter::Only(kind) => Some(kind.as_str()),
        }
    }
}

impl std::str::FromStr for EventFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(EventFilter::All),
            "swap" => Ok(EventFilter::Only(EventKind::Swap)),
            "mint" => Ok(EventFilter::Only(EventKind::Mint)),
            "burn" => Ok(EventFilter::Only(EventKind::Burn)),
            other => Err(format!("unknown event type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventModel {
    pub chain_id: String,
    pub amount1: String,
    pub amount2: String,
    pub pair: String,
    pub event_name: EventKind,
    pub timestamp: i64,
    pub transaction_hash: String,
}

impl EventModel {
    pub fn time(&self) -> Option<DateTime<Utc>> {
        timestamp_to_utc(self.timestamp)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncModel {
    pub pair: String,
    pub reserve0: String,
    pub reserve1: String,
    pub transaction_hash: String,
    pub chain_id: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapModel {
    pub pair: String,
    pub amount0_in: String,
    pub amount1_in: String,
    pub amount0_out: String,
    pub amount1_out: String,
    pub to: String,
    pub transaction_hash: String,
    pub chain_id: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakingPoolModel {
    pub id: String,
    pub token_a: String,
    pub token_b: String,
    #[serde(rename = "tokenAAPY")]
    pub token_a_apy: f64,
    #[serde(rename = "tokenBAPY")]
    pub token_b_apy: f64,
    pub chain_id: String,
    pub tax: f64,
    pub owner: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeEventModel {
    pub stake: String,
    pub amount: String,
    pub token: String,
    pub timestamp: i64,
    pub staker: String,
    pub transaction_hash: String,
    pub chain_id: String,
}

impl StakeEventModel {
    pub fn time(&self) -> Option<DateTime<Utc>> {
        timestamp_to_utc(self.timestamp)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleRank {
    Gold,
    Silver,
    Bronze,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Client-side rank filter for sale listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RankFilter {
    #[default]
    All,
    Only(SaleRank),
}

impl RankFilter {
    pub fn matches(&self, rank: SaleRank) -> bool {
        match self {
            RankFilter::All => true,
            RankFilter::Only(wanted) => *wanted == rank,
        }
    }
}

impl std::str::FromStr for RankFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(RankFilter::All),
            "gold" => Ok(RankFilter::Only(SaleRank::Gold)),
            "silver" => Ok(RankFilter::Only(SaleRank::Silver)),
            "bronze" => Ok(RankFilter::Only(SaleRank::Bronze)),
            "unknown" => Ok(RankFilter::Only(SaleRank::Unknown)),
            other => Err(format!("unknown rank '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleUrls {
    pub website: Option<String>,
    pub telegram: Option<String>,
    pub discord: Option<String>,
    pub twitter: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaleDetails {
    pub description: Option<String>,
    pub urls: Option<SaleUrls>,
    pub tokenomics: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSaleItemModel {
    pub id: String,
    pub token: String,
    pub tokens_for_sale: String,
    pub hard_cap: String,
    pub soft_cap: String,
    pub presale_rate: String,
    pub min_contribution: String,
    pub max_contribution: String,
    pub start_time: String,
    pub proceeds_to: String,
    pub end_time: String,
    pub admin: String,
    pub chain_id: String,
    #[serde(default)]
    pub rank: SaleRank,
    #[serde(default)]
    pub details: Option<SaleDetails>,
}

/// Indexer timestamps arrive in seconds or milliseconds depending on the
/// collection.
fn timestamp_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    if ts.abs() >= 1_000_000_000_000 {
        Utc.timestamp_millis_opt(ts).single()
    } else {
        Utc.timestamp_opt(ts, 0).single()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_listing_uses_logo_uri_key() {
        let model: ListingModel = serde_json::from_value(json!({
            "name": "Wrapped BNB",
            "address": "0xAE13d989daC2f0dEbFf460aC112a837C89BAa7cd",
            "symbol": "WBNB",
            "decimals": 18,
            "logoURI": "https://example/wbnb.png"
        }))
        .unwrap();
        assert_eq!(model.logo_uri, "https://example/wbnb.png");
        assert_eq!(model.decimals, 18);
    }

    #[test]
    fn test_unknown_rank_falls_back() {
        let rank: SaleRank = serde_json::from_value(json!("platinum")).unwrap();
        assert_eq!(rank, SaleRank::Unknown);
        let rank: SaleRank = serde_json::from_value(json!("gold")).unwrap();
        assert_eq!(rank, SaleRank::Gold);
    }

    #[test]
    fn test_event_filter_query_value() {
        assert_eq!(EventFilter::All.event_name(), None);
        assert_eq!("burn".parse::<EventFilter>().unwrap().event_name(), Some("burn"));
        assert!("transfer".parse::<EventFilter>().is_err());
    }

    #[test]
    fn test_rank_filter() {
        assert!(RankFilter::All.matches(SaleRank::Bronze));
        assert!(RankFilter::Only(SaleRank::Gold).matches(SaleRank::Gold));
        assert!(!RankFilter::Only(SaleRank::Gold).matches(SaleRank::Silver));
    }

    #[test]
    fn test_timestamps_in_seconds_and_millis() {
        let secs = timestamp_to_utc(1_700_000_000).unwrap();
        let millis = timestamp_to_utc(1_700_000_000_000).unwrap();
        assert_eq!(secs, millis);
    }

    #[test]
    fn test_staking_pool_apy_keys() {
        let pool: StakingPoolModel = serde_json::from_value(json!({
            "id": "0x01",
            "tokenA": "0x02",
            "tokenB": "0x03",
            "tokenAAPY": 12,
            "tokenBAPY": 7.5,
            "chainId": "0x61",
            "tax": 2,
            "owner": "0x04"
        }))
        .unwrap();
        assert_eq!(pool.token_a_apy, 12.0);
        assert_eq!(pool.token_b_apy, 7.5);
    }
}
