//! HTTP access to the indexing API

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::chains::hex_chain_id;
use crate::error::IndexerError;
use crate::infrastructure::indexer::models::{
    EventFilter, EventModel, ListingModel, RawPage, StakeEventModel, SwapModel, SyncModel,
    TokenSaleItemModel,
};

/// Raw GET seam; returns the full JSON body
#[async_trait::async_trait]
pub trait IndexerApi: Send + Sync + 'static {
    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value, IndexerError>;
}

/// reqwest-backed indexer client
pub struct HttpIndexer {
    http: reqwest::Client,
    base_url: String,
}

impl HttpIndexer {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, IndexerError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IndexerError::Transport(format!("failed to build http client: {}", e)))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait::async_trait]
impl IndexerApi for HttpIndexer {
    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value, IndexerError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| IndexerError::Transport(format!("GET {}: {}", path, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IndexerError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| IndexerError::Malformed(format!("GET {}: {}", path, e)))
    }
}

/// Typed endpoints over an [`IndexerApi`]
///
/// Every response is wrapped as `{result: ...}`; the envelope is stripped here.
#[derive(Clone)]
pub struct Indexer {
    api: Arc<dyn IndexerApi>,
}

impl Indexer {
    pub fn new(api: Arc<dyn IndexerApi>) -> Self {
        Self { api }
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, IndexerError> {
        let mut body = self.api.get(path, query).await?;
        let result = body
            .get_mut("result")
            .map(Value::take)
            .ok_or_else(|| IndexerError::Malformed(format!("{}: missing result", path)))?;
        serde_json::from_value(result).map_err(|e| IndexerError::Malformed(format!("{}: {}", path, e)))
    }

    fn page_query(page: u64) -> Vec<(&'static str, String)> {
        vec![("page", page.max(1).to_string())]
    }

    fn period_query(period: Option<u64>) -> Vec<(&'static str, String)> {
        period.map(|p| vec![("period", p.to_string())]).unwrap_or_default()
    }

    // === DEX ===

    /// Token listing; this endpoint takes the decimal chain id
    pub async fn listing(&self, chain_id: u64) -> Result<Vec<ListingModel>, IndexerError> {
        self.fetch(&format!("/dex/listing/{}", chain_id), &[]).await
    }

    pub async fn top_pairs(&self, chain_id: u64) -> Result<Vec<String>, IndexerError> {
        self.fetch(&format!("/dex/top_pairs/{}", hex_chain_id(chain_id)), &[])
            .await
    }

    pub async fn liquidity_pools_for_user(
        &self,
        chain_id: u64,
        account: &str,
    ) -> Result<RawPage<String>, IndexerError> {
        self.fetch(&format!("/dex/pools/{}/{}", hex_chain_id(chain_id), account), &[])
            .await
    }

    pub async fn events(
        &self,
        chain_id: u64,
        page: u64,
        filter: EventFilter,
    ) -> Result<RawPage<EventModel>, IndexerError> {
        let mut query = Self::page_query(page);
        if let Some(name) = filter.event_name() {
            query.push(("eventName", name.to_string()));
        }
        self.fetch(&format!("/dex/events/{}", hex_chain_id(chain_id)), &query)
            .await
    }

    pub async fn price_history(
        &self,
        pair: &str,
        chain_id: u64,
        period: Option<u64>,
    ) -> Result<Vec<SyncModel>, IndexerError> {
        self.fetch(
            &format!("/dex/price_history/{}/{}", pair, hex_chain_id(chain_id)),
            &Self::period_query(period),
        )
        .await
    }

    pub async fn swap_events(
        &self,
        pair: &str,
        chain_id: u64,
        period: Option<u64>,
    ) -> Result<Vec<SwapModel>, IndexerError> {
        self.fetch(
            &format!("/dex/swap_events/{}/{}", pair, hex_chain_id(chain_id)),
            &Self::period_query(period),
        )
        .await
    }

    // === Staking ===

    pub async fn staking_pools(&self, chain_id: u64, page: u64) -> Result<RawPage<String>, IndexerError> {
        self.fetch(
            &format!("/staking/pools/{}", hex_chain_id(chain_id)),
            &Self::page_query(page),
        )
        .await
    }

    pub async fn account_staking_pools(
        &self,
        chain_id: u64,
        owner: &str,
        page: u64,
    ) -> Result<RawPage<String>, IndexerError> {
        self.fetch(
            &format!("/staking/pools/{}/{}", hex_chain_id(chain_id), owner),
            &Self::page_query(page),
        )
        .await
    }

    pub async fn account_stakes(
        &self,
        chain_id: u64,
        owner: &str,
        page: u64,
    ) -> Result<RawPage<StakeEventModel>, IndexerError> {
        self.fetch(
            &format!("/staking/stakes/{}/{}", hex_chain_id(chain_id), owner),
            &Self::page_query(page),
        )
        .await
    }

    pub async fn special_staking_pools(
        &self,
        chain_id: u64,
        page: u64,
    ) -> Result<RawPage<String>, IndexerError> {
        self.fetch(
            &format!("/staking/special/{}", hex_chain_id(chain_id)),
            &Self::page_query(page),
        )
        .await
    }

    // === Multisig ===

    pub async fn multisig_wallets(
        &self,
        chain_id: u64,
        account: &str,
        page: u64,
    ) -> Result<RawPage<String>, IndexerError> {
        self.fetch(
            &format!("/multisig/wallets/{}/{}", hex_chain_id(chain_id), account),
            &Self::page_query(page),
        )
        .await
    }

    // === Launchpad ===

    pub async fn public_sales(
        &self,
        chain_id: u64,
        page: u64,
    ) -> Result<RawPage<TokenSaleItemModel>, IndexerError> {
        self.fetch(
            &format!("/launchpad/public_sales/{}", hex_chain_id(chain_id)),
            &Self::page_query(page),
        )
        .await
    }

    pub async fn private_sales(
        &self,
        chain_id: u64,
        page: u64,
    ) -> Result<RawPage<TokenSaleItemModel>, IndexerError> {
        self.fetch(
            &format!("/launchpad/private_sales/{}", hex_chain_id(chain_id)),
            &Self::page_query(page),
        )
        .await
    }
}
