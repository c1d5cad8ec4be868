//! Indexing API - paginated, chain-scoped collections served over HTTP

mod client;
pub mod models;

pub use client::{HttpIndexer, Indexer, IndexerApi};
pub use models::{
    EventFilter, EventKind, EventModel, ListingModel, RankFilter, RawPage, SaleRank,
    StakeEventModel, StakingPoolModel, SwapModel, SyncModel, TokenSaleItemModel,
};
