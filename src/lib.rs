//! Lunagens - headless client core for the Vefi DeFi dapps
//!
//! Chain registry, JSON-RPC client, wallet session manager, indexed-data
//! aggregator and on-chain detail hooks. Data flows from the session's
//! [`core::ChainContext`] into the aggregator's chain-scoped collections, which
//! the detail hooks enrich with live contract reads.

pub mod aggregator;
pub mod chains;
pub mod config;
pub mod core;
pub mod detail;
pub mod error;
pub mod infrastructure;
pub mod store;
pub mod validation;
pub mod wallet;
