//! Infrastructure layer - external service integrations
//!
//! This layer contains:
//! - JSON-RPC over HTTP for direct node reads
//! - The HTTP indexing API client and its record models

pub mod ethereum;
pub mod indexer;
