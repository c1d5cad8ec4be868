//! Ethereum infrastructure - JSON-RPC client and raw value decoding

mod rpc;
pub(crate) mod types;

pub use rpc::{HttpRpc, JsonRpc, RetryPolicy};
pub use types::{parse_b256, parse_hex_bytes, parse_hex_u256, parse_hex_u64, RawTransaction};
