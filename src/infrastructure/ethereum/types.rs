//! Hex decoding of raw JSON-RPC values
//!
//! Results are parsed from raw JSON rather than typed RPC structs so that
//! chains with non-standard transaction envelopes still decode.

use alloy_primitives::{Address, Bytes, B256, U256};
use serde_json::Value;

use crate::error::RpcError;

/// Chain-agnostic subset of `eth_getTransactionByHash`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTransaction {
    pub hash: String,
    pub from: String,
    pub to: Option<Address>,
    pub value: U256,
    pub input: Bytes,
    pub block_number: Option<u64>,
}

pub fn parse_hex_u64(s: &str) -> Result<u64, RpcError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    if s.is_empty() {
        return Ok(0);
    }
    u64::from_str_radix(s, 16).map_err(|_| RpcError::Malformed(format!("invalid hex u64: 0x{}", s)))
}

pub fn parse_hex_u256(s: &str) -> Result<U256, RpcError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    if s.is_empty() || s == "0" {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(s, 16).map_err(|_| RpcError::Malformed(format!("invalid hex quantity: 0x{}", s)))
}

pub fn parse_hex_bytes(s: &str) -> Result<Bytes, RpcError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(s)
        .map(Bytes::from)
        .map_err(|_| RpcError::Malformed("invalid hex data".into()))
}

pub fn value_as_str(value: &Value) -> Result<&str, RpcError> {
    value
        .as_str()
        .ok_or_else(|| RpcError::Malformed(format!("expected hex string, got {}", value)))
}

/// Parse a transaction object; `None` for a null result (unknown hash)
pub fn parse_raw_transaction(json: &Value) -> Result<Option<RawTransaction>, RpcError> {
    if json.is_null() {
        return Ok(None);
    }
    let hash = json
        .get("hash")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::Malformed("transaction without hash".into()))?
        .to_string();
    let from = json
        .get("from")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let to = json
        .get("to")
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<Address>().ok());
    let value = parse_hex_u256(json.get("value").and_then(|v| v.as_str()).unwrap_or("0x0"))?;
    let input = parse_hex_bytes(json.get("input").and_then(|v| v.as_str()).unwrap_or("0x"))?;
    let block_number = json
        .get("blockNumber")
        .and_then(|v| v.as_str())
        .map(parse_hex_u64)
        .transpose()?;

    Ok(Some(RawTransaction {
        hash,
        from,
        to,
        value,
        input,
        block_number,
    }))
}

pub fn parse_b256(s: &str) -> Option<B256> {
    let normalized = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
    if normalized.len() != 64 {
        return None;
    }
    let bytes = hex::decode(normalized).ok()?;
    Some(B256::from_slice(&bytes))
}
