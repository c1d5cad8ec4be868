//! Typed contract reads over JSON-RPC

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use alloy::rpc::types::{BlockId, TransactionInput, TransactionRequest};
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolCall;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::json;
use tracing::debug;

use crate::chains::{ChainInfo, ChainRegistry};
use crate::error::RpcError;
use crate::infrastructure::ethereum::types::{parse_raw_transaction, value_as_str};
use crate::infrastructure::ethereum::{parse_hex_bytes, parse_hex_u256, parse_hex_u64, JsonRpc, RawTransaction};

type CallKey = (u64, Address, Bytes);
type PendingCall = Shared<BoxFuture<'static, Result<Bytes, RpcError>>>;

/// `eth_call`s currently on the wire, at most one per (chain, address, calldata)
#[derive(Default)]
pub struct InflightCalls {
    pending: Mutex<HashMap<CallKey, PendingCall>>,
}

impl InflightCalls {
    fn pending(&self) -> std::sync::MutexGuard<'_, HashMap<CallKey, PendingCall>> {
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Read-only access to the contracts of one chain
#[derive(Clone)]
pub struct ContractReader {
    rpc: Arc<dyn JsonRpc>,
    chain: ChainInfo,
    inflight: Arc<InflightCalls>,
}

impl ContractReader {
    pub fn new(rpc: Arc<dyn JsonRpc>, chain: ChainInfo) -> Self {
        Self::with_inflight(rpc, chain, Arc::new(InflightCalls::default()))
    }

    pub fn with_inflight(rpc: Arc<dyn JsonRpc>, chain: ChainInfo, inflight: Arc<InflightCalls>) -> Self {
        Self { rpc, chain, inflight }
    }

    pub fn chain(&self) -> &ChainInfo {
        &self.chain
    }

    /// `eth_call` at `latest`; identical concurrent calls share one request
    pub async fn call_raw(&self, to: Address, data: Bytes) -> Result<Bytes, RpcError> {
        let key: CallKey = (self.chain.chain_id, to, data.clone());
        let call = {
            let mut pending = self.inflight.pending();
            match pending.get(&key) {
                Some(call) => {
                    debug!(chain_id = self.chain.chain_id, %to, "joining in-flight eth_call");
                    call.clone()
                }
                None => {
                    let rpc = self.rpc.clone();
                    let url = self.chain.rpc_url.clone();
                    // Some nodes only read `data`, newer ones only `input`
                    let request = TransactionRequest::default()
                        .to(to)
                        .input(TransactionInput::both(data));
                    let params = json!([request, BlockId::latest()]);
                    let call = async move {
                        let value = rpc.request(&url, "eth_call", params).await?;
                        parse_hex_bytes(value_as_str(&value)?)
                    }
                    .boxed()
                    .shared();
                    pending.insert(key.clone(), call.clone());
                    call
                }
            }
        };

        let result = call.clone().await;

        let mut pending = self.inflight.pending();
        if pending.get(&key).is_some_and(|current| current.ptr_eq(&call)) {
            pending.remove(&key);
        }
        result
    }

    pub async fn call<C: SolCall>(&self, to: Address, call: &C) -> Result<C::Return, RpcError> {
        let data = self.call_raw(to, Bytes::from(call.abi_encode())).await?;
        C::abi_decode_returns(&data).map_err(|e| RpcError::Decode(format!("{}: {}", C::SIGNATURE, e)))
    }

    pub async fn native_balance(&self, address: Address) -> Result<U256, RpcError> {
        let value = self
            .rpc
            .request(&self.chain.rpc_url, "eth_getBalance", json!([address, BlockId::latest()]))
            .await?;
        parse_hex_u256(value_as_str(&value)?)
    }

    pub async fn transaction_by_hash(&self, hash: B256) -> Result<Option<RawTransaction>, RpcError> {
        let value = self
            .rpc
            .request(&self.chain.rpc_url, "eth_getTransactionByHash", json!([hash]))
            .await?;
        parse_raw_transaction(&value)
    }

    pub async fn chain_id(&self) -> Result<u64, RpcError> {
        let value = self.rpc.request(&self.chain.rpc_url, "eth_chainId", json!([])).await?;
        parse_hex_u64(value_as_str(&value)?)
    }
}

/// Hands out readers for supported chains; unsupported ids get none
#[derive(Clone)]
pub struct ChainReaders {
    rpc: Arc<dyn JsonRpc>,
    registry: Arc<ChainRegistry>,
    inflight: Arc<InflightCalls>,
}

impl ChainReaders {
    pub fn new(rpc: Arc<dyn JsonRpc>, registry: Arc<ChainRegistry>) -> Self {
        Self {
            rpc,
            registry,
            inflight: Arc::new(InflightCalls::default()),
        }
    }

    pub fn registry(&self) -> &ChainRegistry {
        &self.registry
    }

    pub fn reader(&self, chain_id: u64) -> Option<ContractReader> {
        let chain = self.registry.lookup(chain_id)?.clone();
        Some(ContractReader::with_inflight(self.rpc.clone(), chain, self.inflight.clone()))
    }
}
