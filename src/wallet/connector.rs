//! Wallet backends behind one uniform interface

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::WalletEndpoints;
use crate::error::{RpcError, WalletError};
use crate::infrastructure::ethereum::{parse_hex_u64, JsonRpc};

/// JSON-RPC error code wallets use for a request the user declined
pub const USER_REJECTED_CODE: i64 = 4001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorKind {
    Injected,
    WalletConnect,
    Torus,
    OkxWallet,
}

impl ConnectorKind {
    pub const ALL: [ConnectorKind; 4] = [
        ConnectorKind::Injected,
        ConnectorKind::WalletConnect,
        ConnectorKind::Torus,
        ConnectorKind::OkxWallet,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ConnectorKind::Injected => "injected",
            ConnectorKind::WalletConnect => "walletconnect",
            ConnectorKind::Torus => "torus",
            ConnectorKind::OkxWallet => "okx",
        }
    }

    /// Chain a backend activates on when the wallet does not report one
    pub fn default_chain(&self) -> Option<u64> {
        match self {
            ConnectorKind::Torus => Some(56),
            _ => None,
        }
    }
}

impl std::fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ConnectorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "injected" | "metamask" => Ok(ConnectorKind::Injected),
            "walletconnect" | "wallet_connect" => Ok(ConnectorKind::WalletConnect),
            "torus" => Ok(ConnectorKind::Torus),
            "okx" | "okxwallet" => Ok(ConnectorKind::OkxWallet),
            other => Err(format!("unknown wallet backend '{}'", other)),
        }
    }
}

/// Account and chain a backend resolved with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Activation {
    pub account: Address,
    pub chain_id: u64,
}

#[async_trait::async_trait]
pub trait WalletConnector: Send + Sync + 'static {
    fn kind(&self) -> ConnectorKind;

    fn supported_chain_ids(&self) -> &[u64];

    /// Whether the wallet already exposes an account without prompting
    async fn is_authorized(&self) -> bool;

    async fn activate(&self) -> Result<Activation, WalletError>;

    async fn deactivate(&self);

    /// Raw EIP-1193 request against the wallet
    async fn request(&self, method: &str, params: Value) -> Result<Value, WalletError>;
}

/// Connector speaking EIP-1193 methods to a JSON-RPC bridge endpoint
pub struct Eip1193Connector {
    kind: ConnectorKind,
    endpoint: String,
    rpc: Arc<dyn JsonRpc>,
    supported: Vec<u64>,
    timeout: Duration,
}

impl Eip1193Connector {
    pub fn new(
        kind: ConnectorKind,
        endpoint: impl Into<String>,
        rpc: Arc<dyn JsonRpc>,
        supported: Vec<u64>,
        timeout: Duration,
    ) -> Self {
        Self {
            kind,
            endpoint: endpoint.into(),
            rpc,
            supported,
            timeout,
        }
    }

    async fn accounts(&self, method: &str) -> Result<Vec<Address>, WalletError> {
        let value = self.request(method, json!([])).await?;
        let list = value
            .as_array()
            .ok_or_else(|| RpcError::Malformed(format!("{} did not return a list", method)))?;
        list.iter()
            .map(|v| {
                v.as_str()
                    .and_then(|s| s.parse::<Address>().ok())
                    .ok_or_else(|| WalletError::Rpc(RpcError::Malformed(format!("bad account {}", v))))
            })
            .collect()
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        let value = self.request("eth_chainId", json!([])).await?;
        match (value.as_str(), self.kind.default_chain()) {
            (Some(hex), _) => Ok(parse_hex_u64(hex)?),
            (None, Some(default)) => Ok(default),
            (None, None) => Err(RpcError::Malformed(format!("eth_chainId returned {}", value)).into()),
        }
    }

    async fn activate_inner(&self) -> Result<Activation, WalletError> {
        let account = self
            .accounts("eth_requestAccounts")
            .await?
            .into_iter()
            .next()
            .ok_or(WalletError::NoAccounts)?;
        let chain_id = self.chain_id().await?;
        if !self.supported.contains(&chain_id) {
            return Err(WalletError::UnsupportedChain(chain_id));
        }
        Ok(Activation { account, chain_id })
    }
}

#[async_trait::async_trait]
impl WalletConnector for Eip1193Connector {
    fn kind(&self) -> ConnectorKind {
        self.kind
    }

    fn supported_chain_ids(&self) -> &[u64] {
        &self.supported
    }

    async fn is_authorized(&self) -> bool {
        match self.accounts("eth_accounts").await {
            Ok(accounts) => !accounts.is_empty(),
            Err(err) => {
                debug!(connector = %self.kind, error = %err, "authorization check failed");
                false
            }
        }
    }

    async fn activate(&self) -> Result<Activation, WalletError> {
        tokio::time::timeout(self.timeout, self.activate_inner())
            .await
            .map_err(|_| WalletError::Timeout)?
    }

    async fn deactivate(&self) {
        debug!(connector = %self.kind, "deactivated");
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, WalletError> {
        self.rpc
            .request(&self.endpoint, method, params)
            .await
            .map_err(|err| match err.code() {
                Some(USER_REJECTED_CODE) => WalletError::UserRejected,
                _ => WalletError::Rpc(err),
            })
    }
}

/// Connectors for every backend that has a bridge endpoint configured
pub fn connectors_from_config(
    endpoints: &WalletEndpoints,
    rpc: Arc<dyn JsonRpc>,
    supported: Vec<u64>,
    timeout: Duration,
) -> Vec<Arc<dyn WalletConnector>> {
    let configured = [
        (ConnectorKind::Injected, &endpoints.injected),
        (ConnectorKind::WalletConnect, &endpoints.wallet_connect),
        (ConnectorKind::Torus, &endpoints.torus),
        (ConnectorKind::OkxWallet, &endpoints.okx),
    ];
    configured
        .into_iter()
        .filter_map(|(kind, endpoint)| {
            let endpoint = endpoint.as_ref()?;
            let connector: Arc<dyn WalletConnector> = Arc::new(Eip1193Connector::new(
                kind,
                endpoint.clone(),
                rpc.clone(),
                supported.clone(),
                timeout,
            ));
            Some(connector)
        })
        .collect()
}
