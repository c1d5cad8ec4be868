//! Wallet session state machine
//!
//! Owns the active [`ChainContext`] and publishes every change of it on a
//! watch channel. Subscribers (the aggregator, detail consumers) re-run their
//! fetches when the channel ticks.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use alloy::rpc::types::BlockId;
use alloy_primitives::Address;
use serde_json::{json, Value};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::chains::{hex_chain_id, ChainRegistry};
use crate::core::format::format_ether;
use crate::core::{ChainContext, ProviderHandle};
use crate::error::{RpcError, WalletError};
use crate::infrastructure::ethereum::{parse_hex_u256, JsonRpc};
use crate::infrastructure::indexer::ListingModel;
use crate::wallet::connector::{ConnectorKind, WalletConnector};

/// Codes wallets answer `wallet_switchEthereumChain` with for an unknown chain
const UNKNOWN_CHAIN_CODES: [i64; 2] = [4902, -32603];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Disconnected,
    Connecting(ConnectorKind),
    Connected,
    /// Retains the cause for display; never retried automatically
    Error(WalletError),
}

/// Events emitted by a connected wallet backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    AccountsChanged(Vec<Address>),
    ChainChanged(u64),
    Disconnected,
}

struct SessionState {
    status: SessionStatus,
    active: Option<ConnectorKind>,
    /// Advisory display value; never used for amount validation
    balance: String,
    /// Bumped by every connect/disconnect so that a slow activation cannot
    /// overwrite a newer transition
    attempt: u64,
}

pub struct SessionManager {
    registry: Arc<ChainRegistry>,
    rpc: Arc<dyn JsonRpc>,
    connectors: HashMap<ConnectorKind, Arc<dyn WalletConnector>>,
    state: Mutex<SessionState>,
    context_tx: watch::Sender<ChainContext>,
    sessions: AtomicU64,
}

impl SessionManager {
    pub fn new(registry: Arc<ChainRegistry>, rpc: Arc<dyn JsonRpc>) -> Self {
        let (context_tx, _) = watch::channel(ChainContext::default());
        Self {
            registry,
            rpc,
            connectors: HashMap::new(),
            state: Mutex::new(SessionState {
                status: SessionStatus::Disconnected,
                active: None,
                balance: "0".to_string(),
                attempt: 0,
            }),
            context_tx,
            sessions: AtomicU64::new(0),
        }
    }

    pub fn with_connector(mut self, connector: Arc<dyn WalletConnector>) -> Self {
        self.connectors.insert(connector.kind(), connector);
        self
    }

    pub fn with_connectors(self, connectors: impl IntoIterator<Item = Arc<dyn WalletConnector>>) -> Self {
        connectors.into_iter().fold(self, |manager, c| manager.with_connector(c))
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn subscribe(&self) -> watch::Receiver<ChainContext> {
        self.context_tx.subscribe()
    }

    pub fn context(&self) -> ChainContext {
        self.context_tx.borrow().clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.state().status.clone()
    }

    pub fn balance(&self) -> String {
        self.state().balance.clone()
    }

    pub fn active_connector(&self) -> Option<ConnectorKind> {
        self.state().active
    }

    pub fn available_connectors(&self) -> Vec<ConnectorKind> {
        ConnectorKind::ALL
            .into_iter()
            .filter(|kind| self.connectors.contains_key(kind))
            .collect()
    }

    fn publish(&self, context: ChainContext) {
        self.context_tx.send_if_modified(|current| {
            if *current == context {
                return false;
            }
            *current = context;
            true
        });
    }

    /// Disconnected/Error -> Connecting -> Connected | Error
    pub async fn connect(&self, kind: ConnectorKind) -> Result<ChainContext, WalletError> {
        let Some(connector) = self.connectors.get(&kind).cloned() else {
            let err = WalletError::BackendUnavailable(kind.to_string());
            self.state().status = SessionStatus::Error(err.clone());
            return Err(err);
        };

        let attempt = {
            let mut state = self.state();
            state.attempt += 1;
            state.status = SessionStatus::Connecting(kind);
            state.attempt
        };
        info!(connector = %kind, "connecting wallet");

        let outcome = connector.activate().await.and_then(|activation| {
            if self.registry.is_supported(activation.chain_id) {
                Ok(activation)
            } else {
                Err(WalletError::UnsupportedChain(activation.chain_id))
            }
        });

        let context = {
            let mut state = self.state();
            if state.attempt != attempt {
                debug!(connector = %kind, "activation superseded");
                return Err(outcome.err().unwrap_or(WalletError::Superseded));
            }
            match outcome {
                Ok(activation) => {
                    state.status = SessionStatus::Connected;
                    state.active = Some(kind);
                    let session = self.sessions.fetch_add(1, Ordering::SeqCst) + 1;
                    ChainContext {
                        chain_id: Some(activation.chain_id),
                        account: Some(activation.account),
                        provider: Some(ProviderHandle { kind, session }),
                    }
                }
                Err(err) => {
                    warn!(connector = %kind, error = %err, "wallet connection failed");
                    state.status = SessionStatus::Error(err.clone());
                    return Err(err);
                }
            }
        };

        info!(connector = %kind, chain_id = ?context.chain_id, account = ?context.account, "wallet connected");
        self.publish(context.clone());
        self.refresh_balance().await;
        Ok(context)
    }

    pub async fn disconnect(&self) {
        let active = {
            let mut state = self.state();
            state.attempt += 1;
            state.status = SessionStatus::Disconnected;
            state.balance = "0".to_string();
            state.active.take()
        };
        if let Some(connector) = active.and_then(|kind| self.connectors.get(&kind)) {
            connector.deactivate().await;
        }
        info!("wallet disconnected");
        self.publish(ChainContext::default());
    }

    /// Eagerly reconnect an injected or OKX wallet that is already authorized
    pub async fn restore(&self) -> Option<ChainContext> {
        for kind in [ConnectorKind::Injected, ConnectorKind::OkxWallet] {
            let Some(connector) = self.connectors.get(&kind) else {
                continue;
            };
            if connector.is_authorized().await {
                debug!(connector = %kind, "restoring authorized session");
                return self.connect(kind).await.ok();
            }
        }
        None
    }

    /// Apply a backend event to the context without re-running activation
    pub async fn handle_provider_event(&self, event: ProviderEvent) {
        let live = {
            let state = self.state();
            state.active.is_some()
                && matches!(
                    state.status,
                    SessionStatus::Connected | SessionStatus::Error(WalletError::UnsupportedChain(_))
                )
        };
        if !live {
            debug!(?event, "ignoring provider event outside a connected session");
            return;
        }

        match event {
            ProviderEvent::AccountsChanged(accounts) => match accounts.first() {
                Some(account) => {
                    let mut context = self.context();
                    context.account = Some(*account);
                    self.publish(context);
                    self.refresh_balance().await;
                }
                None => self.disconnect().await,
            },
            ProviderEvent::ChainChanged(chain_id) => {
                let mut context = self.context();
                if self.registry.is_supported(chain_id) {
                    self.state().status = SessionStatus::Connected;
                    context.chain_id = Some(chain_id);
                } else {
                    // Keep the backend so a switch back can resume the session
                    warn!(chain_id, "wallet switched to an unsupported chain");
                    {
                        let mut state = self.state();
                        state.status = SessionStatus::Error(WalletError::UnsupportedChain(chain_id));
                        state.balance = "0".to_string();
                    }
                    context.chain_id = None;
                }
                self.publish(context);
                self.refresh_balance().await;
            }
            ProviderEvent::Disconnected => self.disconnect().await,
        }
    }

    /// Re-read the native balance of the active account
    pub async fn refresh_balance(&self) {
        let context = self.context();
        let (Some(chain_id), Some(account)) = (context.chain_id, context.account) else {
            return;
        };
        let Some(chain) = self.registry.lookup(chain_id) else {
            self.set_balance_if_current(&context, "0".to_string());
            return;
        };

        let balance = match self
            .rpc
            .request(&chain.rpc_url, "eth_getBalance", json!([account, BlockId::latest()]))
            .await
            .and_then(|v| {
                let hex = v
                    .as_str()
                    .ok_or_else(|| RpcError::Malformed(format!("balance was {}", v)))?;
                parse_hex_u256(hex)
            }) {
            Ok(wei) => format_ether(wei),
            Err(err) => {
                warn!(chain_id, error = %err, "could not read native balance");
                "0".to_string()
            }
        };
        self.set_balance_if_current(&context, balance);
    }

    fn set_balance_if_current(&self, fetched_for: &ChainContext, balance: String) {
        if self.context() != *fetched_for {
            debug!("dropping balance for a previous context");
            return;
        }
        self.state().balance = balance;
    }

    fn connected_backend(&self) -> Result<Arc<dyn WalletConnector>, WalletError> {
        let active = self.state().active;
        active
            .and_then(|kind| self.connectors.get(&kind).cloned())
            .ok_or_else(|| WalletError::BackendUnavailable("no connected wallet".to_string()))
    }

    /// Ask the wallet to switch chains, registering the chain first if the
    /// wallet does not know it
    pub async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError> {
        let chain = self
            .registry
            .lookup(chain_id)
            .ok_or(WalletError::UnsupportedChain(chain_id))?;
        let connector = self.connected_backend()?;

        let switch = connector
            .request(
                "wallet_switchEthereumChain",
                json!([{ "chainId": hex_chain_id(chain_id) }]),
            )
            .await;
        match switch {
            Ok(_) => {}
            Err(WalletError::Rpc(RpcError::Rpc { code, .. })) if UNKNOWN_CHAIN_CODES.contains(&code) => {
                info!(chain_id, "wallet does not know chain, adding it");
                connector
                    .request("wallet_addEthereumChain", chain.add_chain_params())
                    .await?;
            }
            Err(err) => return Err(err),
        }

        self.handle_provider_event(ProviderEvent::ChainChanged(chain_id)).await;
        Ok(())
    }

    /// Suggest an ERC-20 token to the wallet's asset list
    pub async fn watch_asset(&self, token: &ListingModel) -> Result<bool, WalletError> {
        let connector = self.connected_backend()?;
        let params = json!({
            "type": "ERC20",
            "options": {
                "address": token.address,
                "symbol": token.symbol,
                "decimals": token.decimals,
                "image": token.logo_uri,
            }
        });
        let added = connector.request("wallet_watchAsset", params).await?;
        Ok(added.as_bool().unwrap_or(false))
    }

    /// Pass-through for wallet methods not modelled here
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, WalletError> {
        self.connected_backend()?.request(method, params).await
    }
}
