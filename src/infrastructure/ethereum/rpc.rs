//! JSON-RPC over HTTP
//!
//! Requests go through an alloy `RootProvider` per endpoint. Transport
//! failures are retried with bounded exponential backoff; JSON-RPC error
//! objects and malformed bodies are returned to the caller immediately.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use alloy::providers::{Provider, RootProvider};
use alloy::rpc::client::RpcClient;
use alloy::transports::http::{reqwest, Http};
use alloy::transports::TransportError;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::RetryConfig;
use crate::error::RpcError;

/// Node access seam used by the session manager and the detail hooks
#[async_trait::async_trait]
pub trait JsonRpc: Send + Sync + 'static {
    /// Issue `method` with `params` against the endpoint at `url`
    async fn request(&self, url: &str, method: &str, params: Value) -> Result<Value, RpcError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms.max(config.base_delay_ms)),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (1-based), doubling each time
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl From<TransportError> for RpcError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::ErrorResp(payload) => RpcError::Rpc {
                code: payload.code,
                message: payload.message.to_string(),
            },
            TransportError::DeserError { err, .. } => RpcError::Malformed(format!("invalid response: {}", err)),
            TransportError::SerError(err) => RpcError::Malformed(format!("invalid params: {}", err)),
            TransportError::NullResp => RpcError::Malformed("null response".into()),
            // Non-2xx gateway answers land here as http errors
            TransportError::Transport(kind) => RpcError::Transport(kind.to_string()),
            other => RpcError::Transport(other.to_string()),
        }
    }
}

/// alloy-backed JSON-RPC client, one provider per endpoint url
pub struct HttpRpc {
    client: reqwest::Client,
    retry: RetryPolicy,
    providers: Mutex<HashMap<String, RootProvider>>,
}

impl HttpRpc {
    pub fn new(timeout: Duration, retry: RetryPolicy) -> Result<Self, RpcError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RpcError::Transport(format!("failed to build http client: {}", e)))?;
        Ok(Self {
            client,
            retry,
            providers: Mutex::new(HashMap::new()),
        })
    }

    pub fn from_config(config: &RetryConfig) -> Result<Self, RpcError> {
        Self::new(config.timeout(), RetryPolicy::from(config))
    }

    fn provider(&self, url: &str) -> Result<RootProvider, RpcError> {
        let mut providers = self.providers.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(provider) = providers.get(url) {
            return Ok(provider.clone());
        }
        let endpoint: reqwest::Url = url
            .parse()
            .map_err(|e| RpcError::Transport(format!("invalid rpc url {}: {}", url, e)))?;
        let http = Http::with_client(self.client.clone(), endpoint);
        let provider = RootProvider::new(RpcClient::new(http, false));
        providers.insert(url.to_string(), provider.clone());
        Ok(provider)
    }

    async fn send_once(&self, provider: &RootProvider, method: &str, params: &Value) -> Result<Value, RpcError> {
        let value: Value = provider
            .raw_request(method.to_string().into(), params.clone())
            .await?;
        Ok(value)
    }
}

#[async_trait::async_trait]
impl JsonRpc for HttpRpc {
    async fn request(&self, url: &str, method: &str, params: Value) -> Result<Value, RpcError> {
        let provider = self.provider(url)?;
        let mut attempt = 1;
        loop {
            match self.send_once(&provider, method, &params).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    debug!(%method, attempt, ?delay, error = %err, "retrying rpc request");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    if err.is_transient() {
                        warn!(%method, attempts = attempt, error = %err, "rpc request gave up");
                    }
                    return Err(err);
                }
            }
        }
    }
}
