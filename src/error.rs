//! Error types shared across the client core

use thiserror::Error;

/// Failure of a single JSON-RPC request against a node endpoint.
///
/// `Clone` so that deduplicated in-flight reads can hand the same outcome to
/// every waiter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RpcError {
    /// Endpoint unreachable, timed out, or answered without a JSON-RPC body
    #[error("transport error: {0}")]
    Transport(String),
    /// Node answered with a JSON-RPC error object
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    /// Response could not be decoded as a JSON-RPC envelope or result
    #[error("malformed response: {0}")]
    Malformed(String),
    /// `eth_call` result did not match the expected ABI return type
    #[error("abi decode failed: {0}")]
    Decode(String),
}

impl RpcError {
    /// Only transport failures are worth retrying
    pub fn is_transient(&self) -> bool {
        matches!(self, RpcError::Transport(_))
    }

    pub fn code(&self) -> Option<i64> {
        match self {
            RpcError::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Failure of a request against the HTTP indexing API
#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("indexer unreachable: {0}")]
    Transport(String),
    #[error("indexer returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed indexer response: {0}")]
    Malformed(String),
}

/// Wallet backend failures, retained by the session for display
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WalletError {
    #[error("unsupported chain id {0}")]
    UnsupportedChain(u64),
    #[error("request rejected by the user")]
    UserRejected,
    #[error("wallet did not answer in time")]
    Timeout,
    #[error("{0} wallet backend is not configured")]
    BackendUnavailable(String),
    #[error("wallet exposed no accounts")]
    NoAccounts,
    #[error("connection attempt superseded")]
    Superseded,
    #[error(transparent)]
    Rpc(#[from] RpcError),
}

/// Durable import store failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Input rejected before any network call is made
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("amount must be greater than zero")]
    ZeroAmount,
    #[error("amount exceeds balance ({balance} available)")]
    InsufficientBalance { balance: String },
    #[error("could not read balance: {0}")]
    BalanceUnavailable(RpcError),
}
