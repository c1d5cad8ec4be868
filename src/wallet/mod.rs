//! Wallet session manager
//!
//! Tracks the active account, chain and provider across the supported wallet
//! backends, and derives the native balance of the active account.

mod connector;
mod session;

pub use connector::{
    connectors_from_config, Activation, ConnectorKind, Eip1193Connector, WalletConnector,
    USER_REJECTED_CODE,
};
pub use session::{ProviderEvent, SessionManager, SessionStatus};
