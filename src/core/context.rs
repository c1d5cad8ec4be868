//! Chain/account context shared by the aggregator and detail hooks

use alloy_primitives::Address;

use crate::wallet::ConnectorKind;

/// Opaque handle of the wallet session that produced a context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderHandle {
    pub kind: ConnectorKind,
    /// Increments on every successful activation
    pub session: u64,
}

/// Active identity and chain, owned by the session manager
///
/// Every paginated fetch and contract read is scoped to the context that was
/// current when it was issued.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainContext {
    pub chain_id: Option<u64>,
    pub account: Option<Address>,
    pub provider: Option<ProviderHandle>,
}

impl ChainContext {
    pub fn new(chain_id: u64, account: Option<Address>) -> Self {
        Self {
            chain_id: Some(chain_id),
            account,
            provider: None,
        }
    }

    /// Chain used for indexer requests, falling back when no wallet chain is known
    pub fn chain_or(&self, fallback: u64) -> u64 {
        self.chain_id.unwrap_or(fallback)
    }

    pub fn is_active(&self) -> bool {
        self.chain_id.is_some() && self.account.is_some()
    }

    /// Lowercase `0x` form of the account, as the indexer expects it in paths
    pub fn account_hex(&self) -> Option<String> {
        self.account.map(|a| format!("{:#x}", a))
    }

    pub fn same_chain(&self, other: &ChainContext) -> bool {
        self.chain_id == other.chain_id
    }

    pub fn same_account(&self, other: &ChainContext) -> bool {
        self.account == other.account
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_fallback() {
        let ctx = ChainContext::default();
        assert_eq!(ctx.chain_or(97), 97);
        assert!(!ctx.is_active());

        let ctx = ChainContext::new(56, None);
        assert_eq!(ctx.chain_or(97), 56);
        assert!(!ctx.is_active());
    }

    #[test]
    fn test_account_hex_is_lowercase() {
        let account: Address = "0xAbCdEf0123456789aBcDeF0123456789AbCdEf01".parse().unwrap();
        let ctx = ChainContext::new(56, Some(account));
        assert_eq!(
            ctx.account_hex().as_deref(),
            Some("0xabcdef0123456789abcdef0123456789abcdef01")
        );
        assert!(ctx.is_active());
    }
}
