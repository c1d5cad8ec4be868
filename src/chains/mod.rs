//! Chain registry - static lookup from chain id to network endpoints
//!
//! Every other component resolves RPC URLs, explorer links and native coin
//! symbols through this table. An unknown id means "unsupported chain" and
//! dependent reads must not be issued.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};

use crate::config::ChainOverride;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainInfo {
    pub chain_id: u64,
    pub name: String,
    pub rpc_url: String,
    pub explorer_url: String,
    pub symbol: String,
    #[serde(rename = "logoURI")]
    pub logo_uri: String,
}

impl ChainInfo {
    fn new(chain_id: u64, name: &str, rpc_url: &str, explorer_url: &str, symbol: &str, logo: &str) -> Self {
        Self {
            chain_id,
            name: name.to_string(),
            rpc_url: rpc_url.to_string(),
            explorer_url: explorer_url.to_string(),
            symbol: symbol.to_string(),
            logo_uri: format!("/images/chains/{}", logo),
        }
    }

    pub fn tx_url(&self, hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_url.trim_end_matches('/'), hash)
    }

    pub fn address_url(&self, address: &str) -> String {
        format!("{}/address/{}", self.explorer_url.trim_end_matches('/'), address)
    }

    /// Parameter object for `wallet_addEthereumChain`
    pub fn add_chain_params(&self) -> Value {
        json!([{
            "chainId": hex_chain_id(self.chain_id),
            "chainName": self.name,
            "rpcUrls": [self.rpc_url],
            "blockExplorerUrls": [self.explorer_url],
            "nativeCurrency": {
                "symbol": self.symbol,
                "decimals": 18
            }
        }])
    }
}

#[derive(Debug, Clone)]
pub struct ChainRegistry {
    chains: BTreeMap<u64, ChainInfo>,
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ChainRegistry {
    /// Networks the dapp contracts are deployed on
    pub fn builtin() -> Self {
        let chains = [
            ChainInfo::new(56, "Binance Smart Chain", "https://bsc-dataseed.binance.org", "https://bscscan.com", "BNB", "bsc.svg"),
            ChainInfo::new(137, "Polygon", "https://polygon-rpc.com", "https://polygonscan.com", "MATIC", "polygon.svg"),
            ChainInfo::new(32520, "Bitgert", "https://mainnet-rpc.brisescan.com", "https://brisescan.com", "BRISE", "bitgert.svg"),
            ChainInfo::new(1024, "CLV Parachain", "https://api-para.clover.finance", "https://clvscan.com", "CLV", "clover.svg"),
            ChainInfo::new(43114, "Avalanche C-Chain", "https://api.avax.network/ext/bc/C/rpc", "https://snowtrace.io", "AVAX", "avalanche.svg"),
            ChainInfo::new(40, "Telos EVM", "https://mainnet.telos.net/evm", "https://teloscan.io", "TLOS", "telos.svg"),
            ChainInfo::new(86, "GateChain", "https://evm.gatenode.cc", "https://gatescan.org", "GT", "gatechain.svg"),
            ChainInfo::new(97, "BSC Testnet", "https://data-seed-prebsc-1-s1.binance.org:8545", "https://testnet.bscscan.com", "tBNB", "bsc.svg"),
            ChainInfo::new(311, "Omax", "https://mainapi.omaxray.com", "https://omaxray.com", "OMAX", "omax.svg"),
            ChainInfo::new(888, "Wanchain", "https://gwan-ssl.wandevs.org:56891", "https://wanscan.org", "WAN", "wanchain.svg"),
            ChainInfo::new(66, "OKX Chain", "https://exchainrpc.okex.org", "https://www.oklink.com/okexchain", "OKT", "okx.svg"),
        ];
        Self {
            chains: chains.into_iter().map(|c| (c.chain_id, c)).collect(),
        }
    }

    /// Merge config overrides over the built-in table; unknown ids are added
    /// only when they carry an RPC URL.
    pub fn with_overrides(mut self, overrides: &[ChainOverride]) -> Self {
        for o in overrides {
            match self.chains.get_mut(&o.chain_id) {
                Some(chain) => {
                    if let Some(name) = &o.name {
                        chain.name = name.clone();
                    }
                    if let Some(rpc) = &o.rpc_url {
                        chain.rpc_url = rpc.clone();
                    }
                    if let Some(explorer) = &o.explorer_url {
                        chain.explorer_url = explorer.clone();
                    }
                    if let Some(symbol) = &o.symbol {
                        chain.symbol = symbol.clone();
                    }
                    if let Some(logo) = &o.logo_uri {
                        chain.logo_uri = logo.clone();
                    }
                }
                None => {
                    let Some(rpc_url) = o.rpc_url.clone() else {
                        continue;
                    };
                    self.chains.insert(
                        o.chain_id,
                        ChainInfo {
                            chain_id: o.chain_id,
                            name: o.name.clone().unwrap_or_else(|| format!("Chain {}", o.chain_id)),
                            rpc_url,
                            explorer_url: o.explorer_url.clone().unwrap_or_default(),
                            symbol: o.symbol.clone().unwrap_or_else(|| "ETH".to_string()),
                            logo_uri: o.logo_uri.clone().unwrap_or_default(),
                        },
                    );
                }
            }
        }
        self
    }

    pub fn lookup(&self, chain_id: u64) -> Option<&ChainInfo> {
        self.chains.get(&chain_id)
    }

    pub fn is_supported(&self, chain_id: u64) -> bool {
        self.chains.contains_key(&chain_id)
    }

    pub fn supported_chain_ids(&self) -> Vec<u64> {
        self.chains.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChainInfo> {
        self.chains.values()
    }
}

/// Minimal hex form of a chain id (`0x61` for 97)
pub fn hex_chain_id(chain_id: u64) -> String {
    format!("0x{:x}", chain_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUPPORTED: [u64; 11] = [56, 137, 32520, 1024, 43114, 40, 86, 97, 311, 888, 66];

    #[test]
    fn test_every_supported_chain_is_populated() {
        let registry = ChainRegistry::builtin();
        for id in SUPPORTED {
            let chain = registry.lookup(id).expect("supported chain");
            assert_eq!(chain.chain_id, id);
            assert!(chain.rpc_url.starts_with("https://"));
            assert!(!chain.explorer_url.is_empty());
            assert!(!chain.symbol.is_empty());
            assert!(!chain.logo_uri.is_empty());
        }
        assert_eq!(registry.supported_chain_ids().len(), SUPPORTED.len());
    }

    #[test]
    fn test_unknown_chain_is_absent() {
        let registry = ChainRegistry::builtin();
        for id in [0u64, 1, 5, 98, 8453, u64::MAX] {
            assert!(registry.lookup(id).is_none(), "chain {id} should be unsupported");
        }
    }

    #[test]
    fn test_hex_chain_id() {
        assert_eq!(hex_chain_id(97), "0x61");
        assert_eq!(hex_chain_id(56), "0x38");
        assert_eq!(hex_chain_id(32520), "0x7f08");
    }

    #[test]
    fn test_overrides_merge_and_add() {
        let registry = ChainRegistry::builtin().with_overrides(&[
            ChainOverride {
                chain_id: 56,
                name: None,
                rpc_url: Some("https://private-bsc.example".into()),
                explorer_url: None,
                symbol: None,
                logo_uri: None,
            },
            ChainOverride {
                chain_id: 31337,
                name: Some("Anvil".into()),
                rpc_url: Some("http://127.0.0.1:8545".into()),
                explorer_url: None,
                symbol: None,
                logo_uri: None,
            },
            ChainOverride {
                chain_id: 4242,
                name: Some("No RPC".into()),
                rpc_url: None,
                explorer_url: None,
                symbol: None,
                logo_uri: None,
            },
        ]);

        let bsc = registry.lookup(56).unwrap();
        assert_eq!(bsc.rpc_url, "https://private-bsc.example");
        assert_eq!(bsc.symbol, "BNB");
        assert_eq!(registry.lookup(31337).unwrap().name, "Anvil");
        assert!(registry.lookup(4242).is_none());
    }

    #[test]
    fn test_explorer_links() {
        let registry = ChainRegistry::builtin();
        let bsc = registry.lookup(56).unwrap();
        assert_eq!(bsc.tx_url("0xabc"), "https://bscscan.com/tx/0xabc");
        assert_eq!(bsc.address_url("0xdef"), "https://bscscan.com/address/0xdef");
    }

    #[test]
    fn test_add_chain_params() {
        let registry = ChainRegistry::builtin();
        let params = registry.lookup(97).unwrap().add_chain_params();
        assert_eq!(params[0]["chainId"], "0x61");
        assert_eq!(params[0]["nativeCurrency"]["decimals"], 18);
        assert_eq!(params[0]["rpcUrls"][0], "https://data-seed-prebsc-1-s1.binance.org:8545");
    }
}
