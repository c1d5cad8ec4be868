use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_INDEXER_URL: &str = "http://127.0.0.1:7000";
pub const DEFAULT_CHAIN_ID: u64 = 97;
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Per-chain override merged over the built-in registry
#[derive(Debug, Clone, Deserialize)]
pub struct ChainOverride {
    pub chain_id: u64,
    pub name: Option<String>,
    pub rpc_url: Option<String>,
    pub explorer_url: Option<String>,
    pub symbol: Option<String>,
    pub logo_uri: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub timeout_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 250,
            max_delay_ms: 4_000,
            timeout_secs: 15,
        }
    }
}

impl RetryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// EIP-1193 bridge endpoints backing each wallet backend
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletEndpoints {
    pub injected: Option<String>,
    pub wallet_connect: Option<String>,
    pub torus: Option<String>,
    pub okx: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub indexer_url: String,
    pub default_chain_id: u64,
    pub page_size: u64,
    pub retry: RetryConfig,
    pub chains: Vec<ChainOverride>,
    pub wallets: WalletEndpoints,
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            indexer_url: DEFAULT_INDEXER_URL.to_string(),
            default_chain_id: DEFAULT_CHAIN_ID,
            page_size: DEFAULT_PAGE_SIZE,
            retry: RetryConfig::default(),
            chains: Vec::new(),
            wallets: WalletEndpoints::default(),
            data_dir: None,
        }
    }
}

impl Config {
    /// Parse a TOML document, applying env overrides on top
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("LUNAGENS_INDEXER_URL") {
            if !url.trim().is_empty() {
                self.indexer_url = url.trim().to_string();
            }
        }
        if self.page_size == 0 {
            self.page_size = DEFAULT_PAGE_SIZE;
        }
    }
}

pub fn load() -> Config {
    let Some(path) = config_path() else {
        return defaults();
    };
    load_from(path)
}

pub fn load_from(path: PathBuf) -> Config {
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(_) => return defaults(),
    };
    match Config::from_toml(&content) {
        Ok(config) => config,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "ignoring unparsable config");
            defaults()
        }
    }
}

fn defaults() -> Config {
    let mut config = Config::default();
    config.apply_env();
    config
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("LUNAGENS_CONFIG").map(PathBuf::from) {
        return Some(path);
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        return Some(xdg.join("lunagens").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".config").join("lunagens").join("config.toml"));
    }

    directories::ProjectDirs::from("io", "lunagens", "lunagens")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

pub fn data_dir(config: &Config) -> Option<PathBuf> {
    if let Some(dir) = &config.data_dir {
        return Some(dir.clone());
    }
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME").map(PathBuf::from) {
        return Some(xdg.join("lunagens"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".local").join("share").join("lunagens"));
    }
    directories::ProjectDirs::from("io", "lunagens", "lunagens")
        .map(|dirs| dirs.data_dir().to_path_buf())
}

pub fn imports_db_path(config: &Config) -> Option<PathBuf> {
    data_dir(config).map(|dir| dir.join("imports.sqlite3"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_toml(
            r#"
            indexer_url = "https://indexer.example"
            default_chain_id = 56
            page_size = 25

            [retry]
            max_attempts = 5

            [[chains]]
            chain_id = 56
            rpc_url = "https://bsc.example"

            [wallets]
            injected = "http://127.0.0.1:1248"
            "#,
        )
        .unwrap();

        assert_eq!(config.default_chain_id, 56);
        assert_eq!(config.page_size, 25);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay_ms, 250);
        assert_eq!(config.chains.len(), 1);
        assert_eq!(config.chains[0].rpc_url.as_deref(), Some("https://bsc.example"));
        assert_eq!(config.wallets.injected.as_deref(), Some("http://127.0.0.1:1248"));
        assert!(config.wallets.torus.is_none());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.default_chain_id, DEFAULT_CHAIN_ID);
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert!(config.chains.is_empty());
    }

    #[test]
    fn test_zero_page_size_falls_back() {
        let config = Config::from_toml("page_size = 0").unwrap();
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = load_from(PathBuf::from("/nonexistent/lunagens/config.toml"));
        assert_eq!(config.default_chain_id, DEFAULT_CHAIN_ID);
    }
}
