use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use alloy_primitives::{Address, B256};
use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::json;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use lunagens::aggregator::{Aggregator, AggregatorSettings, CollectionState, SaleKind};
use lunagens::chains::ChainRegistry;
use lunagens::config::{self, Config};
use lunagens::core::format::format_ether;
use lunagens::core::ChainContext;
use lunagens::detail::{
    multisig_wallet, pair_details, sale_contribution, sale_creator_fees, sale_raised, stake_event_pool_and_reward,
    staking_deployment_fee, staking_pool_info, token_data, ChainReaders, DetailHook, HookKey,
};
use lunagens::infrastructure::ethereum::{parse_b256, HttpRpc, JsonRpc};
use lunagens::infrastructure::indexer::{EventFilter, HttpIndexer, Indexer, RankFilter};
use lunagens::store::{DurableStore, MemoryStore, SqliteStore};
use lunagens::validation::{ensure_spendable, parse_address, parse_amount};
use lunagens::wallet::{connectors_from_config, ConnectorKind, SessionManager};

#[derive(Debug, Parser)]
#[command(
    name = "lunagens",
    version,
    about = "Lunagens: console client for the Vefi DEX, launchpad, multisig and staking dapps"
)]
struct Args {
    /// Config file (defaults to $XDG_CONFIG_HOME/lunagens/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Chain id to scope requests to (defaults to the configured chain)
    #[arg(long)]
    chain: Option<u64>,

    /// Account to scope account-level collections to
    #[arg(long)]
    account: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SaleArg {
    Public,
    Private,
}

impl From<SaleArg> for SaleKind {
    fn from(arg: SaleArg) -> Self {
        match arg {
            SaleArg::Public => SaleKind::Public,
            SaleArg::Private => SaleKind::Private,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List supported chains
    Chains,
    /// Token listing of the chain
    Listing,
    /// Most active pairs
    TopPairs,
    /// DEX swap/mint/burn events
    Events {
        #[arg(long, default_value_t = 1)]
        page: u64,
        /// all, swap, mint or burn
        #[arg(long, default_value = "all")]
        filter: EventFilter,
    },
    /// Reserve snapshots of a pair
    PriceHistory {
        pair: String,
        /// Look-back window in seconds
        #[arg(long)]
        period: Option<u64>,
    },
    /// Swaps executed on a pair
    Swaps {
        pair: String,
        #[arg(long)]
        period: Option<u64>,
    },
    /// Staking pools of the chain
    Pools {
        #[arg(long, default_value_t = 1)]
        page: u64,
    },
    /// Featured staking pools
    SpecialPools {
        #[arg(long, default_value_t = 1)]
        page: u64,
    },
    /// Staking pools owned by the account
    AccountPools {
        #[arg(long, default_value_t = 1)]
        page: u64,
    },
    /// Stakes made by the account
    Stakes {
        #[arg(long, default_value_t = 1)]
        page: u64,
    },
    /// Multisig wallets of the account, imported ones included
    Multisigs {
        #[arg(long, default_value_t = 1)]
        page: u64,
    },
    /// Launchpad sale items
    Sales {
        #[arg(value_enum)]
        kind: SaleArg,
        #[arg(long, default_value_t = 1)]
        page: u64,
        /// all, gold, silver or bronze
        #[arg(long, default_value = "all")]
        rank: String,
    },
    /// Import a liquidity pool address for the chain
    ImportPool { address: String },
    /// Import multisig wallet addresses for the chain
    ImportMultisig {
        #[arg(required = true)]
        addresses: Vec<String>,
    },
    /// Show imported pools and multisig wallets
    Imported,
    /// On-chain configuration and holdings of a staking pool
    PoolInfo { pool: String },
    /// Pool and pending reward of a stake
    StakeReward { tx_hash: String, stake_id: String },
    /// Native coin raised by a sale
    SaleRaised { sale_creator: String, sale_id: String },
    /// The account's contribution to a sale and the tokens it can withdraw
    SaleContribution {
        sale_creator: String,
        sale_id: String,
        /// Decimals of the sale token
        #[arg(long, default_value_t = 18)]
        decimals: u8,
    },
    /// Sale creation fee and the fee percentage taken from proceeds
    SaleFees { sale_creator: String },
    /// Native-coin fee for deploying a staking pool
    DeploymentFee { actions: String },
    /// Check a native-coin amount against the account's balance
    Spendable { amount: String },
    /// Tokens, reserves and LP position of a pair
    Pair { pair: String },
    /// ERC-20 metadata
    Token { token: String },
    /// Balance and transactions of a multisig wallet
    Multisig { wallet: String },
    /// Native balance of the account
    Balance,
    /// Connect a configured wallet backend and show the session
    Connect { wallet: ConnectorKind },
}

struct Runtime {
    config: Config,
    registry: Arc<ChainRegistry>,
    rpc: Arc<dyn JsonRpc>,
    context: ChainContext,
}

impl Runtime {
    fn chain_id(&self) -> u64 {
        self.context.chain_or(self.config.default_chain_id)
    }

    fn account(&self) -> Result<Address> {
        self.context
            .account
            .ok_or_else(|| anyhow!("this command needs --account"))
    }

    fn readers(&self) -> ChainReaders {
        ChainReaders::new(self.rpc.clone(), self.registry.clone())
    }

    fn store(&self) -> Arc<dyn DurableStore> {
        match open_store(&self.config) {
            Ok(store) => store,
            Err(err) => {
                warn!(error = %err, "import store unavailable, imports will not persist");
                Arc::new(MemoryStore::new())
            }
        }
    }

    fn indexer(&self) -> Result<Indexer> {
        let http = HttpIndexer::new(&self.config.indexer_url, self.config.retry.timeout())?;
        Ok(Indexer::new(Arc::new(http)))
    }

    async fn aggregator(&self) -> Result<Aggregator> {
        let aggregator = Aggregator::new(
            self.indexer()?,
            self.store(),
            AggregatorSettings::from(&self.config),
        );
        aggregator.apply_context(self.context.clone()).await;
        Ok(aggregator)
    }

    /// Run a hook once for the command's chain
    async fn detail<V, F, Fut>(&self, primary: &str, fetch: F) -> V
    where
        V: Default + Clone,
        F: FnOnce(lunagens::detail::ContractReader) -> Fut,
        Fut: std::future::Future<Output = Result<V, lunagens::error::RpcError>>,
    {
        DetailHook::new(self.readers())
            .load(HookKey::new(self.chain_id(), primary), fetch)
            .await
    }
}

fn open_store(config: &Config) -> Result<Arc<dyn DurableStore>> {
    let path = config::imports_db_path(config).context("no data directory")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    Ok(Arc::new(SqliteStore::open(&path)?))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("LUNAGENS_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_collection<T: Serialize>(state: &CollectionState<T>, page_size: u64) -> Result<()> {
    print_json(&json!({
        "status": state.status,
        "page": state.data.page,
        "pageCount": state.data.page_count(page_size),
        "totalItems": state.data.total_items,
        "items": state.data.items,
    }))
}

fn parse_hash(label: &str, value: &str) -> Result<B256> {
    parse_b256(value).ok_or_else(|| anyhow!("invalid {}: {}", label, value))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => config::load_from(path.clone()),
        None => config::load(),
    };
    let registry = Arc::new(ChainRegistry::builtin().with_overrides(&config.chains));
    let rpc: Arc<dyn JsonRpc> = Arc::new(HttpRpc::from_config(&config.retry)?);
    let account = args.account.as_deref().map(parse_address).transpose()?;
    let context = ChainContext {
        chain_id: args.chain,
        account,
        provider: None,
    };
    let rt = Runtime {
        config,
        registry,
        rpc,
        context,
    };
    let page_size = rt.config.page_size;

    match args.command {
        Command::Chains => {
            let chains: Vec<_> = rt.registry.iter().collect();
            print_json(&chains)?;
        }
        Command::Listing => {
            let aggregator = rt.aggregator().await?;
            aggregator.fetch_listing().await;
            print_collection(&aggregator.listing_state().await, page_size)?;
        }
        Command::TopPairs => {
            let aggregator = rt.aggregator().await?;
            aggregator.fetch_top_pairs().await;
            print_collection(&aggregator.top_pairs().await, page_size)?;
        }
        Command::Events { page, filter } => {
            let aggregator = rt.aggregator().await?;
            aggregator.fetch_events(page, filter).await;
            let (_, state) = aggregator.events().await;
            print_collection(&state, page_size)?;
        }
        Command::PriceHistory { pair, period } => {
            let pair = format!("{:#x}", parse_address(&pair)?);
            let history = rt.indexer()?.price_history(&pair, rt.chain_id(), period).await?;
            print_json(&history)?;
        }
        Command::Swaps { pair, period } => {
            let pair = format!("{:#x}", parse_address(&pair)?);
            let swaps = rt.indexer()?.swap_events(&pair, rt.chain_id(), period).await?;
            print_json(&swaps)?;
        }
        Command::Pools { page } => {
            let aggregator = rt.aggregator().await?;
            aggregator.fetch_staking_pools(page).await;
            print_collection(&aggregator.staking_pools().await, page_size)?;
        }
        Command::SpecialPools { page } => {
            let aggregator = rt.aggregator().await?;
            aggregator.fetch_special_staking_pools(page).await;
            print_collection(&aggregator.special_staking_pools().await, page_size)?;
        }
        Command::AccountPools { page } => {
            rt.account()?;
            let aggregator = rt.aggregator().await?;
            aggregator.fetch_account_staking_pools(page).await;
            print_collection(&aggregator.account_staking_pools().await, page_size)?;
        }
        Command::Stakes { page } => {
            rt.account()?;
            let aggregator = rt.aggregator().await?;
            aggregator.fetch_stakes_by_account(page).await;
            print_collection(&aggregator.stakes_by_account().await, page_size)?;
        }
        Command::Multisigs { page } => {
            rt.account()?;
            let aggregator = rt.aggregator().await?;
            aggregator.fetch_multisigs_by_account(page).await;
            let state = aggregator.multisigs_by_account().await;
            print_json(&json!({
                "status": state.status,
                "pageCount": state.data.page_count(page_size),
                "wallets": aggregator.multisigs_with_imports().await,
            }))?;
        }
        Command::Sales { kind, page, rank } => {
            let rank: RankFilter = rank.parse().map_err(|e: String| anyhow!(e))?;
            let aggregator = rt.aggregator().await?;
            aggregator.fetch_sale_items(kind.into(), page).await;
            let state = aggregator.sale_items(kind.into()).await;
            print_json(&json!({
                "status": state.status,
                "page": state.data.page,
                "pageCount": state.data.page_count(page_size),
                "items": aggregator.sale_items_by_rank(kind.into(), rank).await,
            }))?;
        }
        Command::ImportPool { address } => {
            let address = parse_address(&address)?;
            let aggregator = rt.aggregator().await?;
            let chain_id = rt.chain_id();
            aggregator
                .apply_context(ChainContext::new(chain_id, rt.context.account))
                .await;
            if rt.context.account.is_some() {
                aggregator.fetch_liquidity_pools_for_user().await;
            }
            let added = aggregator.import_pool(&format!("{:#x}", address)).await?;
            print_json(&json!({ "added": added, "pools": aggregator.pools_with_imports().await }))?;
        }
        Command::ImportMultisig { addresses } => {
            let addresses = addresses
                .iter()
                .map(|a| parse_address(a).map(|a| format!("{:#x}", a)))
                .collect::<Result<Vec<_>, _>>()?;
            let aggregator = rt.aggregator().await?;
            let chain_id = rt.chain_id();
            aggregator
                .apply_context(ChainContext::new(chain_id, rt.context.account))
                .await;
            if rt.context.account.is_some() {
                aggregator.fetch_multisigs_by_account(1).await;
            }
            let added = aggregator.import_multisigs(&addresses).await?;
            print_json(&json!({ "added": added, "wallets": aggregator.multisigs_with_imports().await }))?;
        }
        Command::Imported => {
            let aggregator = rt.aggregator().await?;
            print_json(&json!({
                "pools": aggregator.imported_pools().await,
                "multisigs": aggregator.imported_multisigs().await,
            }))?;
        }
        Command::PoolInfo { pool } => {
            let address = parse_address(&pool)?;
            let info = rt
                .detail(&pool, |reader| async move { staking_pool_info(&reader, address).await })
                .await;
            print_json(&info)?;
        }
        Command::StakeReward { tx_hash, stake_id } => {
            let hash = parse_hash("transaction hash", &tx_hash)?;
            let stake = parse_hash("stake id", &stake_id)?;
            let reward = rt
                .detail(&tx_hash, |reader| async move {
                    stake_event_pool_and_reward(&reader, hash, stake).await
                })
                .await;
            print_json(&reward)?;
        }
        Command::SaleRaised { sale_creator, sale_id } => {
            let creator = parse_address(&sale_creator)?;
            let id = parse_hash("sale id", &sale_id)?;
            let raised = rt
                .detail(&sale_id, |reader| async move { sale_raised(&reader, creator, id).await })
                .await;
            print_json(&raised)?;
        }
        Command::SaleContribution {
            sale_creator,
            sale_id,
            decimals,
        } => {
            let creator = parse_address(&sale_creator)?;
            let id = parse_hash("sale id", &sale_id)?;
            let account = rt.account()?;
            let contribution = rt
                .detail(&sale_id, |reader| async move {
                    sale_contribution(&reader, creator, id, account, decimals).await
                })
                .await;
            print_json(&contribution)?;
        }
        Command::SaleFees { sale_creator } => {
            let creator = parse_address(&sale_creator)?;
            let fees = rt
                .detail(&sale_creator, |reader| async move { sale_creator_fees(&reader, creator).await })
                .await;
            print_json(&fees)?;
        }
        Command::DeploymentFee { actions } => {
            let address = parse_address(&actions)?;
            let fee = rt
                .detail(&actions, |reader| async move { staking_deployment_fee(&reader, address).await })
                .await;
            print_json(&json!({ "deploymentFee": fee }))?;
        }
        Command::Spendable { amount } => {
            let account = rt.account()?;
            let chain_id = rt.chain_id();
            let Some(reader) = rt.readers().reader(chain_id) else {
                bail!("unsupported chain {}", chain_id);
            };
            let wei = parse_amount(&amount, 18)?;
            let balance = ensure_spendable(&reader, account, wei).await?;
            print_json(&json!({
                "amount": format_ether(wei),
                "balance": format_ether(balance),
                "symbol": reader.chain().symbol,
            }))?;
        }
        Command::Pair { pair } => {
            let address = parse_address(&pair)?;
            let account = rt.context.account;
            let details = rt
                .detail(&pair, |reader| async move { pair_details(&reader, address, account).await })
                .await;
            print_json(&details)?;
        }
        Command::Token { token } => {
            let address = parse_address(&token)?;
            let data = rt
                .detail(&token, |reader| async move { token_data(&reader, address).await })
                .await;
            print_json(&data)?;
        }
        Command::Multisig { wallet } => {
            let address = parse_address(&wallet)?;
            let data = rt
                .detail(&wallet, |reader| async move { multisig_wallet(&reader, address).await })
                .await;
            print_json(&json!({ "executed": data.executed_count(), "wallet": data }))?;
        }
        Command::Balance => {
            let account = rt.account()?;
            let chain_id = rt.chain_id();
            let Some(reader) = rt.readers().reader(chain_id) else {
                bail!("unsupported chain {}", chain_id);
            };
            let wei = reader.native_balance(account).await?;
            print_json(&json!({
                "chainId": chain_id,
                "account": format!("{:#x}", account),
                "balance": format_ether(wei),
                "symbol": reader.chain().symbol,
            }))?;
        }
        Command::Connect { wallet } => {
            let connectors = connectors_from_config(
                &rt.config.wallets,
                rt.rpc.clone(),
                rt.registry.supported_chain_ids(),
                rt.config.retry.timeout(),
            );
            let session = SessionManager::new(rt.registry.clone(), rt.rpc.clone()).with_connectors(connectors);
            let context = session.connect(wallet).await?;
            print_json(&json!({
                "wallet": wallet,
                "chainId": context.chain_id,
                "account": context.account_hex(),
                "balance": session.balance(),
            }))?;
        }
    }

    Ok(())
}
