//! Indexed-data aggregator
//!
//! Client-side cache of the paginated, chain-scoped collections served by the
//! indexing API, merged with the addresses a user imported locally. Every
//! fetch is scoped to the [`ChainContext`] current when it was issued and
//! carries a request token, so a result that lands after the context moved
//! on is discarded instead of written.

mod collection;

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub use collection::{CollectionState, CollectionStatus, PagedCollection, RequestSlot, RequestToken};

use crate::config::Config;
use crate::core::format::normalize_address;
use crate::core::ChainContext;
use crate::error::{IndexerError, StoreError};
use crate::infrastructure::indexer::{
    EventFilter, EventModel, Indexer, ListingModel, RankFilter, RawPage, StakeEventModel,
    TokenSaleItemModel,
};
use crate::store::{DurableStore, ImportedSet, IMPORTED_MULTISIGS_KEY, IMPORTED_POOLS_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorSettings {
    /// Chain used when no wallet chain is known
    pub default_chain_id: u64,
    pub page_size: u64,
}

impl From<&Config> for AggregatorSettings {
    fn from(config: &Config) -> Self {
        Self {
            default_chain_id: config.default_chain_id,
            page_size: config.page_size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleKind {
    Public,
    Private,
}

/// Which scopes a context transition invalidated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextChange {
    pub chain_changed: bool,
    pub account_changed: bool,
}

impl ContextChange {
    pub fn is_empty(&self) -> bool {
        !self.chain_changed && !self.account_changed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Chain,
    Account,
}

/// Chain and account a fetch was issued for
#[derive(Debug, Clone)]
struct Target {
    chain_id: u64,
    account: Option<String>,
}

impl Target {
    fn account(&self) -> &str {
        self.account.as_deref().unwrap_or_default()
    }
}

#[derive(Default)]
struct State {
    context: ChainContext,

    listing: RequestSlot<ListingModel>,
    listing_dictionary: HashMap<String, ListingModel>,
    /// Session-only token imports, per chain
    imported_tokens: BTreeMap<u64, Vec<ListingModel>>,
    top_pairs: RequestSlot<String>,
    user_pools: RequestSlot<String>,
    events: RequestSlot<EventModel>,
    events_filter: EventFilter,

    staking_pools: RequestSlot<String>,
    special_staking_pools: RequestSlot<String>,
    account_staking_pools: RequestSlot<String>,
    stakes_by_account: RequestSlot<StakeEventModel>,

    multisigs_by_account: RequestSlot<String>,

    public_sales: RequestSlot<TokenSaleItemModel>,
    private_sales: RequestSlot<TokenSaleItemModel>,

    imported_pools: ImportedSet,
    imported_multisigs: ImportedSet,
}

impl State {
    fn invalidate_chain_scoped(&mut self) {
        self.listing.invalidate();
        self.listing_dictionary.clear();
        self.top_pairs.invalidate();
        self.events.invalidate();
        self.events_filter = EventFilter::All;
        self.staking_pools.invalidate();
        self.special_staking_pools.invalidate();
        self.public_sales.invalidate();
        self.private_sales.invalidate();
    }

    fn invalidate_account_scoped(&mut self) {
        self.user_pools.invalidate();
        self.account_staking_pools.invalidate();
        self.stakes_by_account.invalidate();
        self.multisigs_by_account.invalidate();
    }

    fn imported_tokens_for(&self, chain_id: u64) -> &[ListingModel] {
        self.imported_tokens.get(&chain_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Dictionary by lowercase address; server entries shadow imported ones
    fn rebuild_dictionary(&mut self, chain_id: u64) {
        let mut dictionary = HashMap::new();
        for model in self.imported_tokens_for(chain_id).iter().chain(self.listing.items()) {
            dictionary.insert(normalize_address(&model.address), model.clone());
        }
        self.listing_dictionary = dictionary;
    }
}

struct Inner {
    indexer: Indexer,
    store: Arc<dyn DurableStore>,
    settings: AggregatorSettings,
    state: RwLock<State>,
}

/// Cheaply cloneable handle to the aggregator state
#[derive(Clone)]
pub struct Aggregator {
    inner: Arc<Inner>,
}

impl Aggregator {
    /// Build the aggregator and load the imported sets from `store`
    pub fn new(indexer: Indexer, store: Arc<dyn DurableStore>, settings: AggregatorSettings) -> Self {
        let imported_pools = load_imported(store.as_ref(), IMPORTED_POOLS_KEY);
        let imported_multisigs = load_imported(store.as_ref(), IMPORTED_MULTISIGS_KEY);
        let state = State {
            imported_pools,
            imported_multisigs,
            ..State::default()
        };
        Self {
            inner: Arc::new(Inner {
                indexer,
                store,
                settings,
                state: RwLock::new(state),
            }),
        }
    }

    pub fn settings(&self) -> AggregatorSettings {
        self.inner.settings
    }

    pub async fn context(&self) -> ChainContext {
        self.inner.state.read().await.context.clone()
    }

    // === Context tracking ===

    /// Record a new context and invalidate what it makes stale
    pub async fn apply_context(&self, context: ChainContext) -> ContextChange {
        let mut state = self.inner.state.write().await;
        let change = ContextChange {
            chain_changed: !state.context.same_chain(&context),
            account_changed: !state.context.same_account(&context),
        };
        state.context = context;

        if change.chain_changed {
            state.invalidate_chain_scoped();
            state.invalidate_account_scoped();
            let chain_id = state.context.chain_or(self.inner.settings.default_chain_id);
            state.rebuild_dictionary(chain_id);
        } else if change.account_changed {
            state.invalidate_account_scoped();
        }
        change
    }

    /// Refetch the first page of every collection a change invalidated
    pub async fn refetch(&self, change: ContextChange) {
        let context = self.context().await;
        let chain_known = context.chain_id.is_some();
        let account_known = context.account.is_some();

        if change.chain_changed && chain_known {
            info!(chain_id = ?context.chain_id, "chain changed, refetching collections");
            futures::join!(
                self.fetch_listing(),
                self.fetch_top_pairs(),
                self.fetch_events(1, EventFilter::All),
                self.fetch_staking_pools(1),
                self.fetch_special_staking_pools(1),
                self.fetch_sale_items(SaleKind::Public, 1),
                self.fetch_sale_items(SaleKind::Private, 1),
            );
        }

        if (change.chain_changed || change.account_changed) && chain_known && account_known {
            futures::join!(
                self.fetch_liquidity_pools_for_user(),
                self.fetch_account_staking_pools(1),
                self.fetch_stakes_by_account(1),
                self.fetch_multisigs_by_account(1),
            );
        }
    }

    pub async fn on_context_change(&self, context: ChainContext) -> ContextChange {
        let change = self.apply_context(context).await;
        if !change.is_empty() {
            self.refetch(change).await;
        }
        change
    }

    /// Follow a session's context channel until its sender is dropped
    ///
    /// Invalidation happens before the next change is read; refetches run as
    /// their own tasks so that a slow indexer never delays invalidation.
    pub fn spawn_context_listener(&self, mut rx: watch::Receiver<ChainContext>) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            loop {
                let context = rx.borrow_and_update().clone();
                let change = this.apply_context(context).await;
                if !change.is_empty() {
                    let worker = this.clone();
                    tokio::spawn(async move { worker.refetch(change).await });
                }
                if rx.changed().await.is_err() {
                    debug!("context channel closed, listener exiting");
                    return;
                }
            }
        })
    }

    // === Fetch plumbing ===

    async fn run_fetch<T, F, Fut>(
        &self,
        name: &'static str,
        slot: fn(&mut State) -> &mut RequestSlot<T>,
        scope: Scope,
        page: u64,
        fetch: F,
    ) -> bool
    where
        T: Clone,
        F: FnOnce(Target) -> Fut,
        Fut: Future<Output = Result<RawPage<T>, IndexerError>>,
    {
        let page = page.max(1);
        let (token, target) = {
            let mut state = self.inner.state.write().await;
            let target = Target {
                chain_id: state.context.chain_or(self.inner.settings.default_chain_id),
                account: state.context.account_hex(),
            };
            if scope == Scope::Account && target.account.is_none() {
                debug!(collection = name, "no active account, skipping fetch");
                return false;
            }
            (slot(&mut *state).begin(), target)
        };

        let chain_id = target.chain_id;
        let result = fetch(target).await;

        let mut state = self.inner.state.write().await;
        let outcome = match result {
            Ok(raw) => Ok(PagedCollection::from_raw(raw, page)),
            Err(err) => {
                warn!(collection = name, chain_id, page, error = %err, "fetch failed");
                Err(err.to_string())
            }
        };
        let applied = slot(&mut *state).complete(token, outcome);
        if !applied {
            debug!(collection = name, chain_id, page, "discarding stale result");
        }
        applied
    }

    // === DEX ===

    pub async fn fetch_listing(&self) -> bool {
        let indexer = self.inner.indexer.clone();
        let applied = self
            .run_fetch("listing", |s| &mut s.listing, Scope::Chain, 1, move |t| async move {
                indexer.listing(t.chain_id).await.map(|items| RawPage {
                    total_items: items.len() as u64,
                    items,
                })
            })
            .await;
        if applied {
            let mut state = self.inner.state.write().await;
            let chain_id = state.context.chain_or(self.inner.settings.default_chain_id);
            state.rebuild_dictionary(chain_id);
        }
        applied
    }

    pub async fn fetch_top_pairs(&self) -> bool {
        let indexer = self.inner.indexer.clone();
        self.run_fetch("top_pairs", |s| &mut s.top_pairs, Scope::Chain, 1, move |t| async move {
            indexer.top_pairs(t.chain_id).await.map(|items| RawPage {
                total_items: items.len() as u64,
                items,
            })
        })
        .await
    }

    pub async fn fetch_liquidity_pools_for_user(&self) -> bool {
        let indexer = self.inner.indexer.clone();
        self.run_fetch("user_pools", |s| &mut s.user_pools, Scope::Account, 1, move |t| async move {
            indexer.liquidity_pools_for_user(t.chain_id, t.account()).await
        })
        .await
    }

    /// Fetch one page of DEX events; the filter is recorded with the result
    pub async fn fetch_events(&self, page: u64, filter: EventFilter) -> bool {
        let page = page.max(1);
        let (token, chain_id) = {
            let mut state = self.inner.state.write().await;
            let chain_id = state.context.chain_or(self.inner.settings.default_chain_id);
            (state.events.begin(), chain_id)
        };

        let result = self.inner.indexer.events(chain_id, page, filter).await;

        let mut state = self.inner.state.write().await;
        let outcome = match result {
            Ok(raw) => Ok(PagedCollection::from_raw(raw, page)),
            Err(err) => {
                warn!(collection = "events", chain_id, page, error = %err, "fetch failed");
                Err(err.to_string())
            }
        };
        let succeeded = outcome.is_ok();
        let applied = state.events.complete(token, outcome);
        if applied && succeeded {
            state.events_filter = filter;
        } else if !applied {
            debug!(collection = "events", chain_id, page, "discarding stale result");
        }
        applied
    }

    /// Add a token to the current chain's listing locally; no-op if its
    /// address is known
    pub async fn import_token(&self, model: ListingModel) -> bool {
        let mut state = self.inner.state.write().await;
        if state.listing_dictionary.contains_key(&normalize_address(&model.address)) {
            return false;
        }
        let chain_id = state.context.chain_or(self.inner.settings.default_chain_id);
        state.imported_tokens.entry(chain_id).or_default().push(model);
        state.rebuild_dictionary(chain_id);
        true
    }

    // === Staking ===

    pub async fn fetch_staking_pools(&self, page: u64) -> bool {
        let indexer = self.inner.indexer.clone();
        self.run_fetch("staking_pools", |s| &mut s.staking_pools, Scope::Chain, page, move |t| async move {
            indexer.staking_pools(t.chain_id, page).await
        })
        .await
    }

    pub async fn fetch_special_staking_pools(&self, page: u64) -> bool {
        let indexer = self.inner.indexer.clone();
        self.run_fetch(
            "special_staking_pools",
            |s| &mut s.special_staking_pools,
            Scope::Chain,
            page,
            move |t| async move { indexer.special_staking_pools(t.chain_id, page).await },
        )
        .await
    }

    pub async fn fetch_account_staking_pools(&self, page: u64) -> bool {
        let indexer = self.inner.indexer.clone();
        self.run_fetch(
            "account_staking_pools",
            |s| &mut s.account_staking_pools,
            Scope::Account,
            page,
            move |t| async move { indexer.account_staking_pools(t.chain_id, t.account(), page).await },
        )
        .await
    }

    pub async fn fetch_stakes_by_account(&self, page: u64) -> bool {
        let indexer = self.inner.indexer.clone();
        self.run_fetch(
            "stakes_by_account",
            |s| &mut s.stakes_by_account,
            Scope::Account,
            page,
            move |t| async move { indexer.account_stakes(t.chain_id, t.account(), page).await },
        )
        .await
    }

    // === Multisig ===

    pub async fn fetch_multisigs_by_account(&self, page: u64) -> bool {
        let indexer = self.inner.indexer.clone();
        self.run_fetch(
            "multisigs_by_account",
            |s| &mut s.multisigs_by_account,
            Scope::Account,
            page,
            move |t| async move { indexer.multisig_wallets(t.chain_id, t.account(), page).await },
        )
        .await
    }

    // === Launchpad ===

    pub async fn fetch_sale_items(&self, kind: SaleKind, page: u64) -> bool {
        let indexer = self.inner.indexer.clone();
        match kind {
            SaleKind::Public => {
                self.run_fetch("public_sales", |s| &mut s.public_sales, Scope::Chain, page, move |t| async move {
                    indexer.public_sales(t.chain_id, page).await
                })
                .await
            }
            SaleKind::Private => {
                self.run_fetch("private_sales", |s| &mut s.private_sales, Scope::Chain, page, move |t| async move {
                    indexer.private_sales(t.chain_id, page).await
                })
                .await
            }
        }
    }

    // === Imports ===

    /// Import a pool address for the active chain. Returns whether the set
    /// changed; the set is persisted on every change.
    pub async fn import_pool(&self, address: &str) -> Result<bool, StoreError> {
        let mut state = self.inner.state.write().await;
        let Some(chain_id) = state.context.chain_id else {
            debug!("no active chain, pool import ignored");
            return Ok(false);
        };
        let mut pools = state.imported_pools.clone();
        if !pools.import(chain_id, address, state.user_pools.items()) {
            return Ok(false);
        }
        // Memory only follows a successful write
        pools.persist(self.inner.store.as_ref(), IMPORTED_POOLS_KEY)?;
        state.imported_pools = pools;
        Ok(true)
    }

    /// Import multisig wallets for the active chain. Returns how many were added.
    pub async fn import_multisigs(&self, addresses: &[String]) -> Result<usize, StoreError> {
        let mut state = self.inner.state.write().await;
        let Some(chain_id) = state.context.chain_id else {
            debug!("no active chain, multisig import ignored");
            return Ok(0);
        };
        let mut wallets = state.imported_multisigs.clone();
        let added = wallets.import_many(chain_id, addresses, state.multisigs_by_account.items());
        if added > 0 {
            wallets.persist(self.inner.store.as_ref(), IMPORTED_MULTISIGS_KEY)?;
            state.imported_multisigs = wallets;
        }
        Ok(added)
    }

    pub async fn imported_pools(&self) -> BTreeMap<u64, Vec<String>> {
        self.inner.state.read().await.imported_pools.as_map().clone()
    }

    pub async fn imported_multisigs(&self) -> BTreeMap<u64, Vec<String>> {
        self.inner.state.read().await.imported_multisigs.as_map().clone()
    }

    // === Snapshots ===

    /// Server listing followed by the tokens imported on the current chain
    pub async fn tokens_listing(&self) -> Vec<ListingModel> {
        let state = self.inner.state.read().await;
        let chain_id = state.context.chain_or(self.inner.settings.default_chain_id);
        let mut listing = state.listing.items().to_vec();
        for model in state.imported_tokens_for(chain_id) {
            if !listing.iter().any(|m| m.address.eq_ignore_ascii_case(&model.address)) {
                listing.push(model.clone());
            }
        }
        listing
    }

    pub async fn listing_state(&self) -> CollectionState<ListingModel> {
        self.inner.state.read().await.listing.snapshot()
    }

    pub async fn token_by_address(&self, address: &str) -> Option<ListingModel> {
        let state = self.inner.state.read().await;
        state.listing_dictionary.get(&normalize_address(address)).cloned()
    }

    pub async fn listing_dictionary(&self) -> HashMap<String, ListingModel> {
        self.inner.state.read().await.listing_dictionary.clone()
    }

    pub async fn top_pairs(&self) -> CollectionState<String> {
        self.inner.state.read().await.top_pairs.snapshot()
    }

    pub async fn liquidity_pools_for_user(&self) -> CollectionState<String> {
        self.inner.state.read().await.user_pools.snapshot()
    }

    /// Server-known pools of the user followed by pools imported on this chain
    pub async fn pools_with_imports(&self) -> Vec<String> {
        let state = self.inner.state.read().await;
        let mut pools = state.user_pools.items().to_vec();
        if let Some(chain_id) = state.context.chain_id {
            pools.extend(state.imported_pools.for_chain(chain_id).iter().cloned());
        }
        pools
    }

    pub async fn events(&self) -> (EventFilter, CollectionState<EventModel>) {
        let state = self.inner.state.read().await;
        (state.events_filter, state.events.snapshot())
    }

    pub async fn staking_pools(&self) -> CollectionState<String> {
        self.inner.state.read().await.staking_pools.snapshot()
    }

    pub async fn special_staking_pools(&self) -> CollectionState<String> {
        self.inner.state.read().await.special_staking_pools.snapshot()
    }

    pub async fn account_staking_pools(&self) -> CollectionState<String> {
        self.inner.state.read().await.account_staking_pools.snapshot()
    }

    pub async fn stakes_by_account(&self) -> CollectionState<StakeEventModel> {
        self.inner.state.read().await.stakes_by_account.snapshot()
    }

    pub async fn multisigs_by_account(&self) -> CollectionState<String> {
        self.inner.state.read().await.multisigs_by_account.snapshot()
    }

    /// Server-known wallets of the account followed by wallets imported on this chain
    pub async fn multisigs_with_imports(&self) -> Vec<String> {
        let state = self.inner.state.read().await;
        let mut wallets = state.multisigs_by_account.items().to_vec();
        if let Some(chain_id) = state.context.chain_id {
            wallets.extend(state.imported_multisigs.for_chain(chain_id).iter().cloned());
        }
        wallets
    }

    pub async fn sale_items(&self, kind: SaleKind) -> CollectionState<TokenSaleItemModel> {
        let state = self.inner.state.read().await;
        match kind {
            SaleKind::Public => state.public_sales.snapshot(),
            SaleKind::Private => state.private_sales.snapshot(),
        }
    }

    /// Current page of sale items narrowed by rank, server order preserved
    pub async fn sale_items_by_rank(&self, kind: SaleKind, rank: RankFilter) -> Vec<TokenSaleItemModel> {
        self.sale_items(kind)
            .await
            .data
            .items
            .into_iter()
            .filter(|item| rank.matches(item.rank))
            .collect()
    }
}

fn load_imported(store: &dyn DurableStore, namespace: &str) -> ImportedSet {
    match ImportedSet::load(store, namespace) {
        Ok(set) => set,
        Err(err) => {
            warn!(namespace, error = %err, "could not load imported set, starting empty");
            ImportedSet::default()
        }
    }
}
