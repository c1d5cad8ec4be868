//! Per-consumer cache for one composite on-chain read

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::detail::reader::{ChainReaders, ContractReader};
use crate::error::RpcError;

/// What a detail value was fetched for
///
/// `generation` stands in for the extra dependency flags a consumer watches
/// (a finished withdrawal, a confirmed transaction, ...): bump it to force a
/// refetch of an otherwise unchanged key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HookKey {
    pub chain_id: u64,
    pub primary: String,
    pub generation: u64,
}

impl HookKey {
    pub fn new(chain_id: u64, primary: impl Into<String>) -> Self {
        Self {
            chain_id,
            primary: primary.into(),
            generation: 0,
        }
    }

    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }
}

struct HookState<V> {
    value: V,
    key: Option<HookKey>,
    loaded: bool,
    token: u64,
}

/// Last-known value of a detail read
///
/// Failures never reach the caller: the previous value (initially `V::default()`)
/// is kept, so zero/empty must be read as "possibly not loaded yet".
pub struct DetailHook<V> {
    readers: ChainReaders,
    state: Arc<Mutex<HookState<V>>>,
}

impl<V> Clone for DetailHook<V> {
    fn clone(&self) -> Self {
        Self {
            readers: self.readers.clone(),
            state: self.state.clone(),
        }
    }
}

impl<V: Default + Clone> DetailHook<V> {
    pub fn new(readers: ChainReaders) -> Self {
        Self {
            readers,
            state: Arc::new(Mutex::new(HookState {
                value: V::default(),
                key: None,
                loaded: false,
                token: 0,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, HookState<V>> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn value(&self) -> V {
        self.state().value.clone()
    }

    pub fn key(&self) -> Option<HookKey> {
        self.state().key.clone()
    }

    /// Forget the cached key so the next `load` refetches
    pub fn invalidate(&self) {
        let mut state = self.state();
        state.loaded = false;
        state.token += 1;
    }

    /// Resolve the value for `key`, fetching only when the key changed
    pub async fn load<F, Fut>(&self, key: HookKey, fetch: F) -> V
    where
        F: FnOnce(ContractReader) -> Fut,
        Fut: Future<Output = Result<V, RpcError>>,
    {
        let Some(reader) = self.readers.reader(key.chain_id) else {
            debug!(chain_id = key.chain_id, primary = %key.primary, "unsupported chain, read skipped");
            let mut state = self.state();
            state.token += 1;
            state.key = Some(key);
            state.loaded = true;
            state.value = V::default();
            return state.value.clone();
        };

        let token = {
            let mut state = self.state();
            if state.loaded && state.key.as_ref() == Some(&key) {
                return state.value.clone();
            }
            state.token += 1;
            state.loaded = false;
            state.key = Some(key.clone());
            state.token
        };

        let result = fetch(reader).await;

        let mut state = self.state();
        if state.token != token {
            debug!(chain_id = key.chain_id, primary = %key.primary, "discarding stale detail read");
            return state.value.clone();
        }
        match result {
            Ok(value) => {
                state.value = value;
                state.loaded = true;
            }
            Err(err) => {
                warn!(chain_id = key.chain_id, primary = %key.primary, error = %err, "detail read failed");
            }
        }
        state.value.clone()
    }
}
