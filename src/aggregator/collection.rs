//! Paginated collection state with stale-write protection

use serde::Serialize;

use crate::core::format::page_count;
use crate::infrastructure::indexer::RawPage;

/// One page of a server-ordered collection
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedCollection<T> {
    pub total_items: u64,
    pub items: Vec<T>,
    pub page: u64,
}

impl<T> Default for PagedCollection<T> {
    fn default() -> Self {
        Self {
            total_items: 0,
            items: Vec::new(),
            page: 1,
        }
    }
}

impl<T> PagedCollection<T> {
    pub fn from_raw(raw: RawPage<T>, page: u64) -> Self {
        Self {
            total_items: raw.total_items,
            items: raw.items,
            page: page.max(1),
        }
    }

    pub fn page_count(&self, page_size: u64) -> u64 {
        page_count(self.total_items, page_size)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionStatus {
    Idle,
    Loading,
    Loaded,
    /// Last fetch failed; data still holds the previous result
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionState<T> {
    pub status: CollectionStatus,
    pub data: PagedCollection<T>,
}

impl<T> Default for CollectionState<T> {
    fn default() -> Self {
        Self {
            status: CollectionStatus::Idle,
            data: PagedCollection::default(),
        }
    }
}

impl<T> CollectionState<T> {
    pub fn is_loading(&self) -> bool {
        self.status == CollectionStatus::Loading
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            CollectionStatus::Error(message) => Some(message),
            _ => None,
        }
    }
}

/// Ticket identifying one fetch of one collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestToken(u64);

/// Collection state plus the token of the latest fetch issued for it
///
/// Only the completion carrying the current token may write; anything issued
/// before the last `begin` or `invalidate` is dropped.
#[derive(Debug)]
pub struct RequestSlot<T> {
    state: CollectionState<T>,
    current: u64,
}

impl<T> Default for RequestSlot<T> {
    fn default() -> Self {
        Self {
            state: CollectionState::default(),
            current: 0,
        }
    }
}

impl<T: Clone> RequestSlot<T> {
    pub fn begin(&mut self) -> RequestToken {
        self.current += 1;
        self.state.status = CollectionStatus::Loading;
        RequestToken(self.current)
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        token.0 == self.current
    }

    /// Apply a finished fetch. Returns `false` when the token is stale.
    pub fn complete(&mut self, token: RequestToken, result: Result<PagedCollection<T>, String>) -> bool {
        if !self.is_current(token) {
            return false;
        }
        match result {
            Ok(data) => {
                self.state.data = data;
                self.state.status = CollectionStatus::Loaded;
            }
            Err(message) => {
                self.state.status = CollectionStatus::Error(message);
            }
        }
        true
    }

    /// Drop the data and orphan any in-flight fetch
    pub fn invalidate(&mut self) {
        self.current += 1;
        self.state = CollectionState::default();
    }

    pub fn state(&self) -> &CollectionState<T> {
        &self.state
    }

    pub fn snapshot(&self) -> CollectionState<T> {
        self.state.clone()
    }

    pub fn items(&self) -> &[T] {
        &self.state.data.items
    }
}
