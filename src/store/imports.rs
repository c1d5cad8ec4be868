//! Durable storage for user-imported pool and multisig addresses
//!
//! Each set is a JSON text mapping chain id to an ordered address list, kept
//! under a fixed namespace key. Loaded once at startup and rewritten on every
//! change; concurrent processes are not coordinated (last writer wins).

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::StoreError;

pub const IMPORTED_POOLS_KEY: &str = "vefi-dapps-dex-imported-pools";
pub const IMPORTED_MULTISIGS_KEY: &str = "vefi-dapps-multisig-imported-wallets";

/// Namespaced text storage
pub trait DurableStore: Send + Sync + 'static {
    fn load(&self, namespace: &str) -> Result<Option<String>, StoreError>;
    fn save(&self, namespace: &str, value: &str) -> Result<(), StoreError>;
}

/// SQLite-backed key/value store
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                namespace TEXT PRIMARY KEY,
                value     TEXT NOT NULL
            );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        // A panic while holding the lock leaves the connection itself intact
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DurableStore for SqliteStore {
    fn load(&self, namespace: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn();
        let value = conn
            .query_row(
                "SELECT value FROM kv WHERE namespace = ?1",
                params![namespace],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn save(&self, namespace: &str, value: &str) -> Result<(), StoreError> {
        self.conn().execute(
            "INSERT INTO kv(namespace, value) VALUES (?1, ?2)
             ON CONFLICT(namespace) DO UPDATE SET value=excluded.value",
            params![namespace, value],
        )?;
        Ok(())
    }
}

/// Process-local store, used when no data directory is available
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DurableStore for MemoryStore {
    fn load(&self, namespace: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        Ok(entries.get(namespace).cloned())
    }

    fn save(&self, namespace: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.insert(namespace.to_string(), value.to_string());
        Ok(())
    }
}

/// Addresses a user imported, per chain, in import order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportedSet {
    by_chain: BTreeMap<u64, Vec<String>>,
}

impl ImportedSet {
    pub fn load(store: &dyn DurableStore, namespace: &str) -> Result<Self, StoreError> {
        let Some(text) = store.load(namespace)? else {
            return Ok(Self::default());
        };
        let by_chain: BTreeMap<u64, Vec<String>> = serde_json::from_str(&text)?;
        Ok(Self { by_chain })
    }

    pub fn persist(&self, store: &dyn DurableStore, namespace: &str) -> Result<(), StoreError> {
        let text = serde_json::to_string(&self.by_chain)?;
        store.save(namespace, &text)
    }

    pub fn for_chain(&self, chain_id: u64) -> &[String] {
        self.by_chain.get(&chain_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, chain_id: u64, address: &str) -> bool {
        contains_address(self.for_chain(chain_id), address)
    }

    /// Add `address` unless it is already imported or known from the server.
    /// Returns whether the set changed.
    pub fn import(&mut self, chain_id: u64, address: &str, server_known: &[String]) -> bool {
        if self.contains(chain_id, address) || contains_address(server_known, address) {
            return false;
        }
        self.by_chain
            .entry(chain_id)
            .or_default()
            .push(address.trim().to_string());
        true
    }

    pub fn import_many(&mut self, chain_id: u64, addresses: &[String], server_known: &[String]) -> usize {
        addresses
            .iter()
            .filter(|address| self.import(chain_id, address, server_known))
            .count()
    }

    pub fn as_map(&self) -> &BTreeMap<u64, Vec<String>> {
        &self.by_chain
    }
}

fn contains_address(list: &[String], address: &str) -> bool {
    let needle = address.trim();
    list.iter().any(|a| a.trim().eq_ignore_ascii_case(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    const POOL_A: &str = "0x1111111111111111111111111111111111111111";
    const POOL_B: &str = "0x2222222222222222222222222222222222222222";

    #[test]
    fn test_import_rejects_duplicates() {
        let mut set = ImportedSet::default();
        assert!(set.import(97, POOL_A, &[]));
        assert!(!set.import(97, &POOL_A.to_uppercase().replace("0X", "0x"), &[]));
        assert!(set.import(56, POOL_A, &[]));
        assert_eq!(set.for_chain(97), &[POOL_A.to_string()]);
    }

    #[test]
    fn test_import_skips_server_known() {
        let mut set = ImportedSet::default();
        let server = vec![POOL_B.to_string()];
        assert!(!set.import(97, POOL_B, &server));
        assert!(set.for_chain(97).is_empty());
    }

    #[test]
    fn test_import_many_counts_additions() {
        let mut set = ImportedSet::default();
        set.import(97, POOL_A, &[]);
        let added = set.import_many(97, &[POOL_A.to_string(), POOL_B.to_string(), POOL_B.to_string()], &[]);
        assert_eq!(added, 1);
        assert_eq!(set.for_chain(97), &[POOL_A.to_string(), POOL_B.to_string()]);
    }

    #[test]
    fn test_json_layout_matches_browser_storage() {
        let store = MemoryStore::new();
        let mut set = ImportedSet::default();
        set.import(97, POOL_A, &[]);
        set.persist(&store, IMPORTED_POOLS_KEY).unwrap();
        assert_eq!(
            store.load(IMPORTED_POOLS_KEY).unwrap().unwrap(),
            format!(r#"{{"97":["{}"]}}"#, POOL_A)
        );
    }

    #[test]
    fn test_sqlite_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("imports.sqlite3");

        let mut set = ImportedSet::default();
        set.import(97, POOL_A, &[]);
        set.import(97, POOL_B, &[]);
        set.import(56, POOL_B, &[]);
        {
            let store = SqliteStore::open(&path).unwrap();
            set.persist(&store, IMPORTED_MULTISIGS_KEY).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let reloaded = ImportedSet::load(&store, IMPORTED_MULTISIGS_KEY).unwrap();
        assert_eq!(reloaded, set);
        assert!(ImportedSet::load(&store, IMPORTED_POOLS_KEY).unwrap().as_map().is_empty());
    }
}
