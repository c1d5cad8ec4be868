//! Local persistence

mod imports;

pub use imports::{
    DurableStore, ImportedSet, MemoryStore, SqliteStore, IMPORTED_MULTISIGS_KEY,
    IMPORTED_POOLS_KEY,
};
